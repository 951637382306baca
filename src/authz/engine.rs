use std::sync::Arc;

use super::errors::AuthzError;
use super::hierarchy::LocationHierarchy;
use super::location::{LocationRef, Placement};
use super::permission::Permission;
use super::principal::{Principal, Resource};
use super::registry::{EntityKind, PermissionRegistry, Rule};

/// The authorization engine.
///
/// Evaluation order:
/// 1. admin role -> allow, before the permission name is even looked up
/// 2. registry lookup -> `UnknownPermission` for names without a rule
/// 3. role-derived permission missing -> deny
/// 4. no resource -> allow (feature-level check)
/// 5. rule-specific scoping against the resource
#[derive(Debug, Clone)]
pub struct Authorizer {
    registry: Arc<PermissionRegistry>,
}

impl Authorizer {
    pub fn new(registry: Arc<PermissionRegistry>) -> Self {
        Self { registry }
    }

    pub fn standard() -> Result<Self, AuthzError> {
        Ok(Self::new(Arc::new(PermissionRegistry::standard()?)))
    }

    pub fn registry(&self) -> &PermissionRegistry {
        &self.registry
    }

    /// Decide whether `principal` may exercise the permission named
    /// `permission`, optionally against `resource`.
    pub fn authorize(
        &self,
        principal: &Principal,
        hierarchy: &dyn LocationHierarchy,
        permission: &str,
        resource: Option<Resource>,
    ) -> Result<bool, AuthzError> {
        if principal.is_admin() {
            tracing::debug!(user_id = principal.user_id, permission = %permission, "admin bypass");
            return Ok(true);
        }

        let (permission, rule) = self.registry.lookup(permission).inspect_err(|err| {
            tracing::error!(user_id = principal.user_id, error = %err, "permission lookup failed");
        })?;

        self.evaluate(principal, hierarchy, permission, rule, resource)
    }

    /// Typed variant of [`Authorizer::authorize`].
    pub fn authorize_permission(
        &self,
        principal: &Principal,
        hierarchy: &dyn LocationHierarchy,
        permission: Permission,
        resource: Option<Resource>,
    ) -> Result<bool, AuthzError> {
        if principal.is_admin() {
            tracing::debug!(user_id = principal.user_id, permission = %permission, "admin bypass");
            return Ok(true);
        }

        let rule = self.registry.rule(permission).inspect_err(|err| {
            tracing::error!(user_id = principal.user_id, error = %err, "permission lookup failed");
        })?;

        self.evaluate(principal, hierarchy, permission, rule, resource)
    }

    fn evaluate(
        &self,
        principal: &Principal,
        hierarchy: &dyn LocationHierarchy,
        permission: Permission,
        rule: Rule,
        resource: Option<Resource>,
    ) -> Result<bool, AuthzError> {
        if !principal.has_permission(permission.as_str()) {
            tracing::debug!(
                user_id = principal.user_id,
                permission = %permission,
                "permission denied: not held by any role"
            );
            return Ok(false);
        }

        let Some(resource) = resource else {
            return Ok(true);
        };

        let allowed = match (rule, resource) {
            (Rule::Simple, _) => Ok(true),
            (Rule::Hierarchical(kind), Resource::Location(location)) if location.kind() == kind => {
                covers(principal, hierarchy, location)
            }
            (Rule::Placement(EntityKind::Record), Resource::Record(placement))
            | (
                Rule::Placement(EntityKind::ProjectOutlook),
                Resource::ProjectOutlook(placement),
            ) => covers_placement(principal, hierarchy, placement),
            // resource of the wrong kind for this rule
            _ => Ok(false),
        }
        .inspect_err(|err| {
            tracing::error!(
                user_id = principal.user_id,
                permission = %permission,
                resource = %resource,
                error = %err,
                "hierarchy resolution failed"
            );
        })?;

        tracing::debug!(
            user_id = principal.user_id,
            permission = %permission,
            resource = %resource,
            allowed,
            "scoped permission check"
        );

        Ok(allowed)
    }
}

/// True when the principal holds a direct grant on `location` or on any of
/// its ancestors. Parents are resolved lazily, only while no grant matched.
pub fn covers(
    principal: &Principal,
    hierarchy: &dyn LocationHierarchy,
    location: LocationRef,
) -> Result<bool, AuthzError> {
    let mut current = Some(location);
    while let Some(node) = current {
        if principal.has_direct_grant(node) {
            return Ok(true);
        }
        current = hierarchy.parent_of(node)?;
    }
    Ok(false)
}

/// State access OR LGA access for an entity placed at `placement`.
pub fn covers_placement(
    principal: &Principal,
    hierarchy: &dyn LocationHierarchy,
    placement: Placement,
) -> Result<bool, AuthzError> {
    Ok(covers(principal, hierarchy, LocationRef::State(placement.state_id))?
        || covers(principal, hierarchy, LocationRef::Lga(placement.lga_id))?)
}
