use std::collections::BTreeMap;

use serde::Serialize;

use super::errors::AuthzError;
use super::location::LocationKind;
use super::permission::Permission;

/// Entities whose own state/LGA placement scopes a permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Record,
    ProjectOutlook,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Record => "record",
            EntityKind::ProjectOutlook => "project_outlook",
        }
    }
}

/// How a permission is evaluated once the admin bypass has been ruled out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "shape", content = "kind", rename_all = "snake_case")]
pub enum Rule {
    /// Role-derived permission only; any resource is ignored.
    Simple,
    /// Permission plus a grant on the location or one of its ancestors.
    Hierarchical(LocationKind),
    /// Permission plus coverage of the entity's state or LGA.
    Placement(EntityKind),
}

/// Rules registered at startup.
pub const STANDARD_RULES: &[(Permission, Rule)] = &[
    (Permission::ManageUsers, Rule::Simple),
    (Permission::ViewRecords, Rule::Placement(EntityKind::Record)),
    (Permission::CreateRecords, Rule::Simple),
    (Permission::EditRecords, Rule::Placement(EntityKind::Record)),
    (Permission::DeleteRecords, Rule::Placement(EntityKind::Record)),
    (Permission::IsAdmin, Rule::Simple),
    (Permission::ManageStateRecords, Rule::Hierarchical(LocationKind::State)),
    (Permission::ManageLgaRecords, Rule::Hierarchical(LocationKind::Lga)),
    (Permission::ManageWardRecords, Rule::Hierarchical(LocationKind::Ward)),
    (Permission::ViewProjectOutlooks, Rule::Simple),
    (Permission::CreateProjectOutlooks, Rule::Simple),
    (Permission::EditProjectOutlooks, Rule::Placement(EntityKind::ProjectOutlook)),
    (Permission::DeleteProjectOutlooks, Rule::Placement(EntityKind::ProjectOutlook)),
];

/// Permission → rule table. Built once, read-only afterwards.
#[derive(Debug, Clone)]
pub struct PermissionRegistry {
    rules: BTreeMap<Permission, Rule>,
}

impl PermissionRegistry {
    /// Builds a registry, rejecting a permission registered twice.
    pub fn from_rules(entries: &[(Permission, Rule)]) -> Result<Self, AuthzError> {
        let mut rules = BTreeMap::new();
        for (permission, rule) in entries {
            if rules.insert(*permission, *rule).is_some() {
                return Err(AuthzError::DuplicateRule(permission.to_string()));
            }
        }
        Ok(Self { rules })
    }

    pub fn standard() -> Result<Self, AuthzError> {
        Self::from_rules(STANDARD_RULES)
    }

    pub fn rule(&self, permission: Permission) -> Result<Rule, AuthzError> {
        self.rules
            .get(&permission)
            .copied()
            .ok_or_else(|| AuthzError::UnknownPermission(permission.to_string()))
    }

    /// Resolves a permission name, failing for names outside the vocabulary
    /// and for vocabulary entries this registry has no rule for.
    pub fn lookup(&self, name: &str) -> Result<(Permission, Rule), AuthzError> {
        let permission: Permission = name.parse()?;
        Ok((permission, self.rule(permission)?))
    }

    pub fn iter(&self) -> impl Iterator<Item = (Permission, Rule)> + '_ {
        self.rules.iter().map(|(p, r)| (*p, *r))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_registry_covers_the_whole_vocabulary() {
        let registry = PermissionRegistry::standard().unwrap();
        assert_eq!(registry.len(), Permission::ALL.len());
        for perm in Permission::ALL {
            assert!(registry.rule(perm).is_ok(), "no rule for {}", perm);
        }
    }

    #[test]
    fn hierarchical_rules_are_bound_to_their_tier() {
        let registry = PermissionRegistry::standard().unwrap();
        assert_eq!(
            registry.lookup("manage_state_records").unwrap().1,
            Rule::Hierarchical(LocationKind::State)
        );
        assert_eq!(
            registry.lookup("manage_lga_records").unwrap().1,
            Rule::Hierarchical(LocationKind::Lga)
        );
        assert_eq!(
            registry.lookup("manage_ward_records").unwrap().1,
            Rule::Hierarchical(LocationKind::Ward)
        );
        assert_eq!(registry.lookup("manage_users").unwrap().1, Rule::Simple);
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let err = PermissionRegistry::from_rules(&[
            (Permission::EditRecords, Rule::Simple),
            (Permission::EditRecords, Rule::Placement(EntityKind::Record)),
        ])
        .unwrap_err();
        assert_eq!(err, AuthzError::DuplicateRule("edit_records".to_string()));
    }

    #[test]
    fn unregistered_and_unknown_names_fail_lookup() {
        let registry =
            PermissionRegistry::from_rules(&[(Permission::ManageUsers, Rule::Simple)]).unwrap();

        assert_eq!(
            registry.lookup("view_records").unwrap_err(),
            AuthzError::UnknownPermission("view_records".to_string())
        );
        assert_eq!(
            registry.lookup("not_a_real_permission").unwrap_err(),
            AuthzError::UnknownPermission("not_a_real_permission".to_string())
        );
    }
}
