//! Per-entity policies layered over the engine.
//!
//! Handlers call these instead of naming permissions themselves so that the
//! combination rules for each entity live in one place.

use super::engine::{covers_placement, Authorizer};
use super::errors::AuthzError;
use super::hierarchy::LocationHierarchy;
use super::location::{LocationRef, Placement, WardId};
use super::permission::Permission;
use super::principal::{Principal, Resource};

/// Everything a policy needs to reach a decision for one request.
#[derive(Clone, Copy)]
pub struct AccessContext<'a> {
    pub authorizer: &'a Authorizer,
    pub principal: &'a Principal,
    pub hierarchy: &'a dyn LocationHierarchy,
}

impl<'a> AccessContext<'a> {
    pub fn new(
        authorizer: &'a Authorizer,
        principal: &'a Principal,
        hierarchy: &'a dyn LocationHierarchy,
    ) -> Self {
        Self {
            authorizer,
            principal,
            hierarchy,
        }
    }

    pub fn allows(
        &self,
        permission: Permission,
        resource: Option<Resource>,
    ) -> Result<bool, AuthzError> {
        self.authorizer
            .authorize_permission(self.principal, self.hierarchy, permission, resource)
    }

    /// Admin, or state-or-LGA coverage of `placement`.
    pub fn covers(&self, placement: Placement) -> Result<bool, AuthzError> {
        if self.principal.is_admin() {
            return Ok(true);
        }
        covers_placement(self.principal, self.hierarchy, placement)
    }
}

pub struct RecordPolicy;

impl RecordPolicy {
    pub fn view_any(ctx: &AccessContext<'_>) -> Result<bool, AuthzError> {
        ctx.allows(Permission::ViewRecords, None)
    }

    pub fn view(ctx: &AccessContext<'_>, placement: Placement) -> Result<bool, AuthzError> {
        ctx.allows(Permission::ViewRecords, Some(Resource::Record(placement)))
    }

    /// Feature gate only. The caller still owes the ward check
    /// ([`can_access_ward`]) before persisting.
    pub fn create(ctx: &AccessContext<'_>) -> Result<bool, AuthzError> {
        ctx.allows(Permission::CreateRecords, None)
    }

    /// `create` plus coverage of the target state or LGA.
    pub fn create_at(ctx: &AccessContext<'_>, placement: Placement) -> Result<bool, AuthzError> {
        Ok(Self::create(ctx)? && ctx.covers(placement)?)
    }

    pub fn update(ctx: &AccessContext<'_>, placement: Placement) -> Result<bool, AuthzError> {
        ctx.allows(Permission::EditRecords, Some(Resource::Record(placement)))
    }

    pub fn delete(ctx: &AccessContext<'_>, placement: Placement) -> Result<bool, AuthzError> {
        ctx.allows(Permission::DeleteRecords, Some(Resource::Record(placement)))
    }
}

pub struct ProjectOutlookPolicy;

impl ProjectOutlookPolicy {
    pub fn view(ctx: &AccessContext<'_>) -> Result<bool, AuthzError> {
        ctx.allows(Permission::ViewProjectOutlooks, None)
    }

    /// Permission only; outlooks are not filtered by location on creation.
    pub fn create(ctx: &AccessContext<'_>) -> Result<bool, AuthzError> {
        ctx.allows(Permission::CreateProjectOutlooks, None)
    }

    pub fn update(ctx: &AccessContext<'_>, placement: Placement) -> Result<bool, AuthzError> {
        ctx.allows(Permission::EditProjectOutlooks, Some(Resource::ProjectOutlook(placement)))
    }

    pub fn delete(ctx: &AccessContext<'_>, placement: Placement) -> Result<bool, AuthzError> {
        ctx.allows(Permission::DeleteProjectOutlooks, Some(Resource::ProjectOutlook(placement)))
    }
}

/// Account management: flat `manage_users`, no geographic scoping.
pub struct UserPolicy;

impl UserPolicy {
    pub fn view_any(ctx: &AccessContext<'_>) -> Result<bool, AuthzError> {
        ctx.allows(Permission::ManageUsers, None)
    }

    pub fn view(ctx: &AccessContext<'_>, user_id: i64) -> Result<bool, AuthzError> {
        ctx.allows(Permission::ManageUsers, Some(Resource::User(user_id)))
    }

    pub fn create(ctx: &AccessContext<'_>) -> Result<bool, AuthzError> {
        ctx.allows(Permission::ManageUsers, None)
    }

    pub fn update(ctx: &AccessContext<'_>, user_id: i64) -> Result<bool, AuthzError> {
        ctx.allows(Permission::ManageUsers, Some(Resource::User(user_id)))
    }

    pub fn delete(ctx: &AccessContext<'_>, user_id: i64) -> Result<bool, AuthzError> {
        ctx.allows(Permission::ManageUsers, Some(Resource::User(user_id)))
    }
}

/// Direct ward access required before a record is written to a ward.
pub fn can_access_ward(principal: &Principal, ward: WardId) -> bool {
    principal.is_admin() || principal.has_direct_grant(LocationRef::Ward(ward))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::hierarchy::Gazetteer;

    fn gazetteer() -> Gazetteer {
        Gazetteer::new()
            .with_state(5)
            .with_state(20)
            .with_lga(9, 5)
            .with_lga(10, 5)
            .with_lga(30, 20)
            .with_ward(42, 9)
    }

    fn state_editor() -> Principal {
        Principal::new(2)
            .with_role(
                "state_editor",
                [
                    "view_records",
                    "create_records",
                    "edit_records",
                    "manage_state_records",
                    "view_project_outlooks",
                    "create_project_outlooks",
                    "edit_project_outlooks",
                ],
            )
            .with_state_grants([5])
    }

    #[test]
    fn state_editor_manages_records_inside_their_state() {
        let engine = Authorizer::standard().unwrap();
        let principal = state_editor();
        let g = gazetteer();
        let ctx = AccessContext::new(&engine, &principal, &g);

        let lagos = Placement::new(5, 10, None);
        let kano = Placement::new(20, 30, None);

        assert!(RecordPolicy::view_any(&ctx).unwrap());
        assert!(RecordPolicy::create(&ctx).unwrap());
        assert!(RecordPolicy::view(&ctx, lagos).unwrap());
        assert!(RecordPolicy::update(&ctx, lagos).unwrap());
        assert!(!RecordPolicy::update(&ctx, kano).unwrap());
        // role lacks delete_records
        assert!(!RecordPolicy::delete(&ctx, lagos).unwrap());
    }

    #[test]
    fn creating_needs_coverage_of_the_target() {
        let engine = Authorizer::standard().unwrap();
        let principal = state_editor();
        let g = gazetteer();
        let ctx = AccessContext::new(&engine, &principal, &g);

        assert!(RecordPolicy::create_at(&ctx, Placement::new(5, 9, Some(42))).unwrap());
        assert!(!RecordPolicy::create_at(&ctx, Placement::new(20, 30, None)).unwrap());

        let lga_only = Principal::new(6).with_lga_grants([9]);
        let ctx = AccessContext::new(&engine, &lga_only, &g);
        // coverage alone is not enough without create_records
        assert!(!RecordPolicy::create_at(&ctx, Placement::new(5, 9, None)).unwrap());
    }

    #[test]
    fn outlook_policy_mirrors_records() {
        let engine = Authorizer::standard().unwrap();
        let principal = state_editor();
        let g = gazetteer();
        let ctx = AccessContext::new(&engine, &principal, &g);

        assert!(ProjectOutlookPolicy::view(&ctx).unwrap());
        assert!(ProjectOutlookPolicy::create(&ctx).unwrap());

        // creation ignores grants entirely
        let ungranted = Principal::new(7).with_role("planner", ["create_project_outlooks"]);
        let planner = AccessContext::new(&engine, &ungranted, &g);
        assert!(ProjectOutlookPolicy::create(&planner).unwrap());

        assert!(ProjectOutlookPolicy::update(&ctx, Placement::new(5, 9, None)).unwrap());
        assert!(!ProjectOutlookPolicy::update(&ctx, Placement::new(20, 30, None)).unwrap());
        assert!(!ProjectOutlookPolicy::delete(&ctx, Placement::new(5, 9, None)).unwrap());
    }

    #[test]
    fn user_policy_is_flat() {
        let engine = Authorizer::standard().unwrap();
        let g = Gazetteer::new();
        let manager = Principal::new(3).with_role("user_admin", ["manage_users"]);
        let editor = state_editor();

        let ctx = AccessContext::new(&engine, &manager, &g);
        assert!(UserPolicy::view_any(&ctx).unwrap());
        assert!(UserPolicy::create(&ctx).unwrap());
        assert!(UserPolicy::update(&ctx, 77).unwrap());
        assert!(UserPolicy::delete(&ctx, 77).unwrap());

        let ctx = AccessContext::new(&engine, &editor, &g);
        assert!(!UserPolicy::view(&ctx, 77).unwrap());
    }

    #[test]
    fn ward_check_is_direct_only() {
        let by_state = state_editor();
        let by_ward = Principal::new(4).with_ward_grants([42]);
        let admin = Principal::new(1).with_role("admin", Vec::<String>::new());

        assert!(!can_access_ward(&by_state, WardId(42)));
        assert!(can_access_ward(&by_ward, WardId(42)));
        assert!(!can_access_ward(&by_ward, WardId(43)));
        assert!(can_access_ward(&admin, WardId(43)));
    }
}
