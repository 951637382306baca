//! Regional access control.
//!
//! A [`Principal`] carries role-derived permissions and direct grants on
//! States, LGAs and Wards. The [`Authorizer`] checks a named permission
//! against an optional [`Resource`], resolving location coverage downwards
//! through a [`LocationHierarchy`]. Entity policies in [`policy`] and the
//! listing filter in [`RecordScope`] sit on top of it.

mod engine;
mod errors;
mod hierarchy;
mod location;
mod permission;
pub mod policy;
mod principal;
mod registry;
mod scope;

pub use engine::{covers, covers_placement, Authorizer};
pub use errors::AuthzError;
pub use hierarchy::{Gazetteer, LocationHierarchy};
pub use location::{LgaId, LocationKind, LocationRef, Placement, StateId, WardId};
pub use permission::Permission;
pub use policy::AccessContext;
pub use principal::{Principal, Resource};
pub use registry::{EntityKind, PermissionRegistry, Rule, STANDARD_RULES};
pub use scope::RecordScope;

pub mod roles {
    /// Holders pass every check without consulting grants.
    pub const ADMIN: &str = "admin";
}
