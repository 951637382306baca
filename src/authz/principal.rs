use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;

use super::location::{LgaId, LocationRef, Placement, StateId, WardId};

/// Principal represents the acting user together with everything the engine
/// needs to know about them: held roles (each with its permission names) and
/// the three direct location grant sets.
#[derive(Debug, Clone, Default)]
pub struct Principal {
    pub user_id: i64,
    /// role name -> permission names carried by that role
    pub roles: HashMap<String, HashSet<String>>,
    pub state_grants: HashSet<StateId>,
    pub lga_grants: HashSet<LgaId>,
    pub ward_grants: HashSet<WardId>,
}

impl Principal {
    pub fn new(user_id: i64) -> Self {
        Self {
            user_id,
            ..Self::default()
        }
    }

    pub fn with_role<I, S>(mut self, role: &str, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.roles
            .entry(role.to_string())
            .or_default()
            .extend(permissions.into_iter().map(Into::into));
        self
    }

    pub fn with_state_grants(mut self, ids: impl IntoIterator<Item = i64>) -> Self {
        self.state_grants.extend(ids.into_iter().map(StateId));
        self
    }

    pub fn with_lga_grants(mut self, ids: impl IntoIterator<Item = i64>) -> Self {
        self.lga_grants.extend(ids.into_iter().map(LgaId));
        self
    }

    pub fn with_ward_grants(mut self, ids: impl IntoIterator<Item = i64>) -> Self {
        self.ward_grants.extend(ids.into_iter().map(WardId));
        self
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains_key(role)
    }

    /// True iff any held role carries `permission`.
    pub fn has_permission(&self, permission: &str) -> bool {
        self.roles.values().any(|perms| perms.contains(permission))
    }

    pub fn has_direct_grant(&self, location: LocationRef) -> bool {
        match location {
            LocationRef::State(id) => self.state_grants.contains(&id),
            LocationRef::Lga(id) => self.lga_grants.contains(&id),
            LocationRef::Ward(id) => self.ward_grants.contains(&id),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(super::roles::ADMIN)
    }

    pub fn role_names(&self) -> BTreeSet<&str> {
        self.roles.keys().map(String::as_str).collect()
    }

    pub fn permission_names(&self) -> BTreeSet<&str> {
        self.roles
            .values()
            .flat_map(|perms| perms.iter().map(String::as_str))
            .collect()
    }
}

/// Target of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Location(LocationRef),
    Record(Placement),
    ProjectOutlook(Placement),
    User(i64),
}

impl Resource {
    pub fn state(id: i64) -> Self {
        Resource::Location(LocationRef::State(StateId(id)))
    }

    pub fn lga(id: i64) -> Self {
        Resource::Location(LocationRef::Lga(LgaId(id)))
    }

    pub fn ward(id: i64) -> Self {
        Resource::Location(LocationRef::Ward(WardId(id)))
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Location(loc) => fmt::Display::fmt(loc, f),
            Resource::Record(p) => write!(f, "record in {} / {}", p.state_id, p.lga_id),
            Resource::ProjectOutlook(p) => {
                write!(f, "project outlook in {} / {}", p.state_id, p.lga_id)
            }
            Resource::User(id) => write!(f, "user {id}"),
        }
    }
}
