use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::AuthzError;

/// The closed permission vocabulary understood by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ManageUsers,
    ViewRecords,
    CreateRecords,
    EditRecords,
    DeleteRecords,
    ManageStateRecords,
    ManageLgaRecords,
    ManageWardRecords,
    ViewProjectOutlooks,
    CreateProjectOutlooks,
    EditProjectOutlooks,
    DeleteProjectOutlooks,
    IsAdmin,
}

impl Permission {
    pub const ALL: [Permission; 13] = [
        Permission::ManageUsers,
        Permission::ViewRecords,
        Permission::CreateRecords,
        Permission::EditRecords,
        Permission::DeleteRecords,
        Permission::ManageStateRecords,
        Permission::ManageLgaRecords,
        Permission::ManageWardRecords,
        Permission::ViewProjectOutlooks,
        Permission::CreateProjectOutlooks,
        Permission::EditProjectOutlooks,
        Permission::DeleteProjectOutlooks,
        Permission::IsAdmin,
    ];

    /// Name as stored in the `permissions` table.
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ManageUsers => "manage_users",
            Permission::ViewRecords => "view_records",
            Permission::CreateRecords => "create_records",
            Permission::EditRecords => "edit_records",
            Permission::DeleteRecords => "delete_records",
            Permission::ManageStateRecords => "manage_state_records",
            Permission::ManageLgaRecords => "manage_lga_records",
            Permission::ManageWardRecords => "manage_ward_records",
            Permission::ViewProjectOutlooks => "view_project_outlooks",
            Permission::CreateProjectOutlooks => "create_project_outlooks",
            Permission::EditProjectOutlooks => "edit_project_outlooks",
            Permission::DeleteProjectOutlooks => "delete_project_outlooks",
            Permission::IsAdmin => "is_admin",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| AuthzError::UnknownPermission(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_unique_and_parse_back() {
        let mut seen = std::collections::HashSet::new();
        for perm in Permission::ALL {
            assert!(seen.insert(perm.as_str()), "duplicate name {}", perm);
            assert_eq!(perm.as_str().parse::<Permission>(), Ok(perm));
        }
    }

    #[test]
    fn parsing_is_case_sensitive() {
        assert_eq!(
            "Edit_Records".parse::<Permission>(),
            Err(AuthzError::UnknownPermission("Edit_Records".to_string()))
        );
    }
}
