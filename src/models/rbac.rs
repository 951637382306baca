use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Role {
    pub id: i64,
    #[schema(example = "state_editor")]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub permissions: Vec<String>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbRole {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

impl Role {
    pub fn from_row(row: DbRole, permissions: Vec<String>) -> Self {
        Role {
            id: row.id,
            name: row.name,
            description: row.description,
            permissions,
        }
    }
}

/// What the caller holds, as the engine sees it.
#[derive(Debug, Serialize, ToSchema)]
pub struct EffectivePermissions {
    pub user_id: i64,
    pub is_admin: bool,
    pub roles: Vec<String>,
    pub permissions: Vec<String>,
    pub state_grants: Vec<i64>,
    pub lga_grants: Vec<i64>,
    pub ward_grants: Vec<i64>,
}

/// One row of the permission registry.
#[derive(Debug, Serialize, ToSchema)]
pub struct RegisteredPermission {
    #[schema(example = "manage_lga_records")]
    pub name: String,
    /// `simple`, `hierarchical` or `placement`
    #[schema(example = "hierarchical")]
    pub rule: String,
    /// Location tier or entity the rule scopes against
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "lga")]
    pub scope: Option<String>,
}
