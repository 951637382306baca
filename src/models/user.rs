use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::errors::AppError;
use crate::utils::is_plausible_email;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub roles: Vec<String>,
    pub state_grants: Vec<i64>,
    pub lga_grants: Vec<i64>,
    pub ward_grants: Vec<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbUser {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Role names and grant ids attached to a user row.
#[derive(Debug, Clone, Default)]
pub struct UserLinks {
    pub roles: Vec<String>,
    pub state_grants: Vec<i64>,
    pub lga_grants: Vec<i64>,
    pub ward_grants: Vec<i64>,
}

impl User {
    pub fn from_parts(row: DbUser, links: UserLinks) -> Self {
        User {
            id: row.id,
            name: row.name,
            email: row.email,
            roles: links.roles,
            state_grants: links.state_grants,
            lga_grants: links.lga_grants,
            ward_grants: links.ward_grants,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UserCreateRequest {
    #[schema(example = "Ada Lovelace")]
    pub name: String,
    #[schema(example = "ada@lagos.gov.ng")]
    pub email: String,
    #[schema(example = "S3cureP@ssw0rd")]
    pub password: String,
    /// Role ids
    #[serde(default)]
    pub roles: Vec<i64>,
    #[serde(default)]
    pub state_grants: Vec<i64>,
    #[serde(default)]
    pub lga_grants: Vec<i64>,
    #[serde(default)]
    pub ward_grants: Vec<i64>,
}

impl UserCreateRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        validate_name(&self.name)?;
        validate_email(&self.email)
    }
}

/// Omitted fields are left untouched; a present list replaces the stored one.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UserUpdateRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub roles: Option<Vec<i64>>,
    pub state_grants: Option<Vec<i64>>,
    pub lga_grants: Option<Vec<i64>>,
    pub ward_grants: Option<Vec<i64>>,
}

impl UserUpdateRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(name) = self.name.as_deref() {
            validate_name(name)?;
        }
        if let Some(email) = self.email.as_deref() {
            validate_email(email)?;
        }
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<(), AppError> {
    if name.trim().is_empty() {
        return Err(AppError::validation("name", "name is required"));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<(), AppError> {
    if !is_plausible_email(email) {
        return Err(AppError::validation("email", "email is not a valid address"));
    }
    Ok(())
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserPage {
    pub data: Vec<User>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
}
