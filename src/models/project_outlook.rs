use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::authz::Placement;
use crate::errors::AppError;

/// Yearly target for an LGA, compared against captured records.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ProjectOutlook {
    pub id: i64,
    pub state_id: i64,
    pub lga_id: i64,
    pub outlook: i64,
    pub project_year: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProjectOutlook {
    pub fn placement(&self) -> Placement {
        Placement::new(self.state_id, self.lga_id, None)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProjectOutlookCreateRequest {
    #[schema(example = 5)]
    pub state_id: i64,
    #[schema(example = 9)]
    pub lga_id: i64,
    #[schema(example = 120)]
    pub outlook: i64,
    #[schema(example = 2027)]
    pub project_year: i32,
}

impl ProjectOutlookCreateRequest {
    pub fn validate(&self, current_year: i32) -> Result<(), AppError> {
        if self.outlook < 1 {
            return Err(AppError::validation("outlook", "outlook must be at least 1"));
        }
        validate_project_year(self.project_year, current_year)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProjectOutlookUpdateRequest {
    #[schema(example = 0)]
    pub outlook: i64,
    #[schema(example = 2027)]
    pub project_year: i32,
}

impl ProjectOutlookUpdateRequest {
    pub fn validate(&self, current_year: i32) -> Result<(), AppError> {
        if self.outlook < 0 {
            return Err(AppError::validation("outlook", "outlook must not be negative"));
        }
        validate_project_year(self.project_year, current_year)
    }
}

/// Four digits, not earlier than `current_year`.
fn validate_project_year(project_year: i32, current_year: i32) -> Result<(), AppError> {
    if !(1000..=9999).contains(&project_year) {
        return Err(AppError::validation("project_year", "project_year must have four digits"));
    }
    if project_year < current_year {
        return Err(AppError::validation(
            "project_year",
            format!("project_year must be {current_year} or later"),
        ));
    }
    Ok(())
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProjectOutlookPage {
    pub data: Vec<ProjectOutlook>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
}
