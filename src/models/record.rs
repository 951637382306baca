use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::authz::Placement;
use crate::errors::AppError;

/// One captured metric. Values are free text; an absent value is kept as null.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RecordEntry {
    #[schema(example = "boreholes_rehabilitated")]
    pub key: String,
    #[schema(example = "12")]
    pub value: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Record {
    pub id: i64,
    pub state_id: i64,
    pub lga_id: i64,
    pub ward_id: Option<i64>,
    pub year: Option<i32>,
    pub record: Vec<RecordEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DbRecord {
    pub id: i64,
    pub state_id: i64,
    pub lga_id: i64,
    pub ward_id: Option<i64>,
    pub year: Option<i32>,
    pub data: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DbRecord {
    pub fn placement(&self) -> Placement {
        Placement::new(self.state_id, self.lga_id, self.ward_id)
    }
}

impl TryFrom<DbRecord> for Record {
    type Error = AppError;

    fn try_from(value: DbRecord) -> Result<Self, Self::Error> {
        let record = serde_json::from_str(&value.data).map_err(|err| {
            AppError::internal(format!("record {} has malformed data: {err}", value.id))
        })?;

        Ok(Record {
            id: value.id,
            state_id: value.state_id,
            lga_id: value.lga_id,
            ward_id: value.ward_id,
            year: value.year,
            record,
            created_at: value.created_at,
            updated_at: value.updated_at,
        })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RecordCreateRequest {
    #[schema(example = 5)]
    pub state_id: i64,
    #[schema(example = 9)]
    pub lga_id: i64,
    #[schema(example = 42)]
    pub ward_id: Option<i64>,
    /// Defaults to the current year
    #[schema(example = 2026)]
    pub year: Option<i32>,
    pub record: Vec<RecordEntry>,
}

impl RecordCreateRequest {
    pub fn placement(&self) -> Placement {
        Placement::new(self.state_id, self.lga_id, self.ward_id)
    }
}

/// Replaces the record's placement and data. `year` is kept when omitted.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RecordUpdateRequest {
    pub state_id: i64,
    pub lga_id: i64,
    pub ward_id: Option<i64>,
    pub year: Option<i32>,
    pub record: Vec<RecordEntry>,
}

impl RecordUpdateRequest {
    pub fn placement(&self) -> Placement {
        Placement::new(self.state_id, self.lga_id, self.ward_id)
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RecordPage {
    pub data: Vec<Record>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
}

pub fn validate_entries(entries: &[RecordEntry]) -> Result<(), AppError> {
    if entries.is_empty() {
        return Err(AppError::validation("record", "at least one entry is required"));
    }
    if let Some(entry) = entries.iter().find(|entry| entry.key.trim().is_empty()) {
        return Err(AppError::validation(
            "record",
            format!("entry keys must not be blank (value {:?})", entry.value),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(data: &str) -> DbRecord {
        DbRecord {
            id: 1,
            state_id: 5,
            lga_id: 9,
            ward_id: Some(42),
            year: Some(2026),
            data: data.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn stored_entries_keep_their_order_and_nulls() {
        let data = r#"[{"key":"b","value":"1"},{"key":"a","value":null}]"#;
        let record = Record::try_from(row(data)).unwrap();
        assert_eq!(record.record[0].key, "b");
        assert_eq!(record.record[1].value, None);
    }

    #[test]
    fn malformed_data_is_an_internal_error() {
        assert!(matches!(Record::try_from(row("not json")), Err(AppError::Internal(_))));
    }

    #[test]
    fn placement_comes_from_the_row() {
        let placement = row("[]").placement();
        assert_eq!(placement, Placement::new(5, 9, Some(42)));
    }

    #[test]
    fn entries_need_keys() {
        assert!(validate_entries(&[]).is_err());
        let blank = RecordEntry {
            key: " ".into(),
            value: None,
        };
        assert!(validate_entries(&[blank]).is_err());
        let ok = RecordEntry {
            key: "wells".into(),
            value: Some("3".into()),
        };
        assert!(validate_entries(&[ok]).is_ok());
    }
}
