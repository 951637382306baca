use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct State {
    pub id: i64,
    #[schema(example = "Lagos")]
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Lga {
    pub id: i64,
    pub state_id: i64,
    #[schema(example = "Ikeja")]
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Ward {
    pub id: i64,
    pub lga_id: i64,
    #[schema(example = "Alausa")]
    pub name: String,
}

/// A state the caller may work in, with the LGAs beneath it.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StateWithLgas {
    pub id: i64,
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub lgas: Vec<Lga>,
}

impl StateWithLgas {
    pub fn new(state: State, lgas: Vec<Lga>) -> Self {
        Self {
            id: state.id,
            name: state.name,
            latitude: state.latitude,
            longitude: state.longitude,
            lgas,
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct WardSearchQuery {
    /// Comma-separated LGA ids, e.g. `9,10`
    pub lga_ids: Option<String>,
    /// Case-insensitive substring of the ward name
    pub search: Option<String>,
}

impl WardSearchQuery {
    /// Parsed `lga_ids`; blank entries are skipped, malformed ones are an error.
    pub fn lga_ids(&self) -> Result<Vec<i64>, std::num::ParseIntError> {
        self.lga_ids
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::parse::<i64>)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lga_ids_are_split_on_commas() {
        let query = WardSearchQuery {
            lga_ids: Some("9, 10,,".into()),
            search: None,
        };
        assert_eq!(query.lga_ids().unwrap(), vec![9, 10]);

        let bad = WardSearchQuery {
            lga_ids: Some("9,x".into()),
            search: None,
        };
        assert!(bad.lga_ids().is_err());
        assert!(WardSearchQuery::default().lga_ids().unwrap().is_empty());
    }
}
