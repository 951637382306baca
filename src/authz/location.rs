use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! location_id {
    ($name:ident, $label:literal) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{} {}", $label, self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }
    };
}

location_id!(StateId, "state");
location_id!(LgaId, "lga");
location_id!(WardId, "ward");

/// Tier of the State → LGA → Ward tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationKind {
    State,
    Lga,
    Ward,
}

impl LocationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationKind::State => "state",
            LocationKind::Lga => "lga",
            LocationKind::Ward => "ward",
        }
    }
}

/// A typed reference to one node of the location tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum LocationRef {
    State(StateId),
    Lga(LgaId),
    Ward(WardId),
}

impl LocationRef {
    pub fn kind(&self) -> LocationKind {
        match self {
            LocationRef::State(_) => LocationKind::State,
            LocationRef::Lga(_) => LocationKind::Lga,
            LocationRef::Ward(_) => LocationKind::Ward,
        }
    }

    pub fn raw_id(&self) -> i64 {
        match self {
            LocationRef::State(id) => id.0,
            LocationRef::Lga(id) => id.0,
            LocationRef::Ward(id) => id.0,
        }
    }
}

impl fmt::Display for LocationRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationRef::State(id) => fmt::Display::fmt(id, f),
            LocationRef::Lga(id) => fmt::Display::fmt(id, f),
            LocationRef::Ward(id) => fmt::Display::fmt(id, f),
        }
    }
}

impl From<StateId> for LocationRef {
    fn from(value: StateId) -> Self {
        LocationRef::State(value)
    }
}

impl From<LgaId> for LocationRef {
    fn from(value: LgaId) -> Self {
        LocationRef::Lga(value)
    }
}

impl From<WardId> for LocationRef {
    fn from(value: WardId) -> Self {
        LocationRef::Ward(value)
    }
}

/// Where a record or project outlook sits in the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub state_id: StateId,
    pub lga_id: LgaId,
    pub ward_id: Option<WardId>,
}

impl Placement {
    pub fn new(state_id: i64, lga_id: i64, ward_id: Option<i64>) -> Self {
        Self {
            state_id: StateId(state_id),
            lga_id: LgaId(lga_id),
            ward_id: ward_id.map(WardId),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_ref_reports_kind_and_display() {
        let ward = LocationRef::from(WardId(42));
        assert_eq!(ward.kind(), LocationKind::Ward);
        assert_eq!(ward.raw_id(), 42);
        assert_eq!(ward.to_string(), "ward 42");
    }
}
