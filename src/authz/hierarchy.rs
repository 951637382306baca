use std::collections::{HashMap, HashSet};

use super::errors::AuthzError;
use super::location::{LgaId, LocationRef, StateId, WardId};

/// Walks up the State → LGA → Ward tree.
pub trait LocationHierarchy: Send + Sync {
    fn parent_state(&self, lga: LgaId) -> Result<StateId, AuthzError>;

    fn parent_lga(&self, ward: WardId) -> Result<LgaId, AuthzError>;

    fn grandparent_state(&self, ward: WardId) -> Result<StateId, AuthzError> {
        let lga = self.parent_lga(ward)?;
        self.parent_state(lga)
    }

    /// Next node up, `None` for a State.
    fn parent_of(&self, location: LocationRef) -> Result<Option<LocationRef>, AuthzError> {
        match location {
            LocationRef::State(_) => Ok(None),
            LocationRef::Lga(lga) => self.parent_state(lga).map(|s| Some(LocationRef::State(s))),
            LocationRef::Ward(ward) => self.parent_lga(ward).map(|l| Some(LocationRef::Lga(l))),
        }
    }
}

/// In-memory slice of the location tree.
///
/// Request handlers load only the ancestry of the resource under check (see
/// `db::locations::ancestry`); tests build one by hand.
#[derive(Debug, Clone, Default)]
pub struct Gazetteer {
    states: HashSet<StateId>,
    lga_parents: HashMap<LgaId, StateId>,
    ward_parents: HashMap<WardId, LgaId>,
}

impl Gazetteer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_state(&mut self, state: StateId) -> &mut Self {
        self.states.insert(state);
        self
    }

    pub fn add_lga(&mut self, lga: LgaId, state: StateId) -> &mut Self {
        self.lga_parents.insert(lga, state);
        self
    }

    pub fn add_ward(&mut self, ward: WardId, lga: LgaId) -> &mut Self {
        self.ward_parents.insert(ward, lga);
        self
    }

    pub fn with_state(mut self, state: i64) -> Self {
        self.add_state(StateId(state));
        self
    }

    pub fn with_lga(mut self, lga: i64, state: i64) -> Self {
        self.add_lga(LgaId(lga), StateId(state));
        self
    }

    pub fn with_ward(mut self, ward: i64, lga: i64) -> Self {
        self.add_ward(WardId(ward), LgaId(lga));
        self
    }

    pub fn contains(&self, location: LocationRef) -> bool {
        match location {
            LocationRef::State(id) => self.states.contains(&id),
            LocationRef::Lga(id) => self.lga_parents.contains_key(&id),
            LocationRef::Ward(id) => self.ward_parents.contains_key(&id),
        }
    }
}

impl LocationHierarchy for Gazetteer {
    fn parent_state(&self, lga: LgaId) -> Result<StateId, AuthzError> {
        match self.lga_parents.get(&lga) {
            Some(state) if self.states.contains(state) => Ok(*state),
            _ => Err(AuthzError::IntegrityViolation(LocationRef::Lga(lga))),
        }
    }

    fn parent_lga(&self, ward: WardId) -> Result<LgaId, AuthzError> {
        match self.ward_parents.get(&ward) {
            Some(lga) if self.lga_parents.contains_key(lga) => Ok(*lga),
            _ => Err(AuthzError::IntegrityViolation(LocationRef::Ward(ward))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lagos() -> Gazetteer {
        Gazetteer::new()
            .with_state(5)
            .with_lga(9, 5)
            .with_ward(42, 9)
    }

    #[test]
    fn grandparent_composes_two_lookups() {
        let g = lagos();
        assert_eq!(g.parent_lga(WardId(42)), Ok(LgaId(9)));
        assert_eq!(g.parent_state(LgaId(9)), Ok(StateId(5)));
        assert_eq!(g.grandparent_state(WardId(42)), Ok(StateId(5)));
    }

    #[test]
    fn parent_of_stops_at_state() {
        let g = lagos();
        assert_eq!(
            g.parent_of(LocationRef::Ward(WardId(42))),
            Ok(Some(LocationRef::Lga(LgaId(9))))
        );
        assert_eq!(g.parent_of(LocationRef::State(StateId(5))), Ok(None));
    }

    #[test]
    fn dangling_parent_is_an_integrity_violation() {
        // LGA 11 points at a state that was never recorded
        let g = lagos().with_lga(11, 99).with_ward(77, 404);

        assert_eq!(
            g.parent_state(LgaId(11)),
            Err(AuthzError::IntegrityViolation(LocationRef::Lga(LgaId(11))))
        );
        assert_eq!(
            g.parent_lga(WardId(77)),
            Err(AuthzError::IntegrityViolation(LocationRef::Ward(WardId(77))))
        );
        assert_eq!(
            g.parent_lga(WardId(1)),
            Err(AuthzError::IntegrityViolation(LocationRef::Ward(WardId(1))))
        );
    }
}
