//! Location lookups backing the hierarchy resolver.

use sqlx::SqlitePool;

use crate::authz::{Gazetteer, LgaId, LocationRef, Resource, StateId};
use crate::errors::AppResult;

/// Loads the chain from each location up to its State.
///
/// Rows that are missing are simply absent from the result; the resolver
/// turns a needed-but-missing parent into `IntegrityViolation`.
pub async fn ancestry(pool: &SqlitePool, locations: &[LocationRef]) -> AppResult<Gazetteer> {
    let mut gazetteer = Gazetteer::new();

    for location in locations {
        let mut current = Some(*location);
        while let Some(node) = current {
            if gazetteer.contains(node) {
                break;
            }
            current = match node {
                LocationRef::Ward(ward) => ward_lga(pool, ward.0).await?.map(|lga| {
                    gazetteer.add_ward(ward, LgaId(lga));
                    LocationRef::Lga(LgaId(lga))
                }),
                LocationRef::Lga(lga) => lga_state(pool, lga.0).await?.map(|state| {
                    gazetteer.add_lga(lga, StateId(state));
                    LocationRef::State(StateId(state))
                }),
                LocationRef::State(state) => {
                    if state_exists(pool, state.0).await? {
                        gazetteer.add_state(state);
                    }
                    None
                }
            };
        }
    }

    Ok(gazetteer)
}

/// Ancestry needed to evaluate any rule against each of `resources`.
pub async fn ancestry_of(pool: &SqlitePool, resources: &[Resource]) -> AppResult<Gazetteer> {
    let mut chain = Vec::new();
    for resource in resources {
        match resource {
            Resource::Location(location) => chain.push(*location),
            Resource::Record(placement) | Resource::ProjectOutlook(placement) => {
                chain.push(LocationRef::State(placement.state_id));
                chain.push(LocationRef::Lga(placement.lga_id));
                if let Some(ward) = placement.ward_id {
                    chain.push(LocationRef::Ward(ward));
                }
            }
            Resource::User(_) => {}
        }
    }
    ancestry(pool, &chain).await
}

pub async fn state_exists(pool: &SqlitePool, state_id: i64) -> AppResult<bool> {
    Ok(sqlx::query_scalar::<_, i64>("SELECT id FROM states WHERE id = ?")
        .bind(state_id)
        .fetch_optional(pool)
        .await?
        .is_some())
}

/// Parent state of an LGA, `None` when the LGA does not exist.
pub async fn lga_state(pool: &SqlitePool, lga_id: i64) -> AppResult<Option<i64>> {
    Ok(sqlx::query_scalar::<_, i64>("SELECT state_id FROM lgas WHERE id = ?")
        .bind(lga_id)
        .fetch_optional(pool)
        .await?)
}

/// Parent LGA of a ward, `None` when the ward does not exist.
pub async fn ward_lga(pool: &SqlitePool, ward_id: i64) -> AppResult<Option<i64>> {
    Ok(sqlx::query_scalar::<_, i64>("SELECT lga_id FROM wards WHERE id = ?")
        .bind(ward_id)
        .fetch_optional(pool)
        .await?)
}
