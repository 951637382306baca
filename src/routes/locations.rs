use std::collections::BTreeMap;

use axum::extract::{Path, Query, State};
use axum::Json;

use crate::app::AppState;
use crate::authz::{LgaId, Principal, StateId};
use crate::db::{grants, locations};
use crate::errors::{AppError, AppResult};
use crate::jwt::AuthUser;
use crate::models::location::{Lga, State as StateRow, StateWithLgas, Ward, WardSearchQuery};

const WARD_SEARCH_LIMIT: i64 = 200;

#[utoipa::path(
    get,
    path = "/states",
    tag = "Locations",
    responses(
        (status = 200, description = "States the caller may work in, with their LGAs",
            body = [StateWithLgas])
    ),
    security(("bearerAuth" = []))
)]
pub async fn list_states(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<Vec<StateWithLgas>>> {
    let principal = grants::load_principal(&state.pool, auth.user_id).await?;

    let states = sqlx::query_as::<_, StateRow>(
        "SELECT id, name, latitude, longitude FROM states ORDER BY name",
    )
    .fetch_all(&state.pool)
    .await?;
    let lgas = sqlx::query_as::<_, Lga>(
        "SELECT id, state_id, name, latitude, longitude FROM lgas ORDER BY name",
    )
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(accessible_states(&principal, states, lgas)))
}

/// Admins see every state. Others see states they hold a grant on (with all
/// LGAs) and states containing an LGA they hold a grant on (with just those
/// LGAs).
pub fn accessible_states(
    principal: &Principal,
    states: Vec<StateRow>,
    lgas: Vec<Lga>,
) -> Vec<StateWithLgas> {
    let admin = principal.is_admin();
    let mut by_state: BTreeMap<i64, Vec<Lga>> = BTreeMap::new();
    for lga in lgas {
        let visible = admin
            || principal.state_grants.contains(&StateId(lga.state_id))
            || principal.lga_grants.contains(&LgaId(lga.id));
        if visible {
            by_state.entry(lga.state_id).or_default().push(lga);
        }
    }

    states
        .into_iter()
        .filter_map(|state| {
            let granted = admin || principal.state_grants.contains(&StateId(state.id));
            match by_state.remove(&state.id) {
                Some(lgas) => Some(StateWithLgas::new(state, lgas)),
                None if granted => Some(StateWithLgas::new(state, Vec::new())),
                None => None,
            }
        })
        .collect()
}

#[utoipa::path(
    get,
    path = "/lgas/{id}/wards",
    tag = "Locations",
    params(("id" = i64, Path, description = "LGA id")),
    responses(
        (status = 200, description = "Wards of the LGA, by name", body = [Ward]),
        (status = 404, description = "No such LGA")
    ),
    security(("bearerAuth" = []))
)]
pub async fn list_lga_wards(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<Ward>>> {
    if locations::lga_state(&state.pool, id).await?.is_none() {
        return Err(AppError::not_found("lga not found"));
    }

    let wards = sqlx::query_as::<_, Ward>(
        "SELECT id, lga_id, name FROM wards WHERE lga_id = ? ORDER BY name",
    )
    .bind(id)
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(wards))
}

#[utoipa::path(
    get,
    path = "/wards",
    tag = "Locations",
    params(WardSearchQuery),
    responses(
        (status = 200, description = "Up to 200 matching wards, by name", body = [Ward]),
        (status = 400, description = "Malformed lga_ids")
    ),
    security(("bearerAuth" = []))
)]
pub async fn search_wards(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(query): Query<WardSearchQuery>,
) -> AppResult<Json<Vec<Ward>>> {
    let lga_ids = query
        .lga_ids()
        .map_err(|_| AppError::bad_request("lga_ids must be a comma-separated list of integers"))?;

    let mut clauses = Vec::new();
    if !lga_ids.is_empty() {
        clauses.push(format!("lga_id IN ({})", vec!["?"; lga_ids.len()].join(", ")));
    }
    let pattern = query
        .search
        .as_deref()
        .map(str::trim)
        .filter(|term| !term.is_empty())
        .map(|term| format!("%{}%", escape_like(term)));
    if pattern.is_some() {
        clauses.push("name LIKE ? ESCAPE '\\'".to_string());
    }
    let filter = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };

    let sql = format!("SELECT id, lga_id, name FROM wards {filter} ORDER BY name LIMIT ?");
    let mut select = sqlx::query_as::<_, Ward>(&sql);
    for id in &lga_ids {
        select = select.bind(*id);
    }
    if let Some(pattern) = pattern {
        select = select.bind(pattern);
    }
    let wards = select.bind(WARD_SEARCH_LIMIT).fetch_all(&state.pool).await?;

    Ok(Json(wards))
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for ch in term.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
