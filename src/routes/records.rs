use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use sqlx::SqlitePool;

use crate::app::AppState;
use crate::authz::policy::{can_access_ward, RecordPolicy};
use crate::authz::{Gazetteer, Placement, Principal, RecordScope, Resource};
use crate::db::{grants, locations};
use crate::errors::{AppError, AppResult};
use crate::jwt::AuthUser;
use crate::models::record::{
    validate_entries, DbRecord, Record, RecordCreateRequest, RecordPage, RecordUpdateRequest,
};
use crate::models::{PageQuery, PAGE_SIZE};
use crate::routes::enforce;
use crate::utils::{current_year, utc_now};

const RECORD_COLUMNS: &str = "id, state_id, lga_id, ward_id, year, data, created_at, updated_at";

#[utoipa::path(
    get,
    path = "/records",
    tag = "Records",
    params(PageQuery),
    responses(
        (status = 200, description = "Records the caller may see, newest first", body = RecordPage),
        (status = 403, description = "Missing view_records")
    ),
    security(("bearerAuth" = []))
)]
pub async fn list_records(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<RecordPage>> {
    let principal = grants::load_principal(&state.pool, auth.user_id).await?;
    let hierarchy = Gazetteer::new();
    let ctx = state.context(&principal, &hierarchy);
    enforce(auth.user_id, "records.view_any", RecordPolicy::view_any(&ctx))?;

    let scope = RecordScope::for_principal(&principal);
    if scope.is_empty() {
        return Ok(Json(RecordPage {
            data: Vec::new(),
            page: query.page(),
            per_page: PAGE_SIZE,
            total: 0,
        }));
    }
    let (predicate, binds) = scope.sql_predicate();

    let count_sql = format!("SELECT COUNT(*) FROM records WHERE {predicate}");
    let mut count = sqlx::query_scalar::<_, i64>(&count_sql);
    for id in &binds {
        count = count.bind(*id);
    }
    let total = count.fetch_one(&state.pool).await?;

    let list_sql = format!(
        "SELECT {RECORD_COLUMNS} FROM records WHERE {predicate} \
         ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
    );
    let mut list = sqlx::query_as::<_, DbRecord>(&list_sql);
    for id in &binds {
        list = list.bind(*id);
    }
    let rows = list
        .bind(PAGE_SIZE)
        .bind(query.offset())
        .fetch_all(&state.pool)
        .await?;

    let data: Vec<Record> = rows.into_iter().map(Record::try_from).collect::<Result<_, _>>()?;

    Ok(Json(RecordPage {
        data,
        page: query.page(),
        per_page: PAGE_SIZE,
        total,
    }))
}

/// Stores a record, or overwrites the one already filed for the same
/// state, LGA, ward and year.
#[utoipa::path(
    post,
    path = "/records",
    tag = "Records",
    request_body = RecordCreateRequest,
    responses(
        (status = 201, description = "Record created", body = Record),
        (status = 200, description = "Existing record for the same placement and year overwritten",
            body = Record),
        (status = 400, description = "Unknown or mismatched location"),
        (status = 403, description = "Missing create_records, location or ward access"),
        (status = 422, description = "Invalid payload")
    ),
    security(("bearerAuth" = []))
)]
pub async fn create_record(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<RecordCreateRequest>,
) -> AppResult<(StatusCode, Json<Record>)> {
    validate_entries(&payload.record)?;

    let principal = grants::load_principal(&state.pool, auth.user_id).await?;
    let empty = Gazetteer::new();
    let decision = RecordPolicy::create(&state.context(&principal, &empty));
    enforce(auth.user_id, "records.create", decision)?;

    let placement = payload.placement();
    validate_placement(&state.pool, placement).await?;

    let hierarchy = locations::ancestry_of(&state.pool, &[Resource::Record(placement)]).await?;
    let ctx = state.context(&principal, &hierarchy);
    enforce(auth.user_id, "records.create", RecordPolicy::create_at(&ctx, placement))?;
    ensure_ward_access(&principal, placement)?;

    let year = payload.year.unwrap_or_else(current_year);
    let data = serde_json::to_string(&payload.record)
        .map_err(|err| AppError::internal(format!("failed to encode record: {err}")))?;
    let now = utc_now();

    let existing = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM records WHERE state_id = ? AND lga_id = ? AND ward_id IS ? AND year = ?",
    )
    .bind(payload.state_id)
    .bind(payload.lga_id)
    .bind(payload.ward_id)
    .bind(year)
    .fetch_optional(&state.pool)
    .await?;

    let (id, status) = match existing {
        Some(id) => {
            sqlx::query("UPDATE records SET data = ?, updated_at = ? WHERE id = ?")
                .bind(&data)
                .bind(now)
                .bind(id)
                .execute(&state.pool)
                .await?;
            (id, StatusCode::OK)
        }
        None => {
            let result = sqlx::query(
                "INSERT INTO records \
                 (state_id, lga_id, ward_id, year, data, created_at, updated_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(payload.state_id)
            .bind(payload.lga_id)
            .bind(payload.ward_id)
            .bind(year)
            .bind(&data)
            .bind(now)
            .bind(now)
            .execute(&state.pool)
            .await?;
            (result.last_insert_rowid(), StatusCode::CREATED)
        }
    };

    tracing::info!(
        user_id = auth.user_id,
        record_id = id,
        overwritten = existing.is_some(),
        "record stored"
    );

    let record: Record = fetch_record(&state.pool, id).await?.try_into()?;
    Ok((status, Json(record)))
}

#[utoipa::path(
    get,
    path = "/records/{id}",
    tag = "Records",
    params(("id" = i64, Path, description = "Record id")),
    responses(
        (status = 200, description = "Record detail", body = Record),
        (status = 403, description = "Record outside the caller's locations"),
        (status = 404, description = "No such record")
    ),
    security(("bearerAuth" = []))
)]
pub async fn get_record(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Record>> {
    let row = fetch_record(&state.pool, id).await?;
    let placement = row.placement();

    let principal = grants::load_principal(&state.pool, auth.user_id).await?;
    let hierarchy = locations::ancestry_of(&state.pool, &[Resource::Record(placement)]).await?;
    let ctx = state.context(&principal, &hierarchy);
    enforce(auth.user_id, "records.view", RecordPolicy::view(&ctx, placement))?;

    Ok(Json(row.try_into()?))
}

/// Moving a record requires edit rights over both its current and its new
/// placement.
#[utoipa::path(
    put,
    path = "/records/{id}",
    tag = "Records",
    params(("id" = i64, Path, description = "Record id")),
    request_body = RecordUpdateRequest,
    responses(
        (status = 200, description = "Record updated", body = Record),
        (status = 400, description = "Unknown or mismatched location"),
        (status = 403, description = "Missing edit_records on the old or new placement"),
        (status = 404, description = "No such record")
    ),
    security(("bearerAuth" = []))
)]
pub async fn update_record(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<RecordUpdateRequest>,
) -> AppResult<Json<Record>> {
    validate_entries(&payload.record)?;

    let row = fetch_record(&state.pool, id).await?;
    let current = row.placement();
    let target = payload.placement();
    validate_placement(&state.pool, target).await?;

    let principal = grants::load_principal(&state.pool, auth.user_id).await?;
    let resources = [Resource::Record(current), Resource::Record(target)];
    let hierarchy = locations::ancestry_of(&state.pool, &resources).await?;
    let ctx = state.context(&principal, &hierarchy);
    enforce(auth.user_id, "records.update", RecordPolicy::update(&ctx, current))?;
    enforce(auth.user_id, "records.update", RecordPolicy::update(&ctx, target))?;

    let data = serde_json::to_string(&payload.record)
        .map_err(|err| AppError::internal(format!("failed to encode record: {err}")))?;
    let year = payload.year.or(row.year);

    sqlx::query(
        "UPDATE records SET state_id = ?, lga_id = ?, ward_id = ?, year = ?, data = ?, \
         updated_at = ? WHERE id = ?",
    )
    .bind(payload.state_id)
    .bind(payload.lga_id)
    .bind(payload.ward_id)
    .bind(year)
    .bind(&data)
    .bind(utc_now())
    .bind(id)
    .execute(&state.pool)
    .await?;

    let record: Record = fetch_record(&state.pool, id).await?.try_into()?;
    Ok(Json(record))
}

#[utoipa::path(
    delete,
    path = "/records/{id}",
    tag = "Records",
    params(("id" = i64, Path, description = "Record id")),
    responses(
        (status = 204, description = "Record deleted"),
        (status = 403, description = "Missing delete_records on the record"),
        (status = 404, description = "No such record")
    ),
    security(("bearerAuth" = []))
)]
pub async fn delete_record(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    let row = fetch_record(&state.pool, id).await?;
    let placement = row.placement();

    let principal = grants::load_principal(&state.pool, auth.user_id).await?;
    let hierarchy = locations::ancestry_of(&state.pool, &[Resource::Record(placement)]).await?;
    let ctx = state.context(&principal, &hierarchy);
    enforce(auth.user_id, "records.delete", RecordPolicy::delete(&ctx, placement))?;

    let affected = sqlx::query("DELETE FROM records WHERE id = ?")
        .bind(id)
        .execute(&state.pool)
        .await?;
    if affected.rows_affected() == 0 {
        return Err(AppError::not_found("record not found"));
    }

    tracing::info!(user_id = auth.user_id, record_id = id, "record deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// The LGA must sit in the state and the ward, when given, in the LGA.
async fn validate_placement(pool: &SqlitePool, placement: Placement) -> AppResult<()> {
    if !locations::state_exists(pool, placement.state_id.0).await? {
        return Err(AppError::bad_request(format!("{} does not exist", placement.state_id)));
    }
    match locations::lga_state(pool, placement.lga_id.0).await? {
        Some(state_id) if state_id == placement.state_id.0 => {}
        Some(_) => {
            return Err(AppError::bad_request(format!(
                "{} is not in {}",
                placement.lga_id, placement.state_id
            )))
        }
        None => return Err(AppError::bad_request(format!("{} does not exist", placement.lga_id))),
    }
    if let Some(ward) = placement.ward_id {
        match locations::ward_lga(pool, ward.0).await? {
            Some(lga_id) if lga_id == placement.lga_id.0 => {}
            Some(_) => {
                let message = format!("{} is not in {}", ward, placement.lga_id);
                return Err(AppError::bad_request(message));
            }
            None => return Err(AppError::bad_request(format!("{ward} does not exist"))),
        }
    }
    Ok(())
}

/// Creating a record in a ward needs a direct grant on it; state or LGA
/// grants do not count here.
fn ensure_ward_access(principal: &Principal, placement: Placement) -> AppResult<()> {
    match placement.ward_id {
        Some(ward) => enforce(
            principal.user_id,
            "records.ward_access",
            Ok(can_access_ward(principal, ward)),
        ),
        None => Ok(()),
    }
}

async fn fetch_record(pool: &SqlitePool, id: i64) -> AppResult<DbRecord> {
    sqlx::query_as::<_, DbRecord>(&format!("SELECT {RECORD_COLUMNS} FROM records WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("record not found"))
}
