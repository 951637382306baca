use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use sqlx::SqlitePool;

use crate::app::AppState;
use crate::authz::policy::ProjectOutlookPolicy;
use crate::authz::{Gazetteer, Resource};
use crate::db::{grants, locations};
use crate::errors::{AppError, AppResult};
use crate::jwt::AuthUser;
use crate::models::project_outlook::{
    ProjectOutlook, ProjectOutlookCreateRequest, ProjectOutlookPage, ProjectOutlookUpdateRequest,
};
use crate::models::{PageQuery, PAGE_SIZE};
use crate::routes::enforce;
use crate::utils::{current_year, utc_now};

const OUTLOOK_COLUMNS: &str = "id, state_id, lga_id, outlook, project_year, created_at, updated_at";

#[utoipa::path(
    get,
    path = "/project-outlooks",
    tag = "Project Outlooks",
    params(PageQuery),
    responses(
        (status = 200, description = "Project outlooks, newest first", body = ProjectOutlookPage),
        (status = 403, description = "Missing view_project_outlooks")
    ),
    security(("bearerAuth" = []))
)]
pub async fn list_project_outlooks(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<ProjectOutlookPage>> {
    let principal = grants::load_principal(&state.pool, auth.user_id).await?;
    let hierarchy = Gazetteer::new();
    enforce(
        auth.user_id,
        "project_outlooks.view",
        ProjectOutlookPolicy::view(&state.context(&principal, &hierarchy)),
    )?;

    let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM project_outlooks")
        .fetch_one(&state.pool)
        .await?;
    let data = sqlx::query_as::<_, ProjectOutlook>(&format!(
        "SELECT {OUTLOOK_COLUMNS} FROM project_outlooks \
         ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
    ))
    .bind(PAGE_SIZE)
    .bind(query.offset())
    .fetch_all(&state.pool)
    .await?;

    Ok(Json(ProjectOutlookPage {
        data,
        page: query.page(),
        per_page: PAGE_SIZE,
        total,
    }))
}

#[utoipa::path(
    post,
    path = "/project-outlooks",
    tag = "Project Outlooks",
    request_body = ProjectOutlookCreateRequest,
    responses(
        (status = 201, description = "Outlook created", body = ProjectOutlook),
        (status = 400, description = "Unknown or mismatched location"),
        (status = 403, description = "Missing create_project_outlooks"),
        (status = 422, description = "Outlook below 1 or year in the past")
    ),
    security(("bearerAuth" = []))
)]
pub async fn create_project_outlook(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<ProjectOutlookCreateRequest>,
) -> AppResult<(StatusCode, Json<ProjectOutlook>)> {
    payload.validate(current_year())?;

    let principal = grants::load_principal(&state.pool, auth.user_id).await?;
    let hierarchy = Gazetteer::new();
    let decision = ProjectOutlookPolicy::create(&state.context(&principal, &hierarchy));
    enforce(auth.user_id, "project_outlooks.create", decision)?;

    match locations::lga_state(&state.pool, payload.lga_id).await? {
        Some(state_id) if state_id == payload.state_id => {}
        Some(_) => return Err(AppError::bad_request("lga does not belong to the given state")),
        None => return Err(AppError::bad_request("lga does not exist")),
    }

    let now = utc_now();
    let result = sqlx::query(
        "INSERT INTO project_outlooks \
         (state_id, lga_id, outlook, project_year, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(payload.state_id)
    .bind(payload.lga_id)
    .bind(payload.outlook)
    .bind(payload.project_year)
    .bind(now)
    .bind(now)
    .execute(&state.pool)
    .await?;

    let outlook = fetch_outlook(&state.pool, result.last_insert_rowid()).await?;
    Ok((StatusCode::CREATED, Json(outlook)))
}

#[utoipa::path(
    put,
    path = "/project-outlooks/{id}",
    tag = "Project Outlooks",
    params(("id" = i64, Path, description = "Project outlook id")),
    request_body = ProjectOutlookUpdateRequest,
    responses(
        (status = 200, description = "Outlook updated", body = ProjectOutlook),
        (status = 403, description = "Missing edit_project_outlooks on the outlook"),
        (status = 404, description = "No such outlook"),
        (status = 422, description = "Negative outlook or year in the past")
    ),
    security(("bearerAuth" = []))
)]
pub async fn update_project_outlook(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<ProjectOutlookUpdateRequest>,
) -> AppResult<Json<ProjectOutlook>> {
    payload.validate(current_year())?;

    let mut outlook = fetch_outlook(&state.pool, id).await?;
    let placement = outlook.placement();

    let principal = grants::load_principal(&state.pool, auth.user_id).await?;
    let resources = [Resource::ProjectOutlook(placement)];
    let hierarchy = locations::ancestry_of(&state.pool, &resources).await?;
    enforce(
        auth.user_id,
        "project_outlooks.update",
        ProjectOutlookPolicy::update(&state.context(&principal, &hierarchy), placement),
    )?;

    let now = utc_now();
    sqlx::query(
        "UPDATE project_outlooks SET outlook = ?, project_year = ?, updated_at = ? WHERE id = ?",
    )
    .bind(payload.outlook)
    .bind(payload.project_year)
    .bind(now)
    .bind(id)
    .execute(&state.pool)
    .await?;

    outlook.outlook = payload.outlook;
    outlook.project_year = payload.project_year;
    outlook.updated_at = now;
    Ok(Json(outlook))
}

#[utoipa::path(
    delete,
    path = "/project-outlooks/{id}",
    tag = "Project Outlooks",
    params(("id" = i64, Path, description = "Project outlook id")),
    responses(
        (status = 204, description = "Outlook deleted"),
        (status = 403, description = "Missing delete_project_outlooks on the outlook"),
        (status = 404, description = "No such outlook")
    ),
    security(("bearerAuth" = []))
)]
pub async fn delete_project_outlook(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    let outlook = fetch_outlook(&state.pool, id).await?;
    let placement = outlook.placement();

    let principal = grants::load_principal(&state.pool, auth.user_id).await?;
    let resources = [Resource::ProjectOutlook(placement)];
    let hierarchy = locations::ancestry_of(&state.pool, &resources).await?;
    enforce(
        auth.user_id,
        "project_outlooks.delete",
        ProjectOutlookPolicy::delete(&state.context(&principal, &hierarchy), placement),
    )?;

    sqlx::query("DELETE FROM project_outlooks WHERE id = ?")
        .bind(id)
        .execute(&state.pool)
        .await?;

    tracing::info!(user_id = auth.user_id, outlook_id = id, "project outlook deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn fetch_outlook(pool: &SqlitePool, id: i64) -> AppResult<ProjectOutlook> {
    let sql = format!("SELECT {OUTLOOK_COLUMNS} FROM project_outlooks WHERE id = ?");
    sqlx::query_as::<_, ProjectOutlook>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("project outlook not found"))
}
