use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use sqlx::{SqliteConnection, SqlitePool};

use crate::app::AppState;
use crate::authz::policy::UserPolicy;
use crate::authz::{AccessContext, AuthzError, Gazetteer};
use crate::db::grants::{self, Link};
use crate::errors::{AppError, AppResult};
use crate::jwt::AuthUser;
use crate::models::rbac::{DbRole, Role};
use crate::models::user::{DbUser, User, UserCreateRequest, UserLinks, UserPage, UserUpdateRequest};
use crate::models::{PageQuery, PAGE_SIZE};
use crate::routes::enforce;
use crate::utils::{hash_password, utc_now};

const USER_COLUMNS: &str = "id, name, email, password_hash, created_at, updated_at";

/// Loads the caller and checks one `UserPolicy` rule. User rules never look
/// at locations, so no ancestry is loaded.
async fn authorize_user_admin(
    state: &AppState,
    auth: AuthUser,
    action: &'static str,
    rule: impl FnOnce(&AccessContext<'_>) -> Result<bool, AuthzError>,
) -> AppResult<()> {
    let principal = grants::load_principal(&state.pool, auth.user_id).await?;
    let hierarchy = Gazetteer::new();
    let decision = rule(&state.context(&principal, &hierarchy));
    enforce(auth.user_id, action, decision)
}

#[utoipa::path(
    get,
    path = "/users",
    tag = "Users",
    params(PageQuery),
    responses(
        (status = 200, description = "Users with their roles and grants", body = UserPage),
        (status = 403, description = "Missing manage_users")
    ),
    security(("bearerAuth" = []))
)]
pub async fn list_users(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<UserPage>> {
    authorize_user_admin(&state, auth, "users.view_any", UserPolicy::view_any).await?;

    let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
        .fetch_one(&state.pool)
        .await?;
    let rows = sqlx::query_as::<_, DbUser>(&format!(
        "SELECT {USER_COLUMNS} FROM users ORDER BY name, id LIMIT ? OFFSET ?"
    ))
    .bind(PAGE_SIZE)
    .bind(query.offset())
    .fetch_all(&state.pool)
    .await?;

    let mut data = Vec::with_capacity(rows.len());
    for row in rows {
        let links = load_links(&state.pool, row.id).await?;
        data.push(User::from_parts(row, links));
    }

    Ok(Json(UserPage {
        data,
        page: query.page(),
        per_page: PAGE_SIZE,
        total,
    }))
}

#[utoipa::path(
    post,
    path = "/users",
    tag = "Users",
    request_body = UserCreateRequest,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Unknown role or location id"),
        (status = 403, description = "Missing manage_users"),
        (status = 409, description = "Email already registered"),
        (status = 422, description = "Invalid payload")
    ),
    security(("bearerAuth" = []))
)]
pub async fn create_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<UserCreateRequest>,
) -> AppResult<(StatusCode, Json<User>)> {
    authorize_user_admin(&state, auth, "users.create", UserPolicy::create).await?;
    payload.validate()?;
    let password_hash = hash_password(&payload.password)?;
    let email = payload.email.trim().to_lowercase();

    let mut tx = state.pool.begin().await?;
    let now = utc_now();
    let result = sqlx::query(
        "INSERT INTO users (name, email, password_hash, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(payload.name.trim())
    .bind(&email)
    .bind(&password_hash)
    .bind(now)
    .bind(now)
    .execute(&mut *tx)
    .await
    .map_err(duplicate_email)?;
    let user_id = result.last_insert_rowid();

    sync_links(&mut tx, user_id, Link::Roles, &payload.roles).await?;
    sync_links(&mut tx, user_id, Link::StateGrants, &payload.state_grants).await?;
    sync_links(&mut tx, user_id, Link::LgaGrants, &payload.lga_grants).await?;
    sync_links(&mut tx, user_id, Link::WardGrants, &payload.ward_grants).await?;
    tx.commit().await?;

    tracing::info!(actor = auth.user_id, user_id, "user created");

    let user = fetch_user(&state.pool, user_id).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "Users",
    params(("id" = i64, Path, description = "User id")),
    request_body = UserUpdateRequest,
    responses(
        (status = 200, description = "User updated", body = User),
        (status = 400, description = "Unknown role or location id"),
        (status = 403, description = "Missing manage_users"),
        (status = 404, description = "No such user"),
        (status = 409, description = "Email already registered")
    ),
    security(("bearerAuth" = []))
)]
pub async fn update_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
    Json(payload): Json<UserUpdateRequest>,
) -> AppResult<Json<User>> {
    authorize_user_admin(&state, auth, "users.update", |ctx| UserPolicy::update(ctx, id)).await?;
    payload.validate()?;

    let mut row = fetch_user_row(&state.pool, id).await?;
    if let Some(name) = payload.name.as_deref() {
        row.name = name.trim().to_string();
    }
    if let Some(email) = payload.email.as_deref() {
        row.email = email.trim().to_lowercase();
    }
    if let Some(password) = payload.password.as_deref() {
        row.password_hash = hash_password(password)?;
    }

    let mut tx = state.pool.begin().await?;
    sqlx::query(
        "UPDATE users SET name = ?, email = ?, password_hash = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&row.name)
    .bind(&row.email)
    .bind(&row.password_hash)
    .bind(utc_now())
    .bind(id)
    .execute(&mut *tx)
    .await
    .map_err(duplicate_email)?;

    let links = [
        (Link::Roles, &payload.roles),
        (Link::StateGrants, &payload.state_grants),
        (Link::LgaGrants, &payload.lga_grants),
        (Link::WardGrants, &payload.ward_grants),
    ];
    for (link, ids) in links {
        if let Some(ids) = ids {
            sync_links(&mut tx, id, link, ids).await?;
        }
    }
    tx.commit().await?;

    tracing::info!(actor = auth.user_id, user_id = id, "user updated");

    Ok(Json(fetch_user(&state.pool, id).await?))
}

#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "Users",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 204, description = "User deleted with their roles and grants"),
        (status = 403, description = "Missing manage_users"),
        (status = 404, description = "No such user")
    ),
    security(("bearerAuth" = []))
)]
pub async fn delete_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    authorize_user_admin(&state, auth, "users.delete", |ctx| UserPolicy::delete(ctx, id)).await?;

    let affected = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id)
        .execute(&state.pool)
        .await?;
    if affected.rows_affected() == 0 {
        return Err(AppError::not_found("user not found"));
    }

    tracing::info!(actor = auth.user_id, user_id = id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    get,
    path = "/roles",
    tag = "Users",
    responses(
        (status = 200, description = "Assignable roles with their permissions", body = [Role]),
        (status = 403, description = "Missing manage_users")
    ),
    security(("bearerAuth" = []))
)]
pub async fn list_roles(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<Vec<Role>>> {
    authorize_user_admin(&state, auth, "roles.view_any", UserPolicy::view_any).await?;

    let rows = sqlx::query_as::<_, DbRole>("SELECT id, name, description FROM roles ORDER BY name")
        .fetch_all(&state.pool)
        .await?;

    let mut roles = Vec::with_capacity(rows.len());
    for row in rows {
        let permissions = sqlx::query_scalar::<_, String>(
            "SELECT p.name FROM role_permissions rp \
             INNER JOIN permissions p ON p.id = rp.permission_id \
             WHERE rp.role_id = ? ORDER BY p.name",
        )
        .bind(row.id)
        .fetch_all(&state.pool)
        .await?;
        roles.push(Role::from_row(row, permissions));
    }

    Ok(Json(roles))
}

/// Validates every id against its table, then replaces the stored set.
async fn sync_links(
    conn: &mut SqliteConnection,
    user_id: i64,
    link: Link,
    ids: &[i64],
) -> AppResult<()> {
    let missing = grants::missing_targets(&mut *conn, link, ids).await?;
    if !missing.is_empty() {
        return Err(AppError::bad_request(format!(
            "{} references unknown ids: {:?}",
            link.field(),
            missing
        )));
    }
    grants::replace_links(conn, link, user_id, ids).await
}

fn duplicate_email(err: sqlx::Error) -> AppError {
    let unique = err
        .as_database_error()
        .is_some_and(|db| db.is_unique_violation());
    if unique {
        AppError::conflict("email is already registered")
    } else {
        AppError::Database(err)
    }
}

async fn load_links(pool: &SqlitePool, user_id: i64) -> AppResult<UserLinks> {
    let roles = sqlx::query_scalar::<_, String>(
        "SELECT r.name FROM user_roles ur INNER JOIN roles r ON r.id = ur.role_id \
         WHERE ur.user_id = ? ORDER BY r.name",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(UserLinks {
        roles,
        state_grants: grants::link_ids(pool, Link::StateGrants, user_id).await?,
        lga_grants: grants::link_ids(pool, Link::LgaGrants, user_id).await?,
        ward_grants: grants::link_ids(pool, Link::WardGrants, user_id).await?,
    })
}

async fn fetch_user_row(pool: &SqlitePool, id: i64) -> AppResult<DbUser> {
    sqlx::query_as::<_, DbUser>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::not_found("user not found"))
}

async fn fetch_user(pool: &SqlitePool, id: i64) -> AppResult<User> {
    let row = fetch_user_row(pool, id).await?;
    let links = load_links(pool, id).await?;
    Ok(User::from_parts(row, links))
}
