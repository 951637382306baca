use axum::extract::State;
use axum::Json;

use crate::app::AppState;
use crate::db::grants;
use crate::errors::AppResult;
use crate::jwt::AuthUser;
use crate::models::rbac::EffectivePermissions;

/// The caller's roles, permissions and direct grants, freshly loaded.
#[utoipa::path(
    get,
    path = "/me/permissions",
    tag = "Me",
    responses(
        (status = 200, description = "Effective permissions of the caller",
            body = EffectivePermissions),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearerAuth" = []))
)]
pub async fn my_permissions(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<EffectivePermissions>> {
    let principal = grants::load_principal(&state.pool, auth.user_id).await?;

    let mut state_grants: Vec<i64> = principal.state_grants.iter().map(|id| id.0).collect();
    let mut lga_grants: Vec<i64> = principal.lga_grants.iter().map(|id| id.0).collect();
    let mut ward_grants: Vec<i64> = principal.ward_grants.iter().map(|id| id.0).collect();
    state_grants.sort_unstable();
    lga_grants.sort_unstable();
    ward_grants.sort_unstable();

    Ok(Json(EffectivePermissions {
        user_id: principal.user_id,
        is_admin: principal.is_admin(),
        roles: principal.role_names().into_iter().map(str::to_string).collect(),
        permissions: principal.permission_names().into_iter().map(str::to_string).collect(),
        state_grants,
        lga_grants,
        ward_grants,
    }))
}
