use std::sync::Arc;

use axum::http::Method;
use axum::routing::{get, put};
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::authz::{AccessContext, Authorizer, LocationHierarchy, Principal};
use crate::errors::AppError;
use crate::jwt::JwtConfig;
use crate::routes::{health, locations, me, project_outlooks, records, users};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub jwt: Arc<JwtConfig>,
    pub authorizer: Arc<Authorizer>,
}

impl AppState {
    pub fn new(pool: SqlitePool, jwt: JwtConfig, authorizer: Authorizer) -> Self {
        Self {
            pool,
            jwt: Arc::new(jwt),
            authorizer: Arc::new(authorizer),
        }
    }

    pub fn context<'a>(
        &'a self,
        principal: &'a Principal,
        hierarchy: &'a dyn LocationHierarchy,
    ) -> AccessContext<'a> {
        AccessContext::new(&self.authorizer, principal, hierarchy)
    }
}

/// Builds the router from environment configuration. The permission
/// registry is constructed here; a broken rule table aborts startup.
pub async fn create_app(pool: SqlitePool) -> Result<Router, AppError> {
    let jwt_config = JwtConfig::from_env()?;
    let authorizer = Authorizer::standard()
        .map_err(|err| AppError::configuration(format!("permission registry: {err}")))?;

    tracing::info!(rules = authorizer.registry().len(), "permission registry ready");

    Ok(router(AppState::new(pool, jwt_config, authorizer)))
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_origin(Any)
        .allow_headers(Any);

    let record_routes = Router::new()
        .route("/", get(records::list_records).post(records::create_record))
        .route(
            "/:id",
            get(records::get_record)
                .put(records::update_record)
                .delete(records::delete_record),
        );

    let outlook_routes = Router::new()
        .route(
            "/",
            get(project_outlooks::list_project_outlooks)
                .post(project_outlooks::create_project_outlook),
        )
        .route(
            "/:id",
            put(project_outlooks::update_project_outlook)
                .delete(project_outlooks::delete_project_outlook),
        );

    let user_routes = Router::new()
        .route("/", get(users::list_users).post(users::create_user))
        .route("/:id", put(users::update_user).delete(users::delete_user));

    Router::new()
        .route("/api/health", get(health::health))
        .nest("/records", record_routes)
        .nest("/project-outlooks", outlook_routes)
        .nest("/users", user_routes)
        .route("/roles", get(users::list_roles))
        .route("/states", get(locations::list_states))
        .route("/lgas/:id/wards", get(locations::list_lga_wards))
        .route("/wards", get(locations::search_wards))
        .route("/me/permissions", get(me::my_permissions))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
