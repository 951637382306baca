use axum::Router;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::openapi::Server;
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::models;
use crate::routes;

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::health::health,
        routes::records::list_records,
        routes::records::create_record,
        routes::records::get_record,
        routes::records::update_record,
        routes::records::delete_record,
        routes::project_outlooks::list_project_outlooks,
        routes::project_outlooks::create_project_outlook,
        routes::project_outlooks::update_project_outlook,
        routes::project_outlooks::delete_project_outlook,
        routes::users::list_users,
        routes::users::create_user,
        routes::users::update_user,
        routes::users::delete_user,
        routes::users::list_roles,
        routes::locations::list_states,
        routes::locations::list_lga_wards,
        routes::locations::search_wards,
        routes::me::my_permissions
    ),
    components(
        schemas(
            routes::health::HealthResponse,
            models::record::Record,
            models::record::RecordEntry,
            models::record::RecordCreateRequest,
            models::record::RecordUpdateRequest,
            models::record::RecordPage,
            models::project_outlook::ProjectOutlook,
            models::project_outlook::ProjectOutlookCreateRequest,
            models::project_outlook::ProjectOutlookUpdateRequest,
            models::project_outlook::ProjectOutlookPage,
            models::user::User,
            models::user::UserCreateRequest,
            models::user::UserUpdateRequest,
            models::user::UserPage,
            models::rbac::Role,
            models::rbac::EffectivePermissions,
            models::location::State,
            models::location::Lga,
            models::location::Ward,
            models::location::StateWithLgas
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "Health", description = "Liveness"),
        (name = "Records", description = "Change records scoped by state and LGA"),
        (name = "Project Outlooks", description = "Yearly targets per LGA"),
        (name = "Users", description = "Accounts, roles and location grants"),
        (name = "Locations", description = "State, LGA and ward lookups"),
        (name = "Me", description = "The caller's effective permissions")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearerAuth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

pub fn build_openapi(port: u16) -> anyhow::Result<utoipa::openapi::OpenApi> {
    let mut doc = ApiDoc::openapi();
    doc.info.title = "change-tracker".to_string();
    doc.servers = Some(vec![Server::new(format!("http://localhost:{port}"))]);
    Ok(doc)
}

/// Swagger UI at `/docs`, raw JSON at `/api-docs/openapi.json`.
pub fn swagger_routes(doc: utoipa::openapi::OpenApi) -> Router {
    let config = utoipa_swagger_ui::Config::new(["/api-docs/openapi.json"])
        .try_it_out_enabled(true)
        .persist_authorization(true);

    Router::new().merge(
        SwaggerUi::new("/docs")
            .url("/api-docs/openapi.json", doc)
            .config(config),
    )
}
