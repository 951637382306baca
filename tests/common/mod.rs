#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use axum::body::{self, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::SqlitePool;
use tempfile::TempDir;
use tower::util::ServiceExt; // for `oneshot`

use change_tracker::authz::{Authorizer, Permission};
use change_tracker::jwt::JwtConfig;
use change_tracker::{router, AppState};

pub const LAGOS: i64 = 5;
pub const KANO: i64 = 20;
pub const IKEJA: i64 = 9;
pub const EPE: i64 = 10;
pub const NASSARAWA: i64 = 30;
pub const ALAUSA: i64 = 42;
pub const OREGUN: i64 = 43;
pub const IBEJU: i64 = 50;
pub const GWALE: i64 = 60;

pub struct TestApp {
    pub app: Router,
    pub pool: SqlitePool,
    pub jwt: JwtConfig,
    _dir: TempDir,
}

/// Fresh temp-file database, migrated and seeded with the Lagos/Kano
/// gazetteer and the standard roles.
pub async fn spawn() -> Result<TestApp> {
    let dir = tempfile::tempdir()?;
    let opts = SqliteConnectOptions::new()
        .filename(dir.path().join("test.db"))
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePool::connect_with(opts).await?;

    let migrations = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations");
    let migrator = sqlx::migrate::Migrator::new(migrations).await?;
    migrator.run(&pool).await?;

    seed_locations(&pool).await?;
    seed_roles(&pool).await?;

    let jwt = JwtConfig {
        secret: Arc::new(b"test-secret".to_vec()),
        exp_hours: 1,
    };
    let state = AppState::new(pool.clone(), jwt.clone(), Authorizer::standard()?);

    Ok(TestApp {
        app: router(state),
        pool,
        jwt,
        _dir: dir,
    })
}

async fn seed_locations(pool: &SqlitePool) -> Result<()> {
    for (id, name) in [(LAGOS, "Lagos"), (KANO, "Kano")] {
        sqlx::query("INSERT INTO states (id, name) VALUES (?, ?)")
            .bind(id)
            .bind(name)
            .execute(pool)
            .await?;
    }
    for (id, state, name) in [
        (IKEJA, LAGOS, "Ikeja"),
        (EPE, LAGOS, "Epe"),
        (NASSARAWA, KANO, "Nassarawa"),
    ] {
        sqlx::query("INSERT INTO lgas (id, state_id, name) VALUES (?, ?, ?)")
            .bind(id)
            .bind(state)
            .bind(name)
            .execute(pool)
            .await?;
    }
    for (id, lga, name) in [
        (ALAUSA, IKEJA, "Alausa"),
        (OREGUN, IKEJA, "Oregun"),
        (IBEJU, EPE, "Ibeju"),
        (GWALE, NASSARAWA, "Gwale"),
    ] {
        sqlx::query("INSERT INTO wards (id, lga_id, name) VALUES (?, ?, ?)")
            .bind(id)
            .bind(lga)
            .bind(name)
            .execute(pool)
            .await?;
    }
    Ok(())
}

async fn seed_roles(pool: &SqlitePool) -> Result<()> {
    for permission in Permission::ALL {
        sqlx::query("INSERT INTO permissions (name) VALUES (?)")
            .bind(permission.as_str())
            .execute(pool)
            .await?;
    }

    let roles: [(&str, &[&str]); 4] = [
        ("admin", &[]),
        (
            "state_editor",
            &[
                "view_records",
                "create_records",
                "edit_records",
                "manage_state_records",
                "manage_lga_records",
                "view_project_outlooks",
                "create_project_outlooks",
                "edit_project_outlooks",
            ],
        ),
        (
            "lga_editor",
            &[
                "view_records",
                "create_records",
                "edit_records",
                "delete_records",
                "manage_lga_records",
                "manage_ward_records",
                "view_project_outlooks",
                "edit_project_outlooks",
            ],
        ),
        ("user_admin", &["manage_users"]),
    ];

    for (role, permissions) in roles {
        let role_id = sqlx::query("INSERT INTO roles (name) VALUES (?)")
            .bind(role)
            .execute(pool)
            .await?
            .last_insert_rowid();
        for permission in permissions {
            sqlx::query(
                "INSERT INTO role_permissions (role_id, permission_id) \
                 SELECT ?, id FROM permissions WHERE name = ?",
            )
            .bind(role_id)
            .bind(*permission)
            .execute(pool)
            .await?;
        }
    }
    Ok(())
}

#[derive(Default)]
pub struct Grants<'a> {
    pub roles: &'a [&'a str],
    pub states: &'a [i64],
    pub lgas: &'a [i64],
    pub wards: &'a [i64],
}

impl<'a> Grants<'a> {
    pub fn of(roles: &'a [&'a str]) -> Self {
        Grants {
            roles,
            ..Default::default()
        }
    }

    pub fn states(self, states: &'a [i64]) -> Self {
        Grants { states, ..self }
    }

    pub fn lgas(self, lgas: &'a [i64]) -> Self {
        Grants { lgas, ..self }
    }

    pub fn wards(self, wards: &'a [i64]) -> Self {
        Grants { wards, ..self }
    }
}

impl TestApp {
    pub async fn user(&self, email: &str, grants: Grants<'_>) -> Result<i64> {
        let now = chrono::Utc::now();
        let user_id = sqlx::query(
            "INSERT INTO users (name, email, password_hash, created_at, updated_at) \
             VALUES (?, ?, 'x', ?, ?)",
        )
        .bind(email)
        .bind(email)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        for role in grants.roles {
            sqlx::query(
                "INSERT INTO user_roles (user_id, role_id) SELECT ?, id FROM roles WHERE name = ?",
            )
            .bind(user_id)
            .bind(*role)
            .execute(&self.pool)
            .await?;
        }
        for (table, column, ids) in [
            ("user_state_grants", "state_id", grants.states),
            ("user_lga_grants", "lga_id", grants.lgas),
            ("user_ward_grants", "ward_id", grants.wards),
        ] {
            for id in ids {
                sqlx::query(&format!("INSERT INTO {table} (user_id, {column}) VALUES (?, ?)"))
                    .bind(user_id)
                    .bind(*id)
                    .execute(&self.pool)
                    .await?;
            }
        }
        Ok(user_id)
    }

    /// Creates the user and returns a bearer token for them.
    pub async fn login(&self, email: &str, grants: Grants<'_>) -> Result<String> {
        let id = self.user(email, grants).await?;
        self.token(id)
    }

    pub async fn admin(&self) -> Result<String> {
        self.login("admin@example.gov.ng", Grants::of(&["admin"])).await
    }

    pub fn token(&self, user_id: i64) -> Result<String> {
        Ok(self.jwt.encode(user_id)?)
    }

    pub async fn role_id(&self, name: &str) -> Result<i64> {
        Ok(sqlx::query_scalar::<_, i64>("SELECT id FROM roles WHERE name = ?")
            .bind(name)
            .fetch_one(&self.pool)
            .await?)
    }

    pub async fn insert_record(
        &self,
        state_id: i64,
        lga_id: i64,
        ward_id: Option<i64>,
        year: i32,
    ) -> Result<i64> {
        let now = chrono::Utc::now();
        Ok(sqlx::query(
            "INSERT INTO records (state_id, lga_id, ward_id, year, data, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(state_id)
        .bind(lga_id)
        .bind(ward_id)
        .bind(year)
        .bind(r#"[{"key":"boreholes","value":"3"}]"#)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?
        .last_insert_rowid())
    }

    pub async fn insert_outlook(
        &self,
        state_id: i64,
        lga_id: i64,
        outlook: i64,
        year: i32,
    ) -> Result<i64> {
        let now = chrono::Utc::now();
        Ok(sqlx::query(
            "INSERT INTO project_outlooks \
             (state_id, lga_id, outlook, project_year, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(state_id)
        .bind(lga_id)
        .bind(outlook)
        .bind(year)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?
        .last_insert_rowid())
    }

    /// Sends one request and returns the status with the JSON body
    /// (`Null` for empty bodies).
    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Result<(StatusCode, Value)> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))?,
            None => builder.body(Body::empty())?,
        };

        let response = self.app.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = body::to_bytes(response.into_body(), 10_485_760).await?;
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };
        Ok((status, value))
    }
}
