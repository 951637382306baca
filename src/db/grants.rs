//! Identity & grant storage: loads a [`Principal`] for the acting user and
//! rewrites a user's role and location links.

use sqlx::{SqliteConnection, SqlitePool};

use crate::authz::{AuthzError, Principal};
use crate::errors::AppResult;

/// Loads roles (with their permissions) and the three grant sets of
/// `user_id`. Nothing is cached; every request sees the current rows.
pub async fn load_principal(pool: &SqlitePool, user_id: i64) -> AppResult<Principal> {
    let exists = sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    if exists.is_none() {
        return Err(AuthzError::UnknownUser(user_id).into());
    }

    let role_rows = sqlx::query_as::<_, (String, Option<String>)>(
        r#"
        SELECT r.name, p.name
        FROM user_roles ur
        INNER JOIN roles r ON r.id = ur.role_id
        LEFT JOIN role_permissions rp ON rp.role_id = r.id
        LEFT JOIN permissions p ON p.id = rp.permission_id
        WHERE ur.user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    let mut principal = Principal::new(user_id);
    for (role, permission) in role_rows {
        principal = principal.with_role(&role, permission);
    }

    let states = link_ids(pool, Link::StateGrants, user_id).await?;
    let lgas = link_ids(pool, Link::LgaGrants, user_id).await?;
    let wards = link_ids(pool, Link::WardGrants, user_id).await?;

    Ok(principal
        .with_state_grants(states)
        .with_lga_grants(lgas)
        .with_ward_grants(wards))
}

/// User → X association tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Link {
    Roles,
    StateGrants,
    LgaGrants,
    WardGrants,
}

impl Link {
    fn table(&self) -> &'static str {
        match self {
            Link::Roles => "user_roles",
            Link::StateGrants => "user_state_grants",
            Link::LgaGrants => "user_lga_grants",
            Link::WardGrants => "user_ward_grants",
        }
    }

    fn column(&self) -> &'static str {
        match self {
            Link::Roles => "role_id",
            Link::StateGrants => "state_id",
            Link::LgaGrants => "lga_id",
            Link::WardGrants => "ward_id",
        }
    }

    /// Table holding the linked rows, used to validate ids.
    pub fn target_table(&self) -> &'static str {
        match self {
            Link::Roles => "roles",
            Link::StateGrants => "states",
            Link::LgaGrants => "lgas",
            Link::WardGrants => "wards",
        }
    }

    pub fn field(&self) -> &'static str {
        match self {
            Link::Roles => "roles",
            Link::StateGrants => "state_grants",
            Link::LgaGrants => "lga_grants",
            Link::WardGrants => "ward_grants",
        }
    }
}

pub async fn link_ids(pool: &SqlitePool, link: Link, user_id: i64) -> AppResult<Vec<i64>> {
    let sql = format!(
        "SELECT {col} FROM {table} WHERE user_id = ? ORDER BY {col}",
        col = link.column(),
        table = link.table()
    );
    Ok(sqlx::query_scalar::<_, i64>(&sql)
        .bind(user_id)
        .fetch_all(pool)
        .await?)
}

/// Ids from `ids` that have no row in the link's target table.
pub async fn missing_targets(
    conn: &mut SqliteConnection,
    link: Link,
    ids: &[i64],
) -> AppResult<Vec<i64>> {
    let sql = format!("SELECT 1 FROM {} WHERE id = ?", link.target_table());
    let mut missing = Vec::new();
    for id in ids {
        let found = sqlx::query_scalar::<_, i64>(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;
        if found.is_none() {
            missing.push(*id);
        }
    }
    Ok(missing)
}

/// Replaces the user's links of one kind with `ids`. Duplicates collapse.
pub async fn replace_links(
    conn: &mut SqliteConnection,
    link: Link,
    user_id: i64,
    ids: &[i64],
) -> AppResult<()> {
    let delete = format!("DELETE FROM {} WHERE user_id = ?", link.table());
    sqlx::query(&delete).bind(user_id).execute(&mut *conn).await?;

    let insert = format!(
        "INSERT OR IGNORE INTO {} (user_id, {}) VALUES (?, ?)",
        link.table(),
        link.column()
    );
    for id in ids {
        sqlx::query(&insert)
            .bind(user_id)
            .bind(id)
            .execute(&mut *conn)
            .await?;
    }

    tracing::debug!(user_id, link = link.table(), count = ids.len(), "links replaced");
    Ok(())
}
