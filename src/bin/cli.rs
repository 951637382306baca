use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use sqlx::migrate::Migrator;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use change_tracker::authz::{Authorizer, Placement, Resource, Rule};
use change_tracker::db::{grants, locations};
use change_tracker::models::rbac::RegisteredPermission;

#[derive(Parser, Debug)]
#[command(author, version, about = "change-tracker maintenance tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a new empty migration with the provided name
    MakeMigration { name: String },
    /// Apply pending migrations
    MigrateRun,
    /// Show migration status against the current database
    MigrateStatus,
    /// Roll back the last applied migration
    MigrateRollback,
    /// Print the permission registry as JSON
    Permissions,
    /// Evaluate one permission for one user and print the decision
    Check(CheckArgs),
}

#[derive(Args, Debug)]
struct CheckArgs {
    #[arg(long)]
    user: i64,
    #[arg(long)]
    permission: String,
    #[command(flatten)]
    target: Target,
}

/// At most one resource to check against.
#[derive(Args, Debug)]
#[group(multiple = false)]
struct Target {
    #[arg(long)]
    state: Option<i64>,
    #[arg(long)]
    lga: Option<i64>,
    #[arg(long)]
    ward: Option<i64>,
    #[arg(long)]
    record: Option<i64>,
    #[arg(long)]
    outlook: Option<i64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if dotenvy::dotenv().is_err() {
        let crate_env = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
        let _ = dotenvy::from_path(crate_env);
    }

    let cli = Cli::parse();

    match cli.command {
        Commands::MakeMigration { name } => {
            let path = make_migration_file(&name)?;
            println!("Created migration: {}", path.display());
        }
        Commands::MigrateRun => {
            let pool = get_pool().await?;
            load_migrator().await?.run(&pool).await?;
            println!("Migrations applied");
        }
        Commands::MigrateStatus => {
            let pool = get_pool().await?;
            print_status(&pool, &load_migrator().await?).await?;
        }
        Commands::MigrateRollback => {
            let pool = get_pool().await?;
            load_migrator()
                .await?
                .undo(&pool, 1)
                .await
                .context("no migrations were rolled back")?;
            println!("Rolled back last migration");
        }
        Commands::Permissions => print_permissions()?,
        Commands::Check(args) => {
            let pool = get_pool().await?;
            check(&pool, args).await?;
        }
    }

    Ok(())
}

fn print_permissions() -> anyhow::Result<()> {
    let authorizer = Authorizer::standard()?;
    let rows: Vec<RegisteredPermission> = authorizer
        .registry()
        .iter()
        .map(|(permission, rule)| {
            let (shape, scope) = match rule {
                Rule::Simple => ("simple", None),
                Rule::Hierarchical(kind) => ("hierarchical", Some(kind.as_str().to_string())),
                Rule::Placement(entity) => ("placement", Some(entity.as_str().to_string())),
            };
            RegisteredPermission {
                name: permission.to_string(),
                rule: shape.to_string(),
                scope,
            }
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}

async fn check(pool: &SqlitePool, args: CheckArgs) -> anyhow::Result<()> {
    let authorizer = Authorizer::standard()?;
    let principal = grants::load_principal(pool, args.user).await?;

    let resource = resolve_target(pool, &args.target).await?;
    let hierarchy = match resource {
        Some(resource) => locations::ancestry_of(pool, &[resource]).await?,
        None => Default::default(),
    };

    match authorizer.authorize(&principal, &hierarchy, &args.permission, resource) {
        Ok(true) => println!("allow"),
        Ok(false) => println!("deny"),
        Err(err) => anyhow::bail!("error: {err}"),
    }
    Ok(())
}

async fn resolve_target(pool: &SqlitePool, target: &Target) -> anyhow::Result<Option<Resource>> {
    if let Some(id) = target.state {
        return Ok(Some(Resource::state(id)));
    }
    if let Some(id) = target.lga {
        return Ok(Some(Resource::lga(id)));
    }
    if let Some(id) = target.ward {
        return Ok(Some(Resource::ward(id)));
    }
    if let Some(id) = target.record {
        let (state_id, lga_id, ward_id) = sqlx::query_as::<_, (i64, i64, Option<i64>)>(
            "SELECT state_id, lga_id, ward_id FROM records WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?
        .with_context(|| format!("record {id} not found"))?;
        return Ok(Some(Resource::Record(Placement::new(state_id, lga_id, ward_id))));
    }
    if let Some(id) = target.outlook {
        let (state_id, lga_id) = sqlx::query_as::<_, (i64, i64)>(
            "SELECT state_id, lga_id FROM project_outlooks WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?
        .with_context(|| format!("project outlook {id} not found"))?;
        return Ok(Some(Resource::ProjectOutlook(Placement::new(state_id, lga_id, None))));
    }
    Ok(None)
}

fn make_migration_file(name: &str) -> anyhow::Result<PathBuf> {
    let timestamp = Utc::now().format("%Y%m%d%H%M%S");
    let path = Path::new("migrations").join(format!("{}_{}.sql", timestamp, sanitize_name(name)));

    if path.exists() {
        anyhow::bail!("migration already exists: {}", path.display());
    }

    fs::write(&path, "-- Write your migration SQL here\n")
        .with_context(|| format!("failed to create migration at {}", path.display()))?;

    Ok(path)
}

async fn get_pool() -> anyhow::Result<SqlitePool> {
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL not set")?;
    SqlitePoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await
        .context("failed to connect to database")
}

async fn print_status(pool: &SqlitePool, migrator: &Migrator) -> anyhow::Result<()> {
    let tracked = sqlx::query_scalar::<_, String>(
        "SELECT name FROM sqlite_master WHERE type = 'table' AND name = '_sqlx_migrations'",
    )
    .fetch_optional(pool)
    .await?;

    let applied: HashSet<i64> = match tracked {
        Some(_) => {
            sqlx::query_scalar::<_, i64>("SELECT version FROM _sqlx_migrations WHERE success = 1")
                .fetch_all(pool)
                .await?
                .into_iter()
                .collect()
        }
        None => HashSet::new(),
    };

    println!("{:<8} {:<16} Name", "Status", "Version");
    for migration in migrator.iter() {
        let status = if applied.contains(&migration.version) { "applied" } else { "pending" };
        println!("{:<8} {:<16} {}", status, migration.version, migration.description.trim());
    }

    Ok(())
}

fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '_' => c,
            'A'..='Z' => c.to_ascii_lowercase(),
            _ => '_',
        })
        .collect()
}

/// `./migrations` when run from the repo root, else the crate-local folder.
async fn load_migrator() -> anyhow::Result<Migrator> {
    let local = Path::new("./migrations");
    let dir = if local.exists() {
        local.to_path_buf()
    } else {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations")
    };

    let display = dir.display().to_string();
    Migrator::new(dir)
        .await
        .with_context(|| format!("failed to load migrations from {display}"))
}
