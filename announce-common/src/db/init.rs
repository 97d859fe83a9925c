//! Database initialization
//!
//! Opens (or creates) the entity store and makes sure every table exists.
//! Table creation is idempotent, so this runs on every start.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Current schema version recorded in `schema_version`
pub const SCHEMA_VERSION: i64 = 1;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(4)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await?;

    // WAL keeps every committed link durable without blocking readers
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;

    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    create_tables(&pool).await?;

    Ok(pool)
}

/// Create every entity store table (idempotent)
pub async fn create_tables(pool: &SqlitePool) -> Result<()> {
    create_schema_version_table(pool).await?;
    create_bus_stops_table(pool).await?;
    create_bus_routes_table(pool).await?;
    create_bus_route_sections_table(pool).await?;
    create_bus_route_section_stops_table(pool).await?;

    sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
        .bind(SCHEMA_VERSION)
        .execute(pool)
        .await?;

    tracing::debug!("Entity store tables ready (schema version {})", SCHEMA_VERSION);

    Ok(())
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the bus_stops table
///
/// `audio_file` and `audio_file_likeliness` are NULL together until the stop
/// is linked.
pub async fn create_bus_stops_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS bus_stops (
            naptan_id TEXT PRIMARY KEY,
            indicator TEXT,
            stop_letter TEXT,
            stop_type TEXT,
            common_name TEXT NOT NULL,
            place_type TEXT NOT NULL,
            lat REAL NOT NULL,
            lon REAL NOT NULL,
            compass_direction TEXT,
            audio_file TEXT,
            audio_file_likeliness INTEGER,
            CHECK ((audio_file IS NULL) = (audio_file_likeliness IS NULL))
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS ix_bus_stops_audio_file_likeliness ON bus_stops (audio_file_likeliness)",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS ix_bus_stops_lat_lon ON bus_stops (lat, lon)")
        .execute(pool)
        .await?;

    Ok(())
}

async fn create_bus_routes_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS bus_routes (
            id TEXT PRIMARY KEY,
            route_name TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the bus_route_sections table
///
/// Origin and destination carry independent link column pairs.
pub async fn create_bus_route_sections_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS bus_route_sections (
            id TEXT PRIMARY KEY,
            route_id TEXT NOT NULL REFERENCES bus_routes(id),
            name TEXT NOT NULL,
            direction TEXT NOT NULL,
            origin_name TEXT NOT NULL,
            origin_audio_file TEXT,
            origin_audio_file_likeliness INTEGER,
            destination_name TEXT NOT NULL,
            destination_audio_file TEXT,
            destination_audio_file_likeliness INTEGER,
            origin_naptan_id TEXT NOT NULL,
            destination_naptan_id TEXT NOT NULL,
            line_strings TEXT NOT NULL DEFAULT '',
            CHECK ((origin_audio_file IS NULL) = (origin_audio_file_likeliness IS NULL)),
            CHECK ((destination_audio_file IS NULL) = (destination_audio_file_likeliness IS NULL))
        )
        "#,
    )
    .execute(pool)
    .await?;

    for (index, column) in [
        ("ix_bus_route_sections_route_id", "route_id"),
        ("ix_bus_route_sections_origin_naptan_id", "origin_naptan_id"),
        ("ix_bus_route_sections_destination_naptan_id", "destination_naptan_id"),
    ] {
        let sql = format!(
            "CREATE INDEX IF NOT EXISTS {} ON bus_route_sections ({})",
            index, column
        );
        sqlx::query(&sql).execute(pool).await?;
    }

    Ok(())
}

async fn create_bus_route_section_stops_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS bus_route_section_stops (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            route_section_id TEXT NOT NULL REFERENCES bus_route_sections(id),
            naptan_id TEXT NOT NULL,
            sequence INTEGER NOT NULL,
            UNIQUE (route_section_id, sequence)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS ix_bus_route_section_stops_naptan_id ON bus_route_section_stops (naptan_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
