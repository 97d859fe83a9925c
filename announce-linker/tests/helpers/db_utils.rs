//! Database Test Utilities
//!
//! In-memory entity stores seeded with just the columns the linker reads.

use announce_common::db::create_tables;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

/// Stored link column pair
pub type Link = (Option<String>, Option<i64>);

/// Fresh in-memory store with every table created
///
/// Single connection: each new connection to `sqlite::memory:` would be a
/// separate, empty database.
pub async fn create_test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("open in-memory database");
    create_tables(&pool).await.expect("create tables");
    pool
}

pub async fn seed_stop(pool: &SqlitePool, naptan_id: &str, common_name: &str) {
    sqlx::query(
        "INSERT INTO bus_stops (naptan_id, common_name, place_type, lat, lon) VALUES (?, ?, 'StopPoint', 51.5, -0.1)",
    )
    .bind(naptan_id)
    .bind(common_name)
    .execute(pool)
    .await
    .expect("seed stop");
}

/// Seed a section (and its route, if new) with both ends unlinked
pub async fn seed_section(
    pool: &SqlitePool,
    section_id: &str,
    route_id: &str,
    origin_name: &str,
    destination_name: &str,
) {
    sqlx::query("INSERT OR IGNORE INTO bus_routes (id, route_name) VALUES (?, ?)")
        .bind(route_id)
        .bind(route_id)
        .execute(pool)
        .await
        .expect("seed route");

    sqlx::query(
        r#"
        INSERT INTO bus_route_sections (
            id, route_id, name, direction, origin_name, destination_name,
            origin_naptan_id, destination_naptan_id
        ) VALUES (?, ?, ?, 'outbound', ?, ?, 'O', 'D')
        "#,
    )
    .bind(section_id)
    .bind(route_id)
    .bind(format!("{} - {}", origin_name, destination_name))
    .bind(origin_name)
    .bind(destination_name)
    .execute(pool)
    .await
    .expect("seed section");
}

pub async fn set_stop_link(pool: &SqlitePool, naptan_id: &str, file: &str, score: i64) {
    sqlx::query("UPDATE bus_stops SET audio_file = ?, audio_file_likeliness = ? WHERE naptan_id = ?")
        .bind(file)
        .bind(score)
        .bind(naptan_id)
        .execute(pool)
        .await
        .expect("set stop link");
}

pub async fn stop_link(pool: &SqlitePool, naptan_id: &str) -> Link {
    sqlx::query_as("SELECT audio_file, audio_file_likeliness FROM bus_stops WHERE naptan_id = ?")
        .bind(naptan_id)
        .fetch_one(pool)
        .await
        .expect("read stop link")
}

/// (origin, destination) link pairs of a section
pub async fn section_links(pool: &SqlitePool, section_id: &str) -> (Link, Link) {
    let (of, os, df, ds): (Option<String>, Option<i64>, Option<String>, Option<i64>) =
        sqlx::query_as(
            r#"
            SELECT origin_audio_file, origin_audio_file_likeliness,
                   destination_audio_file, destination_audio_file_likeliness
            FROM bus_route_sections WHERE id = ?
            "#,
        )
        .bind(section_id)
        .fetch_one(pool)
        .await
        .expect("read section links");
    ((of, os), (df, ds))
}
