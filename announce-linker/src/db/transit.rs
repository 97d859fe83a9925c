//! Transit entity persistence
//!
//! Imports upsert: descriptive columns are refreshed from upstream, link
//! columns are never touched, so links survive a re-import.

use crate::error::LinkerResult;
use announce_common::db::{BusRoute, BusRouteSection, BusStop};
use sqlx::SqlitePool;

/// A route section with its ordered stop ids
#[derive(Debug, Clone, PartialEq)]
pub struct SectionWithStops {
    pub section: BusRouteSection,
    pub naptan_ids: Vec<String>,
}

/// Upsert a batch of stops in one transaction
pub async fn upsert_stops(pool: &SqlitePool, stops: &[BusStop]) -> LinkerResult<usize> {
    let mut tx = pool.begin().await?;

    for stop in stops {
        sqlx::query(
            r#"
            INSERT INTO bus_stops (
                naptan_id, indicator, stop_letter, stop_type, common_name,
                place_type, lat, lon, compass_direction
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(naptan_id) DO UPDATE SET
                indicator = excluded.indicator,
                stop_letter = excluded.stop_letter,
                stop_type = excluded.stop_type,
                common_name = excluded.common_name,
                place_type = excluded.place_type,
                lat = excluded.lat,
                lon = excluded.lon,
                compass_direction = excluded.compass_direction
            "#,
        )
        .bind(&stop.naptan_id)
        .bind(&stop.indicator)
        .bind(&stop.stop_letter)
        .bind(&stop.stop_type)
        .bind(&stop.common_name)
        .bind(&stop.place_type)
        .bind(stop.lat)
        .bind(stop.lon)
        .bind(&stop.compass_direction)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    Ok(stops.len())
}

/// Upsert a route with all its sections and stop sequences in one transaction
///
/// A section's stop sequence is replaced wholesale.
pub async fn upsert_route(
    pool: &SqlitePool,
    route: &BusRoute,
    sections: &[SectionWithStops],
) -> LinkerResult<()> {
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO bus_routes (id, route_name) VALUES (?, ?)
        ON CONFLICT(id) DO UPDATE SET route_name = excluded.route_name
        "#,
    )
    .bind(&route.id)
    .bind(&route.route_name)
    .execute(&mut *tx)
    .await?;

    for entry in sections {
        let section = &entry.section;
        sqlx::query(
            r#"
            INSERT INTO bus_route_sections (
                id, route_id, name, direction, origin_name, destination_name,
                origin_naptan_id, destination_naptan_id, line_strings
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                route_id = excluded.route_id,
                name = excluded.name,
                direction = excluded.direction,
                origin_name = excluded.origin_name,
                destination_name = excluded.destination_name,
                origin_naptan_id = excluded.origin_naptan_id,
                destination_naptan_id = excluded.destination_naptan_id,
                line_strings = excluded.line_strings
            "#,
        )
        .bind(&section.id)
        .bind(&section.route_id)
        .bind(&section.name)
        .bind(&section.direction)
        .bind(&section.origin_name)
        .bind(&section.destination_name)
        .bind(&section.origin_naptan_id)
        .bind(&section.destination_naptan_id)
        .bind(&section.line_strings)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM bus_route_section_stops WHERE route_section_id = ?")
            .bind(&section.id)
            .execute(&mut *tx)
            .await?;

        for (sequence, naptan_id) in entry.naptan_ids.iter().enumerate() {
            sqlx::query(
                "INSERT INTO bus_route_section_stops (route_section_id, naptan_id, sequence) VALUES (?, ?, ?)",
            )
            .bind(&section.id)
            .bind(naptan_id)
            .bind(sequence as i64)
            .execute(&mut *tx)
            .await?;
        }
    }

    tx.commit().await?;

    Ok(())
}

/// Stop ids of a section in sequence order
pub async fn section_stop_ids(pool: &SqlitePool, section_id: &str) -> LinkerResult<Vec<String>> {
    let ids = sqlx::query_scalar(
        "SELECT naptan_id FROM bus_route_section_stops WHERE route_section_id = ? ORDER BY sequence",
    )
    .bind(section_id)
    .fetch_all(pool)
    .await?;

    Ok(ids)
}
