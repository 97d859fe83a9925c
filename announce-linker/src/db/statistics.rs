//! Link coverage statistics for the `status` command

use crate::error::LinkerResult;
use announce_common::db::MANUAL_LINK_CONFIDENCE;
use serde::Serialize;
use sqlx::SqlitePool;

/// Linked / manual counts for one kind of link target
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Coverage {
    pub total: i64,
    pub linked: i64,
    pub manual: i64,
}

impl Coverage {
    pub fn unlinked(&self) -> i64 {
        self.total - self.linked
    }
}

/// Coverage across the whole store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LinkStatistics {
    pub stops: Coverage,
    pub origins: Coverage,
    pub destinations: Coverage,
    pub routes: i64,
}

async fn coverage(pool: &SqlitePool, table: &str, file_column: &str, score_column: &str) -> LinkerResult<Coverage> {
    let sql = format!(
        "SELECT COUNT(*), COUNT({file}), COALESCE(SUM(CASE WHEN {score} = ? THEN 1 ELSE 0 END), 0) FROM {table}",
        file = file_column,
        score = score_column,
        table = table,
    );
    let (total, linked, manual): (i64, i64, i64) = sqlx::query_as(&sql)
        .bind(MANUAL_LINK_CONFIDENCE)
        .fetch_one(pool)
        .await?;

    Ok(Coverage {
        total,
        linked,
        manual,
    })
}

/// Count linked, unlinked and operator-confirmed targets
pub async fn link_statistics(pool: &SqlitePool) -> LinkerResult<LinkStatistics> {
    let stops = coverage(pool, "bus_stops", "audio_file", "audio_file_likeliness").await?;
    let origins = coverage(
        pool,
        "bus_route_sections",
        "origin_audio_file",
        "origin_audio_file_likeliness",
    )
    .await?;
    let destinations = coverage(
        pool,
        "bus_route_sections",
        "destination_audio_file",
        "destination_audio_file_likeliness",
    )
    .await?;
    let routes: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bus_routes")
        .fetch_one(pool)
        .await?;

    Ok(LinkStatistics {
        stops,
        origins,
        destinations,
        routes,
    })
}
