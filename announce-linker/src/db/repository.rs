//! Link repository
//!
//! The resolvers see the entity store only through [`LinkRepository`]:
//! read the facilities that still need a link, stage link decisions,
//! commit them. Staged decisions are written in a single transaction so a
//! failed commit leaves the store as it was before.

use crate::error::LinkerResult;
use crate::models::{AudioLink, LinkTarget};
use announce_common::db::{BusRouteSection, BusStop};
use async_trait::async_trait;
use sqlx::SqlitePool;

/// Entity access needed by the link resolvers
#[async_trait]
pub trait LinkRepository: Send {
    /// Route sections with at least one unlinked end, in stored order
    async fn unresolved_sections(&mut self) -> LinkerResult<Vec<BusRouteSection>>;

    /// Unlinked stops, in stored order
    async fn unresolved_stops(&mut self) -> LinkerResult<Vec<BusStop>>;

    /// Stage a link decision; `None` stores an explicit "no link"
    fn set_link(&mut self, target: &LinkTarget, link: Option<&AudioLink>);

    /// Write every staged decision, returning how many were written
    async fn commit(&mut self) -> LinkerResult<usize>;
}

/// SQLite-backed [`LinkRepository`]
pub struct SqliteLinkRepository {
    pool: SqlitePool,
    pending: Vec<(LinkTarget, Option<AudioLink>)>,
}

impl SqliteLinkRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            pending: Vec::new(),
        }
    }

    /// Decisions staged since the last commit
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn update_statement(target: &LinkTarget) -> &'static str {
    match target {
        LinkTarget::Stop { .. } => {
            "UPDATE bus_stops SET audio_file = ?, audio_file_likeliness = ? WHERE naptan_id = ?"
        }
        LinkTarget::SectionOrigin { .. } => {
            "UPDATE bus_route_sections SET origin_audio_file = ?, origin_audio_file_likeliness = ? WHERE id = ?"
        }
        LinkTarget::SectionDestination { .. } => {
            "UPDATE bus_route_sections SET destination_audio_file = ?, destination_audio_file_likeliness = ? WHERE id = ?"
        }
    }
}

#[async_trait]
impl LinkRepository for SqliteLinkRepository {
    async fn unresolved_sections(&mut self) -> LinkerResult<Vec<BusRouteSection>> {
        let sections = sqlx::query_as::<_, BusRouteSection>(
            r#"
            SELECT id, route_id, name, direction,
                   origin_name, origin_audio_file, origin_audio_file_likeliness,
                   destination_name, destination_audio_file, destination_audio_file_likeliness,
                   origin_naptan_id, destination_naptan_id, line_strings
            FROM bus_route_sections
            WHERE origin_audio_file IS NULL OR destination_audio_file IS NULL
            ORDER BY rowid
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(sections)
    }

    async fn unresolved_stops(&mut self) -> LinkerResult<Vec<BusStop>> {
        let stops = sqlx::query_as::<_, BusStop>(
            r#"
            SELECT naptan_id, indicator, stop_letter, stop_type, common_name, place_type,
                   lat, lon, compass_direction, audio_file, audio_file_likeliness
            FROM bus_stops
            WHERE audio_file IS NULL
            ORDER BY rowid
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(stops)
    }

    fn set_link(&mut self, target: &LinkTarget, link: Option<&AudioLink>) {
        self.pending.push((target.clone(), link.cloned()));
    }

    async fn commit(&mut self) -> LinkerResult<usize> {
        if self.pending.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;

        for (target, link) in &self.pending {
            let result = sqlx::query(update_statement(target))
                .bind(link.as_ref().map(|l| l.filename.as_str()))
                .bind(link.as_ref().map(|l| l.confidence.as_db_value()))
                .bind(target.entity_id())
                .execute(&mut *tx)
                .await?;

            if result.rows_affected() == 0 {
                // Dropping `tx` rolls back everything staged so far
                return Err(announce_common::Error::UnknownTarget {
                    target: target.to_string(),
                }
                .into());
            }
        }

        tx.commit().await?;

        let written = self.pending.len();
        self.pending.clear();
        tracing::debug!(written, "Link decisions committed");

        Ok(written)
    }
}
