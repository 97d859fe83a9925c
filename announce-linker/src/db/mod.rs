//! Database access for announce-linker
//!
//! Schema and connection setup live in `announce_common::db`; this module
//! holds the linker's queries.

pub mod repository;
pub mod statistics;
pub mod transit;

pub use repository::{LinkRepository, SqliteLinkRepository};
pub use statistics::{link_statistics, Coverage, LinkStatistics};
pub use transit::{section_stop_ids, upsert_route, upsert_stops, SectionWithStops};

use crate::error::LinkerResult;
use sqlx::SqlitePool;
use std::path::Path;

/// Open the entity store, creating it and its tables if needed
pub async fn init_database_pool(db_path: &Path) -> LinkerResult<SqlitePool> {
    tracing::debug!("Opening entity store: {}", db_path.display());
    let pool = announce_common::db::init_database(db_path).await?;
    Ok(pool)
}
