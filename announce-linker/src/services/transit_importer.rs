//! Transit importer
//!
//! Pulls bus stops and bus routes from a [`TransitSource`], validates every
//! record and upserts them into the entity store. Any malformed record, or a
//! stop page listing the same stop twice, aborts the import; pages and routes
//! already committed stay committed.

use crate::db::{upsert_route, upsert_stops, SectionWithStops};
use crate::error::{LinkerError, LinkerResult};
use crate::models::transit::{parse_record, Route, RouteSequence, StopPoint, StopPointPage};
use crate::services::tfl_client::TransitSource;
use announce_common::db::BusStop;
use serde_json::Value;
use sqlx::SqlitePool;
use std::collections::{BTreeSet, HashSet};
use tracing::{info, warn};

/// Stop points per upstream page
pub const STOPS_PER_PAGE: u64 = 1000;

/// Counters for one import run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    pub stop_pages: u32,
    pub stops: usize,
    pub routes: usize,
    pub sections: usize,
    pub section_stops: usize,
}

/// Convert one stop page into store rows
///
/// Returns the rows and the upstream total used for pagination.
pub fn convert_stop_page(page: u32, document: &Value) -> LinkerResult<(Vec<BusStop>, u64)> {
    let parsed: StopPointPage = parse_record("stop page", document)?;

    let stops = parsed
        .stop_points
        .iter()
        .map(|record| parse_record::<StopPoint>("stop", record).map(StopPoint::into_bus_stop))
        .collect::<LinkerResult<Vec<_>>>()?;

    let duplicates = duplicate_stop_ids(&stops);
    if !duplicates.is_empty() {
        return Err(LinkerError::DuplicateStops {
            page,
            ids: duplicates,
        });
    }

    Ok((stops, parsed.total))
}

/// Stop ids appearing more than once, sorted
pub fn duplicate_stop_ids(stops: &[BusStop]) -> Vec<String> {
    let mut seen = HashSet::new();
    let duplicates: BTreeSet<&str> = stops
        .iter()
        .map(|s| s.naptan_id.as_str())
        .filter(|id| !seen.insert(*id))
        .collect();
    duplicates.into_iter().map(str::to_string).collect()
}

/// Whether `page` (1-based) was the last one
pub fn is_last_page(page: u32, total: u64) -> bool {
    u64::from(page) * STOPS_PER_PAGE >= total
}

/// Store rows for one route section from its upstream sequence
///
/// Only the first ordered line route is used; the first line string is kept.
pub fn build_section(
    route: &Route,
    index: usize,
    sequence_document: &Value,
) -> LinkerResult<SectionWithStops> {
    let summary = &route.route_sections[index];
    let sequence: RouteSequence = parse_record("route sequence", sequence_document)?;

    if sequence.ordered_line_routes.len() > 1 {
        warn!(
            route_id = %route.id,
            section = %summary.name,
            segments = sequence.ordered_line_routes.len(),
            "Route {} ({}) has more than one route segment; using the first",
            route.id,
            summary.name
        );
    }

    let line_string = sequence.line_strings.first().map(String::as_str).unwrap_or("");
    let naptan_ids = sequence
        .ordered_line_routes
        .into_iter()
        .next()
        .map(|r| r.naptan_ids)
        .unwrap_or_default();

    Ok(SectionWithStops {
        section: summary.to_bus_route_section(&route.id, index, line_string),
        naptan_ids,
    })
}

/// Imports upstream transit data into the entity store
pub struct TransitImporter<'a, S: TransitSource + ?Sized> {
    source: &'a S,
    pool: &'a SqlitePool,
}

impl<'a, S: TransitSource + ?Sized> TransitImporter<'a, S> {
    pub fn new(source: &'a S, pool: &'a SqlitePool) -> Self {
        Self { source, pool }
    }

    /// Import stops, then routes
    pub async fn run(&self) -> LinkerResult<ImportReport> {
        let mut report = ImportReport::default();
        self.import_stops(&mut report).await?;
        self.import_routes(&mut report).await?;

        info!(
            stops = report.stops,
            routes = report.routes,
            sections = report.sections,
            "Import complete"
        );

        Ok(report)
    }

    /// Page through every bus stop, committing each page
    pub async fn import_stops(&self, report: &mut ImportReport) -> LinkerResult<()> {
        let mut page = 1u32;

        loop {
            info!(page, "Fetching stop page");
            let document = self.source.stop_points_page(page).await?;
            let (stops, total) = convert_stop_page(page, &document)?;

            report.stops += upsert_stops(self.pool, &stops).await?;
            report.stop_pages += 1;
            info!(page, stops = stops.len(), total, "Stop page stored");

            if is_last_page(page, total) {
                break;
            }
            page += 1;
        }

        Ok(())
    }

    /// Import every bus route with its sections, committing each route
    pub async fn import_routes(&self, report: &mut ImportReport) -> LinkerResult<()> {
        let documents = self.source.bus_routes().await?;
        info!(routes = documents.len(), "Fetched bus routes");

        for document in &documents {
            let route: Route = parse_record("route", document)?;

            let mut sections = Vec::with_capacity(route.route_sections.len());
            for (index, summary) in route.route_sections.iter().enumerate() {
                let sequence = self
                    .source
                    .route_sequence(&route.id, &summary.direction)
                    .await?;
                sections.push(build_section(&route, index, &sequence)?);
            }

            upsert_route(self.pool, &route.to_bus_route(), &sections).await?;

            report.routes += 1;
            report.sections += sections.len();
            report.section_stops += sections.iter().map(|s| s.naptan_ids.len()).sum::<usize>();
            info!(route_id = %route.id, sections = sections.len(), "Route stored");
        }

        Ok(())
    }
}
