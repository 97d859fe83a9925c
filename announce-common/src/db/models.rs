//! Database models
//!
//! Rows mirror the entity store tables one to one. The `audio_file` /
//! `*_likeliness` column pairs are the persisted link state: both NULL for an
//! unlinked facility, both set otherwise.

use serde::{Deserialize, Serialize};

/// Confidence value persisted for operator-confirmed links
pub const MANUAL_LINK_CONFIDENCE: i64 = 999;

/// A bus stop (`bus_stops` table)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct BusStop {
    pub naptan_id: String,
    pub indicator: Option<String>,
    pub stop_letter: Option<String>,
    pub stop_type: Option<String>,
    pub common_name: String,
    pub place_type: String,
    pub lat: f64,
    pub lon: f64,
    pub compass_direction: Option<String>,
    pub audio_file: Option<String>,
    pub audio_file_likeliness: Option<i64>,
}

/// A bus route (`bus_routes` table)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct BusRoute {
    pub id: String,
    pub route_name: String,
}

/// One direction/section of a bus route (`bus_route_sections` table)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct BusRouteSection {
    pub id: String,
    pub route_id: String,
    pub name: String,
    pub direction: String,
    pub origin_name: String,
    pub origin_audio_file: Option<String>,
    pub origin_audio_file_likeliness: Option<i64>,
    pub destination_name: String,
    pub destination_audio_file: Option<String>,
    pub destination_audio_file_likeliness: Option<i64>,
    pub origin_naptan_id: String,
    pub destination_naptan_id: String,
    pub line_strings: String,
}

/// Position of a stop within a route section (`bus_route_section_stops` table)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct BusRouteSectionStop {
    pub route_section_id: String,
    pub naptan_id: String,
    pub sequence: i64,
}
