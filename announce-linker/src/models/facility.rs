//! Facilities and their audio links
//!
//! A facility is anything that needs an announcement recording: a bus stop,
//! or one end (origin / destination) of a route section. The link itself is
//! `Option<AudioLink>`, so "filename set but confidence missing" cannot be
//! represented.

use announce_common::db::{BusRouteSection, BusStop, MANUAL_LINK_CONFIDENCE};
use announce_common::{Error, Result};
use std::fmt;

/// How a link was established
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Confidence {
    /// Automatic fuzzy match with its similarity score (0-100)
    Matched(u8),
    /// Operator-confirmed link (persisted as 999)
    Manual,
}

impl Confidence {
    /// Value stored in the `*_likeliness` column
    pub fn as_db_value(self) -> i64 {
        match self {
            Confidence::Matched(score) => i64::from(score),
            Confidence::Manual => MANUAL_LINK_CONFIDENCE,
        }
    }

    /// Parse a stored `*_likeliness` value
    pub fn from_db_value(value: i64) -> Result<Self> {
        match value {
            MANUAL_LINK_CONFIDENCE => Ok(Confidence::Manual),
            0..=100 => Ok(Confidence::Matched(value as u8)),
            other => Err(Error::CorruptLink(format!(
                "likeliness {} is neither a score nor the manual marker",
                other
            ))),
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::Matched(score) => write!(f, "{}", score),
            Confidence::Manual => write!(f, "manual"),
        }
    }
}

/// Chosen announcement file for a facility
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioLink {
    /// Filename stem of the recording (no directory, no extension)
    pub filename: String,
    pub confidence: Confidence,
}

impl AudioLink {
    pub fn matched(filename: impl Into<String>, score: u8) -> Self {
        Self {
            filename: filename.into(),
            confidence: Confidence::Matched(score),
        }
    }

    pub fn manual(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            confidence: Confidence::Manual,
        }
    }

    /// Rebuild a link from its column pair
    ///
    /// Both NULL means unlinked. Exactly one NULL is a store integrity error.
    pub fn from_columns(filename: Option<&str>, likeliness: Option<i64>) -> Result<Option<Self>> {
        match (filename, likeliness) {
            (None, None) => Ok(None),
            (Some(filename), Some(value)) => Ok(Some(Self {
                filename: filename.to_string(),
                confidence: Confidence::from_db_value(value)?,
            })),
            (filename, likeliness) => Err(Error::CorruptLink(format!(
                "half-set audio link (filename={:?}, likeliness={:?})",
                filename, likeliness
            ))),
        }
    }
}

/// Which candidate collection is searched first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchRole {
    /// Route-section origin: destination recordings first, then stops
    Origin,
    /// Route-section destination and bare stops: stop recordings first, then destinations
    Destination,
}

/// Column pair a link decision is written to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LinkTarget {
    Stop { naptan_id: String },
    SectionOrigin { section_id: String },
    SectionDestination { section_id: String },
}

impl LinkTarget {
    /// Stable identifier of the owning entity
    pub fn entity_id(&self) -> &str {
        match self {
            LinkTarget::Stop { naptan_id } => naptan_id,
            LinkTarget::SectionOrigin { section_id }
            | LinkTarget::SectionDestination { section_id } => section_id,
        }
    }

    pub fn role(&self) -> SearchRole {
        match self {
            LinkTarget::SectionOrigin { .. } => SearchRole::Origin,
            LinkTarget::SectionDestination { .. } | LinkTarget::Stop { .. } => {
                SearchRole::Destination
            }
        }
    }
}

impl fmt::Display for LinkTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkTarget::Stop { naptan_id } => write!(f, "stop {}", naptan_id),
            LinkTarget::SectionOrigin { section_id } => write!(f, "origin of {}", section_id),
            LinkTarget::SectionDestination { section_id } => {
                write!(f, "destination of {}", section_id)
            }
        }
    }
}

/// A single link target with its raw display name and current link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Facility {
    pub target: LinkTarget,
    /// Raw display name as imported
    pub name: String,
    pub link: Option<AudioLink>,
}

impl Facility {
    pub fn is_linked(&self) -> bool {
        self.link.is_some()
    }

    /// Facility view of a stored bus stop
    pub fn from_stop(stop: &BusStop) -> Result<Self> {
        Ok(Self {
            target: LinkTarget::Stop {
                naptan_id: stop.naptan_id.clone(),
            },
            name: stop.common_name.clone(),
            link: AudioLink::from_columns(stop.audio_file.as_deref(), stop.audio_file_likeliness)?,
        })
    }

    /// Origin and destination facilities of a stored route section
    pub fn from_section(section: &BusRouteSection) -> Result<[Self; 2]> {
        let origin = Self {
            target: LinkTarget::SectionOrigin {
                section_id: section.id.clone(),
            },
            name: section.origin_name.clone(),
            link: AudioLink::from_columns(
                section.origin_audio_file.as_deref(),
                section.origin_audio_file_likeliness,
            )?,
        };
        let destination = Self {
            target: LinkTarget::SectionDestination {
                section_id: section.id.clone(),
            },
            name: section.destination_name.clone(),
            link: AudioLink::from_columns(
                section.destination_audio_file.as_deref(),
                section.destination_audio_file_likeliness,
            )?,
        };
        Ok([origin, destination])
    }
}
