//! Candidate Index
//!
//! The two recording collections a run matches against: stop announcements
//! and destination announcements. Both are snapshots taken once at the start
//! of a run and never change afterwards.

use crate::services::asset_scanner::{distinct_stems, AssetScanner, ScanError};
use crate::services::fuzzy_matcher::{token_sort_key, Candidate};
use std::borrow::Cow;
use std::fmt;
use std::path::Path;

/// Recording set a candidate belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CandidateClass {
    Stop,
    Destination,
}

impl fmt::Display for CandidateClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CandidateClass::Stop => write!(f, "stop"),
            CandidateClass::Destination => write!(f, "destination"),
        }
    }
}

/// One recording filename stem with its precomputed comparison key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateName {
    stem: String,
    class: CandidateClass,
    sort_key: String,
}

impl CandidateName {
    pub fn new(stem: impl Into<String>, class: CandidateClass) -> Self {
        let stem = stem.into();
        let sort_key = token_sort_key(&stem);
        Self {
            stem,
            class,
            sort_key,
        }
    }

    pub fn stem(&self) -> &str {
        &self.stem
    }

    pub fn class(&self) -> CandidateClass {
        self.class
    }
}

impl Candidate for CandidateName {
    fn text(&self) -> &str {
        &self.stem
    }

    fn sort_key(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.sort_key)
    }
}

/// Immutable per-run snapshot of both recording collections
#[derive(Debug, Clone, Default)]
pub struct CandidateIndex {
    stops: Vec<CandidateName>,
    destinations: Vec<CandidateName>,
}

impl CandidateIndex {
    /// Build from stems already enumerated elsewhere
    ///
    /// Order is preserved; duplicates are kept.
    pub fn new<S, D>(stops: S, destinations: D) -> Self
    where
        S: IntoIterator,
        S::Item: Into<String>,
        D: IntoIterator,
        D::Item: Into<String>,
    {
        Self {
            stops: stops
                .into_iter()
                .map(|stem| CandidateName::new(stem, CandidateClass::Stop))
                .collect(),
            destinations: destinations
                .into_iter()
                .map(|stem| CandidateName::new(stem, CandidateClass::Destination))
                .collect(),
        }
    }

    /// Scan the two recording directories
    pub fn from_directories(
        scanner: &AssetScanner,
        stops_dir: &Path,
        destinations_dir: &Path,
    ) -> Result<Self, ScanError> {
        let stops = scanner.scan(stops_dir)?;
        let destinations = scanner.scan(destinations_dir)?;

        tracing::info!(
            stops = stops.len(),
            distinct_stops = distinct_stems(&stops),
            destinations = destinations.len(),
            distinct_destinations = distinct_stems(&destinations),
            "Candidate recordings indexed"
        );

        Ok(Self::new(stops, destinations))
    }

    /// Candidates of one class, in enumeration order
    pub fn collection(&self, class: CandidateClass) -> &[CandidateName] {
        match class {
            CandidateClass::Stop => &self.stops,
            CandidateClass::Destination => &self.destinations,
        }
    }

    pub fn stops(&self) -> &[CandidateName] {
        &self.stops
    }

    pub fn destinations(&self) -> &[CandidateName] {
        &self.destinations
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty() && self.destinations.is_empty()
    }
}
