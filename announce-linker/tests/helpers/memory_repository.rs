//! In-memory LinkRepository
//!
//! Applies committed decisions to its own rows and records every commit, so
//! tests can check what was written and when.

use announce_common::db::{BusRouteSection, BusStop};
use announce_linker::db::LinkRepository;
use announce_linker::models::{AudioLink, LinkTarget};
use announce_linker::LinkerResult;
use async_trait::async_trait;

#[derive(Debug, Default)]
pub struct MemoryRepository {
    pub sections: Vec<BusRouteSection>,
    pub stops: Vec<BusStop>,
    pending: Vec<(LinkTarget, Option<AudioLink>)>,
    /// Decisions written by each commit call, in order
    pub commits: Vec<Vec<LinkTarget>>,
}

pub fn stop(naptan_id: &str, common_name: &str) -> BusStop {
    BusStop {
        naptan_id: naptan_id.to_string(),
        indicator: None,
        stop_letter: None,
        stop_type: None,
        common_name: common_name.to_string(),
        place_type: "StopPoint".to_string(),
        lat: 51.5,
        lon: -0.1,
        compass_direction: None,
        audio_file: None,
        audio_file_likeliness: None,
    }
}

pub fn section(id: &str, origin_name: &str, destination_name: &str) -> BusRouteSection {
    BusRouteSection {
        id: id.to_string(),
        route_id: id.split('_').next().unwrap_or(id).to_string(),
        name: format!("{} - {}", origin_name, destination_name),
        direction: "outbound".to_string(),
        origin_name: origin_name.to_string(),
        origin_audio_file: None,
        origin_audio_file_likeliness: None,
        destination_name: destination_name.to_string(),
        destination_audio_file: None,
        destination_audio_file_likeliness: None,
        origin_naptan_id: "O".to_string(),
        destination_naptan_id: "D".to_string(),
        line_strings: String::new(),
    }
}

impl MemoryRepository {
    pub fn new(sections: Vec<BusRouteSection>, stops: Vec<BusStop>) -> Self {
        Self {
            sections,
            stops,
            ..Self::default()
        }
    }

    /// Committed decisions flattened, in commit order
    pub fn written(&self) -> Vec<LinkTarget> {
        self.commits.iter().flatten().cloned().collect()
    }

    fn apply(&mut self, target: &LinkTarget, link: Option<&AudioLink>) {
        let file = link.map(|l| l.filename.clone());
        let score = link.map(|l| l.confidence.as_db_value());
        match target {
            LinkTarget::Stop { naptan_id } => {
                if let Some(stop) = self.stops.iter_mut().find(|s| &s.naptan_id == naptan_id) {
                    stop.audio_file = file;
                    stop.audio_file_likeliness = score;
                }
            }
            LinkTarget::SectionOrigin { section_id } => {
                if let Some(section) = self.sections.iter_mut().find(|s| &s.id == section_id) {
                    section.origin_audio_file = file;
                    section.origin_audio_file_likeliness = score;
                }
            }
            LinkTarget::SectionDestination { section_id } => {
                if let Some(section) = self.sections.iter_mut().find(|s| &s.id == section_id) {
                    section.destination_audio_file = file;
                    section.destination_audio_file_likeliness = score;
                }
            }
        }
    }
}

#[async_trait]
impl LinkRepository for MemoryRepository {
    async fn unresolved_sections(&mut self) -> LinkerResult<Vec<BusRouteSection>> {
        Ok(self
            .sections
            .iter()
            .filter(|s| s.origin_audio_file.is_none() || s.destination_audio_file.is_none())
            .cloned()
            .collect())
    }

    async fn unresolved_stops(&mut self) -> LinkerResult<Vec<BusStop>> {
        Ok(self
            .stops
            .iter()
            .filter(|s| s.audio_file.is_none())
            .cloned()
            .collect())
    }

    fn set_link(&mut self, target: &LinkTarget, link: Option<&AudioLink>) {
        self.pending.push((target.clone(), link.cloned()));
    }

    async fn commit(&mut self) -> LinkerResult<usize> {
        let pending = std::mem::take(&mut self.pending);
        for (target, link) in &pending {
            self.apply(target, link.as_ref());
        }
        let written: Vec<LinkTarget> = pending.into_iter().map(|(t, _)| t).collect();
        let count = written.len();
        self.commits.push(written);
        Ok(count)
    }
}
