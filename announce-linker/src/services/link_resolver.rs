//! Automatic link resolution
//!
//! For every facility still without a recording, normalize its name and
//! search the two candidate collections in role order:
//!
//! | Facility                    | First searched | Fallback     |
//! |-----------------------------|----------------|--------------|
//! | Route-section origin        | destinations   | stops        |
//! | Route-section destination   | stops          | destinations |
//! | Bus stop                    | stops          | destinations |
//!
//! A facility nothing matches confidently is written back as "no link" and
//! reported with a warning; the pass carries on.

use crate::db::LinkRepository;
use crate::error::LinkerResult;
use crate::models::{AudioLink, Facility, SearchRole};
use crate::services::candidate_index::{CandidateClass, CandidateIndex};
use crate::services::fuzzy_matcher::FuzzyMatcher;
use crate::services::name_normalizer::normalize;
use announce_common::db::{BusRouteSection, BusStop};
use tracing::{debug, info, warn};

/// Collection search order for a role
pub fn search_order(role: SearchRole) -> [CandidateClass; 2] {
    match role {
        SearchRole::Origin => [CandidateClass::Destination, CandidateClass::Stop],
        SearchRole::Destination => [CandidateClass::Stop, CandidateClass::Destination],
    }
}

/// Result of resolving one facility
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    /// Confident match found in `class`
    Matched {
        link: AudioLink,
        class: CandidateClass,
    },
    /// No candidate reached the threshold in either collection
    Unmatched,
}

/// Resolution of one facility together with the name that was searched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkDecision {
    pub normalized_name: String,
    pub outcome: LinkOutcome,
}

/// Counters for one phase (sections or stops) of a pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseReport {
    /// Targets that received a link
    pub linked: usize,
    /// Targets left without a link
    pub unresolved: usize,
    /// Links taken from the operator answer cache (manual pass only)
    pub reused: usize,
    /// Decisions written to the store
    pub committed: usize,
}

impl PhaseReport {
    pub fn visited(&self) -> usize {
        self.linked + self.unresolved
    }
}

/// Outcome of a full pass over sections and stops
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkReport {
    pub sections: PhaseReport,
    pub stops: PhaseReport,
}

impl LinkReport {
    pub fn linked(&self) -> usize {
        self.sections.linked + self.stops.linked
    }

    pub fn unresolved(&self) -> usize {
        self.sections.unresolved + self.stops.unresolved
    }
}

/// Automatic resolver over one candidate snapshot
pub struct LinkResolver<'a> {
    index: &'a CandidateIndex,
    matcher: FuzzyMatcher,
}

impl<'a> LinkResolver<'a> {
    pub fn new(index: &'a CandidateIndex, matcher: FuzzyMatcher) -> Self {
        Self { index, matcher }
    }

    /// Search for an already normalized name in role order
    ///
    /// The fallback collection is only searched when the first one has no
    /// confident match.
    pub fn find(&self, normalized_name: &str, role: SearchRole) -> LinkOutcome {
        for class in search_order(role) {
            let candidates = self.index.collection(class);
            if let Some(found) = self.matcher.best_match(normalized_name, candidates) {
                return LinkOutcome::Matched {
                    link: AudioLink::matched(found.candidate, found.score),
                    class,
                };
            }
        }
        LinkOutcome::Unmatched
    }

    /// Normalize and resolve one facility
    pub fn resolve(&self, facility: &Facility) -> LinkDecision {
        let normalized_name = normalize(&facility.name);
        let outcome = self.find(&normalized_name, facility.target.role());
        LinkDecision {
            normalized_name,
            outcome,
        }
    }

    /// Run the automatic pass: every unresolved section, then every
    /// unresolved stop, committing after each phase
    pub async fn run<R>(&self, repo: &mut R) -> LinkerResult<LinkReport>
    where
        R: LinkRepository + ?Sized,
    {
        let mut report = LinkReport::default();

        let sections = repo.unresolved_sections().await?;
        info!(count = sections.len(), "Resolving route sections");
        report.sections = self.resolve_sections(repo, &sections)?;
        report.sections.committed = repo.commit().await?;

        let stops = repo.unresolved_stops().await?;
        info!(count = stops.len(), "Resolving stops");
        report.stops = self.resolve_stops(repo, &stops)?;
        report.stops.committed = repo.commit().await?;

        info!(
            linked = report.linked(),
            unresolved = report.unresolved(),
            "Automatic linking complete"
        );

        Ok(report)
    }

    fn resolve_sections<R>(
        &self,
        repo: &mut R,
        sections: &[BusRouteSection],
    ) -> LinkerResult<PhaseReport>
    where
        R: LinkRepository + ?Sized,
    {
        let mut phase = PhaseReport::default();
        for section in sections {
            for facility in Facility::from_section(section)? {
                // A section is unresolved if either end is; keep the linked end
                if facility.is_linked() {
                    continue;
                }
                self.apply(repo, &facility, &mut phase);
            }
        }
        Ok(phase)
    }

    fn resolve_stops<R>(&self, repo: &mut R, stops: &[BusStop]) -> LinkerResult<PhaseReport>
    where
        R: LinkRepository + ?Sized,
    {
        let mut phase = PhaseReport::default();
        for stop in stops {
            let facility = Facility::from_stop(stop)?;
            if facility.is_linked() {
                continue;
            }
            self.apply(repo, &facility, &mut phase);
        }
        Ok(phase)
    }

    fn apply<R>(&self, repo: &mut R, facility: &Facility, phase: &mut PhaseReport)
    where
        R: LinkRepository + ?Sized,
    {
        let decision = self.resolve(facility);
        match decision.outcome {
            LinkOutcome::Matched { link, class } => {
                debug!(
                    target_id = %facility.target,
                    name = %decision.normalized_name,
                    file = %link.filename,
                    score = %link.confidence,
                    %class,
                    "Linked"
                );
                repo.set_link(&facility.target, Some(&link));
                phase.linked += 1;
            }
            LinkOutcome::Unmatched => {
                warn!(
                    entity_id = %facility.target.entity_id(),
                    name = %decision.normalized_name,
                    "No confident match for {}", facility.target
                );
                repo.set_link(&facility.target, None);
                phase.unresolved += 1;
            }
        }
    }
}
