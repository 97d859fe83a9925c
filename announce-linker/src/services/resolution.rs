//! Resolution strategy
//!
//! A linking run is either automatic (fuzzy matching against the recording
//! snapshot) or interactive (operator answers, possibly scripted). Both write
//! through the same [`LinkRepository`] and report the same counters.

use crate::db::LinkRepository;
use crate::error::LinkerResult;
use crate::services::candidate_index::CandidateIndex;
use crate::services::fuzzy_matcher::FuzzyMatcher;
use crate::services::link_resolver::{LinkReport, LinkResolver};
use crate::services::manual_resolver::{ManualPrompt, ManualResolver};

/// How unlinked facilities get their recording
pub enum ResolutionMode<'a> {
    /// Fuzzy match against the candidate snapshot
    Automatic {
        index: &'a CandidateIndex,
        matcher: FuzzyMatcher,
    },
    /// Ask `prompt` for each facility, with per-pass answer caches
    Interactive {
        prompt: &'a mut dyn ManualPrompt,
        web_base: String,
    },
}

impl<'a> ResolutionMode<'a> {
    pub fn name(&self) -> &'static str {
        match self {
            ResolutionMode::Automatic { .. } => "automatic",
            ResolutionMode::Interactive { .. } => "interactive",
        }
    }

    /// Run one pass over every unlinked section end and stop
    pub async fn run<R>(self, repo: &mut R) -> LinkerResult<LinkReport>
    where
        R: LinkRepository + ?Sized,
    {
        tracing::info!(mode = self.name(), "Starting linking pass");
        match self {
            ResolutionMode::Automatic { index, matcher } => {
                LinkResolver::new(index, matcher).run(repo).await
            }
            ResolutionMode::Interactive { prompt, web_base } => {
                ManualResolver::new(prompt, web_base).run(repo).await
            }
        }
    }
}
