//! Linking and import services

pub mod asset_scanner;
pub mod candidate_index;
pub mod fuzzy_matcher;
pub mod link_resolver;
pub mod manual_resolver;
pub mod name_normalizer;
pub mod resolution;
pub mod tfl_client;
pub mod transit_importer;

pub use asset_scanner::{AssetScanner, ScanError};
pub use candidate_index::{CandidateClass, CandidateIndex, CandidateName};
pub use fuzzy_matcher::{best_match, token_sort_ratio, FuzzyMatcher, MatchResult, DEFAULT_MIN_SCORE};
pub use link_resolver::{LinkDecision, LinkOutcome, LinkReport, LinkResolver, PhaseReport};
pub use manual_resolver::{
    ManualOutcome, ManualPrompt, ManualRequest, ManualResolver, ScriptedPrompt, TerminalPrompt,
};
pub use name_normalizer::normalize;
pub use resolution::ResolutionMode;
pub use tfl_client::{TflClient, TflSettings, TransitSource};
pub use transit_importer::{ImportReport, TransitImporter};
