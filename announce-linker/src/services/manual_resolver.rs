//! Manual link resolution
//!
//! Walks every facility the automatic pass left unlinked and asks the
//! operator for a recording filename. Answers are remembered for the rest of
//! the pass, so a name that appears on many sections (or a stop id shared
//! by both sides of the road) is only asked once. Every decision is committed
//! before the next question, so an interrupted session loses nothing.

use crate::db::LinkRepository;
use crate::error::{LinkerError, LinkerResult};
use crate::models::{AudioLink, Facility, LinkTarget};
use crate::services::link_resolver::{LinkReport, PhaseReport};
use crate::services::name_normalizer::normalize;
use announce_common::db::BusRouteSection;
use serde::Deserialize;
use std::collections::{HashMap, VecDeque};
use std::io::{BufRead, Write};
use std::path::Path;
use tracing::{debug, info};

/// Default base URL for operator lookup pages
pub const DEFAULT_WEB_BASE: &str = "https://tfl.gov.uk";

/// Question put to the operator for one facility
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualRequest {
    pub target: LinkTarget,
    /// Normalized facility name
    pub name: String,
    /// Page showing the facility on the network map
    pub lookup_url: String,
    /// Key the answer is cached under
    pub cache_key: String,
}

/// Source of operator answers
///
/// An empty answer means "skip this facility".
pub trait ManualPrompt {
    fn ask(&mut self, request: &ManualRequest) -> LinkerResult<String>;
}

/// Interactive prompt on a terminal (or any reader/writer pair)
pub struct TerminalPrompt<R, W> {
    input: R,
    output: W,
}

impl TerminalPrompt<std::io::StdinLock<'static>, std::io::Stdout> {
    /// Prompt on the process's stdin/stdout
    pub fn stdio() -> Self {
        Self::new(std::io::stdin().lock(), std::io::stdout())
    }
}

impl<R: BufRead, W: Write> TerminalPrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> ManualPrompt for TerminalPrompt<R, W> {
    fn ask(&mut self, request: &ManualRequest) -> LinkerResult<String> {
        write!(
            self.output,
            "{} - Enter the filename for {}: ",
            request.lookup_url, request.name
        )?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(LinkerError::InputClosed);
        }
        Ok(line.trim().to_string())
    }
}

/// Answers file for unattended manual passes
///
/// ```toml
/// [answers]
/// "Highbury & Islington Station" = "Highbury And Islington Station"
/// "490000001" = "Angel"
/// ```
#[derive(Debug, Default, Deserialize)]
struct AnswersFile {
    #[serde(default)]
    answers: HashMap<String, String>,
}

/// Predetermined answers, for batch runs and tests
///
/// Answers are looked up by cache key first; otherwise the next queued
/// answer is used; otherwise the facility is skipped. Every request is
/// recorded.
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    by_key: HashMap<String, String>,
    queue: VecDeque<String>,
    asked: Vec<ManualRequest>,
}

impl ScriptedPrompt {
    /// Answers keyed by cache key (normalized name, or stop id without suffix)
    pub fn with_answers<I, K, V>(answers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            by_key: answers
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            ..Self::default()
        }
    }

    /// Answers given in order, regardless of the question
    pub fn queued<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            queue: answers.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Load keyed answers from a TOML answers file
    pub fn from_toml_file(path: &Path) -> LinkerResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let file: AnswersFile = toml::from_str(&content).map_err(|e| {
            announce_common::Error::Config(format!(
                "Failed to parse answers file {}: {}",
                path.display(),
                e
            ))
        })?;
        info!(
            path = %path.display(),
            answers = file.answers.len(),
            "Loaded manual answers"
        );
        Ok(Self::with_answers(file.answers))
    }

    /// Requests seen so far, in order
    pub fn asked(&self) -> &[ManualRequest] {
        &self.asked
    }
}

impl ManualPrompt for ScriptedPrompt {
    fn ask(&mut self, request: &ManualRequest) -> LinkerResult<String> {
        self.asked.push(request.clone());
        let answer = self
            .by_key
            .get(&request.cache_key)
            .cloned()
            .or_else(|| self.queue.pop_front())
            .unwrap_or_default();
        Ok(answer)
    }
}

/// Result of manually resolving one facility
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManualOutcome {
    /// Answer reused from earlier in the pass
    Cached(AudioLink),
    /// Operator answered
    Answered(AudioLink),
    /// Operator gave an empty answer
    Skipped,
}

/// Operator answers remembered for one pass
#[derive(Debug, Default)]
pub struct AutocompleteCache {
    entries: HashMap<String, String>,
}

impl AutocompleteCache {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, filename: impl Into<String>) {
        self.entries.insert(key.into(), filename.into());
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Cache key for a stop: the stop id without a trailing stop letter
///
/// `490000001A` and `490000001B` are the two sides of the same road and share
/// an announcement.
pub fn stop_cache_key(naptan_id: &str) -> &str {
    match naptan_id.chars().last() {
        Some(c) if c.is_ascii_alphabetic() => &naptan_id[..naptan_id.len() - 1],
        _ => naptan_id,
    }
}

/// Operator lookup page for a route section
pub fn section_lookup_url(web_base: &str, section: &BusRouteSection) -> String {
    format!(
        "{}/bus/route/{}?direction={}",
        web_base.trim_end_matches('/'),
        section.route_id,
        section.direction
    )
}

/// Operator lookup page for a stop
pub fn stop_lookup_url(web_base: &str, naptan_id: &str) -> String {
    format!("{}/bus/stop/{}", web_base.trim_end_matches('/'), naptan_id)
}

/// Interactive resolver for one manual pass
pub struct ManualResolver<'p> {
    prompt: &'p mut dyn ManualPrompt,
    web_base: String,
    endpoint_cache: AutocompleteCache,
    stop_cache: AutocompleteCache,
}

impl<'p> ManualResolver<'p> {
    pub fn new(prompt: &'p mut dyn ManualPrompt, web_base: impl Into<String>) -> Self {
        Self {
            prompt,
            web_base: web_base.into(),
            endpoint_cache: AutocompleteCache::default(),
            stop_cache: AutocompleteCache::default(),
        }
    }

    /// Run the manual pass: every unlinked section end (origin, then
    /// destination), then every unlinked stop
    ///
    /// Consumes the resolver; caches do not outlive the pass.
    pub async fn run<R>(mut self, repo: &mut R) -> LinkerResult<LinkReport>
    where
        R: LinkRepository + ?Sized,
    {
        let mut report = LinkReport::default();

        let sections = repo.unresolved_sections().await?;
        info!(count = sections.len(), "Manual pass over route sections");
        for section in &sections {
            let lookup_url = section_lookup_url(&self.web_base, section);
            for facility in Facility::from_section(section)? {
                if facility.is_linked() {
                    continue;
                }
                let outcome = self.resolve_endpoint(&facility, &lookup_url)?;
                self.stage(repo, &facility, outcome, &mut report.sections);
                report.sections.committed += repo.commit().await?;
            }
        }

        let stops = repo.unresolved_stops().await?;
        info!(count = stops.len(), "Manual pass over stops");
        for stop in &stops {
            let facility = Facility::from_stop(stop)?;
            if facility.is_linked() {
                continue;
            }
            let outcome = self.resolve_stop(&facility, &stop.naptan_id)?;
            self.stage(repo, &facility, outcome, &mut report.stops);
            report.stops.committed += repo.commit().await?;
        }

        info!(
            linked = report.linked(),
            reused = report.sections.reused + report.stops.reused,
            skipped = report.unresolved(),
            remembered_endpoints = self.endpoint_cache.len(),
            remembered_stops = self.stop_cache.len(),
            "Manual linking complete"
        );

        Ok(report)
    }

    /// Resolve a route-section origin or destination
    pub fn resolve_endpoint(
        &mut self,
        facility: &Facility,
        lookup_url: &str,
    ) -> LinkerResult<ManualOutcome> {
        let name = normalize(&facility.name);
        let request = ManualRequest {
            target: facility.target.clone(),
            cache_key: name.clone(),
            name,
            lookup_url: lookup_url.to_string(),
        };
        resolve_with_cache(&mut *self.prompt, &mut self.endpoint_cache, request)
    }

    /// Resolve a bus stop
    pub fn resolve_stop(
        &mut self,
        facility: &Facility,
        naptan_id: &str,
    ) -> LinkerResult<ManualOutcome> {
        let request = ManualRequest {
            target: facility.target.clone(),
            name: normalize(&facility.name),
            lookup_url: stop_lookup_url(&self.web_base, naptan_id),
            cache_key: stop_cache_key(naptan_id).to_string(),
        };
        resolve_with_cache(&mut *self.prompt, &mut self.stop_cache, request)
    }

    fn stage<R>(
        &self,
        repo: &mut R,
        facility: &Facility,
        outcome: ManualOutcome,
        phase: &mut PhaseReport,
    ) where
        R: LinkRepository + ?Sized,
    {
        match outcome {
            ManualOutcome::Cached(link) => {
                repo.set_link(&facility.target, Some(&link));
                phase.linked += 1;
                phase.reused += 1;
            }
            ManualOutcome::Answered(link) => {
                repo.set_link(&facility.target, Some(&link));
                phase.linked += 1;
            }
            ManualOutcome::Skipped => {
                phase.unresolved += 1;
            }
        }
    }
}

fn resolve_with_cache(
    prompt: &mut dyn ManualPrompt,
    cache: &mut AutocompleteCache,
    request: ManualRequest,
) -> LinkerResult<ManualOutcome> {
    if let Some(filename) = cache.get(&request.cache_key) {
        debug!(target_id = %request.target, file = %filename, "Reusing earlier answer");
        return Ok(ManualOutcome::Cached(AudioLink::manual(filename)));
    }

    let answer = prompt.ask(&request)?;
    if answer.is_empty() {
        debug!(target_id = %request.target, "Skipped by operator");
        return Ok(ManualOutcome::Skipped);
    }

    cache.insert(request.cache_key, answer.clone());
    Ok(ManualOutcome::Answered(AudioLink::manual(answer)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn stop(naptan_id: &str, name: &str) -> Facility {
        Facility {
            target: LinkTarget::Stop {
                naptan_id: naptan_id.to_string(),
            },
            name: name.to_string(),
            link: None,
        }
    }

    fn origin(section_id: &str, name: &str) -> Facility {
        Facility {
            target: LinkTarget::SectionOrigin {
                section_id: section_id.to_string(),
            },
            name: name.to_string(),
            link: None,
        }
    }

    #[test]
    fn test_stop_cache_key_strips_one_letter() {
        assert_eq!(stop_cache_key("490000001A"), "490000001");
        assert_eq!(stop_cache_key("490000001B"), "490000001");
        assert_eq!(stop_cache_key("490000001"), "490000001");
        assert_eq!(stop_cache_key("4900000ZZ"), "4900000Z");
        assert_eq!(stop_cache_key(""), "");
    }

    #[test]
    fn test_lookup_urls() {
        assert_eq!(
            stop_lookup_url("https://tfl.gov.uk/", "490000001A"),
            "https://tfl.gov.uk/bus/stop/490000001A"
        );
    }

    #[test]
    fn test_sibling_stops_share_answer() {
        let mut prompt = ScriptedPrompt::queued(["Angel"]);
        let mut resolver = ManualResolver::new(&mut prompt, DEFAULT_WEB_BASE);

        let first = resolver.resolve_stop(&stop("490000001A", "Angel"), "490000001A").unwrap();
        let second = resolver.resolve_stop(&stop("490000001B", "Angel Stn"), "490000001B").unwrap();

        assert_eq!(first, ManualOutcome::Answered(AudioLink::manual("Angel")));
        assert_eq!(second, ManualOutcome::Cached(AudioLink::manual("Angel")));
        assert_eq!(resolver.stop_cache.len(), 1);
        assert_eq!(resolver.endpoint_cache.len(), 0);
        drop(resolver);
        assert_eq!(prompt.asked().len(), 1);
        assert_eq!(prompt.asked()[0].cache_key, "490000001");
    }

    #[test]
    fn test_empty_answer_is_not_cached() {
        let mut prompt = ScriptedPrompt::queued(["", "Bank"]);
        let mut resolver = ManualResolver::new(&mut prompt, DEFAULT_WEB_BASE);

        let first = resolver.resolve_endpoint(&origin("1_outbound_0", "Bank"), "url").unwrap();
        let second = resolver.resolve_endpoint(&origin("2_outbound_0", "Bank"), "url").unwrap();

        assert_eq!(first, ManualOutcome::Skipped);
        assert_eq!(second, ManualOutcome::Answered(AudioLink::manual("Bank")));
        assert_eq!(resolver.endpoint_cache.len(), 1);
        drop(resolver);
        assert_eq!(prompt.asked().len(), 2);
    }

    #[test]
    fn test_endpoint_cache_keyed_by_normalized_name() {
        let mut prompt = ScriptedPrompt::with_answers([("Finsbury Park Station", "Finsbury Park")]);
        let mut resolver = ManualResolver::new(&mut prompt, DEFAULT_WEB_BASE);

        resolver.resolve_endpoint(&origin("4_outbound_0", "Finsbury Pk Stn"), "url").unwrap();
        let again = resolver
            .resolve_endpoint(&origin("19_outbound_0", "Finsbury Park Station"), "url")
            .unwrap();

        assert_eq!(again, ManualOutcome::Cached(AudioLink::manual("Finsbury Park")));
    }

    #[test]
    fn test_stop_and_endpoint_caches_are_separate() {
        let mut prompt = ScriptedPrompt::queued(["Angel", "Angel Station"]);
        let mut resolver = ManualResolver::new(&mut prompt, DEFAULT_WEB_BASE);

        resolver.resolve_endpoint(&origin("1_outbound_0", "Angel"), "url").unwrap();
        let stop_outcome = resolver.resolve_stop(&stop("490000001A", "Angel"), "490000001A").unwrap();

        assert_eq!(
            stop_outcome,
            ManualOutcome::Answered(AudioLink::manual("Angel Station"))
        );
    }

    #[test]
    fn test_terminal_prompt_reads_trimmed_line() {
        let mut output = Vec::new();
        let mut prompt = TerminalPrompt::new(Cursor::new("Angel Station\n"), &mut output);
        let request = ManualRequest {
            target: LinkTarget::Stop {
                naptan_id: "490000001A".to_string(),
            },
            name: "Angel".to_string(),
            lookup_url: "https://tfl.gov.uk/bus/stop/490000001A".to_string(),
            cache_key: "490000001".to_string(),
        };

        assert_eq!(prompt.ask(&request).unwrap(), "Angel Station");
        assert!(matches!(prompt.ask(&request), Err(LinkerError::InputClosed)));
        drop(prompt);

        let shown = String::from_utf8(output).unwrap();
        assert!(shown.starts_with(
            "https://tfl.gov.uk/bus/stop/490000001A - Enter the filename for Angel: "
        ));
    }

    #[test]
    fn test_answers_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("answers.toml");
        std::fs::write(
            &path,
            "[answers]\n\"490000001\" = \"Angel\"\n\"Bank Station\" = \"Bank\"\n",
        )
        .unwrap();

        let mut prompt = ScriptedPrompt::from_toml_file(&path).unwrap();
        let mut resolver = ManualResolver::new(&mut prompt, DEFAULT_WEB_BASE);
        let outcome = resolver.resolve_stop(&stop("490000001C", "Angel"), "490000001C").unwrap();
        assert_eq!(outcome, ManualOutcome::Answered(AudioLink::manual("Angel")));

        std::fs::write(&path, "answers = 3").unwrap();
        assert!(ScriptedPrompt::from_toml_file(&path).is_err());
    }
}
