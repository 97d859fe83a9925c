//! Manual linking workflow tests
//!
//! Operator answers come from `ScriptedPrompt`, so the full pass runs
//! unattended.

mod helpers;

use announce_linker::db::SqliteLinkRepository;
use announce_linker::models::LinkTarget;
use announce_linker::services::manual_resolver::DEFAULT_WEB_BASE;
use announce_linker::services::{ManualResolver, ResolutionMode, ScriptedPrompt};
use helpers::memory_repository::{section, stop};
use helpers::{create_test_pool, section_links, seed_section, seed_stop, set_stop_link, stop_link, MemoryRepository};

#[tokio::test]
async fn test_sibling_stops_asked_once() {
    let pool = create_test_pool().await;
    seed_stop(&pool, "490000001A", "Angel").await;
    seed_stop(&pool, "490000001B", "Angel").await;

    let mut prompt = ScriptedPrompt::queued(["Angel"]);
    let mut repo = SqliteLinkRepository::new(pool.clone());
    let report = ResolutionMode::Interactive {
        prompt: &mut prompt,
        web_base: DEFAULT_WEB_BASE.to_string(),
    }
    .run(&mut repo)
    .await
    .unwrap();

    assert_eq!(prompt.asked().len(), 1);
    assert_eq!(prompt.asked()[0].cache_key, "490000001");
    assert_eq!(report.stops.linked, 2);
    assert_eq!(report.stops.reused, 1);

    for id in ["490000001A", "490000001B"] {
        assert_eq!(stop_link(&pool, id).await, (Some("Angel".to_string()), Some(999)));
    }
}

#[tokio::test]
async fn test_commit_after_every_target() {
    let mut repo = MemoryRepository::new(
        vec![section("4_outbound_0", "Archway", "Angel")],
        vec![stop("490000001A", "Angel"), stop("490000002B", "Bank")],
    );
    let mut prompt = ScriptedPrompt::queued(["Archway", "", "Angel", "Bank"]);

    ManualResolver::new(&mut prompt, DEFAULT_WEB_BASE)
        .run(&mut repo)
        .await
        .unwrap();

    // Four targets, four commits; the skipped one wrote nothing
    assert_eq!(repo.commits.len(), 4);
    assert_eq!(
        repo.commits.iter().map(Vec::len).collect::<Vec<_>>(),
        vec![1, 0, 1, 1]
    );
}

#[tokio::test]
async fn test_questions_follow_section_then_stop_order() {
    let mut repo = MemoryRepository::new(
        vec![
            section("4_outbound_0", "Archway", "Angel"),
            section("19_inbound_0", "Finsbury Pk", "Battersea"),
        ],
        vec![stop("490000002B", "Bank")],
    );
    let mut prompt = ScriptedPrompt::default();

    ManualResolver::new(&mut prompt, DEFAULT_WEB_BASE)
        .run(&mut repo)
        .await
        .unwrap();

    let targets: Vec<LinkTarget> = prompt.asked().iter().map(|r| r.target.clone()).collect();
    assert_eq!(
        targets,
        vec![
            LinkTarget::SectionOrigin { section_id: "4_outbound_0".to_string() },
            LinkTarget::SectionDestination { section_id: "4_outbound_0".to_string() },
            LinkTarget::SectionOrigin { section_id: "19_inbound_0".to_string() },
            LinkTarget::SectionDestination { section_id: "19_inbound_0".to_string() },
            LinkTarget::Stop { naptan_id: "490000002B".to_string() },
        ]
    );
    assert_eq!(prompt.asked()[2].name, "Finsbury Park");
    assert_eq!(
        prompt.asked()[0].lookup_url,
        "https://tfl.gov.uk/bus/route/4?direction=outbound"
    );
    assert_eq!(prompt.asked()[4].lookup_url, "https://tfl.gov.uk/bus/stop/490000002B");

    // Every answer was empty: nothing linked
    assert!(repo.written().is_empty());
}

#[tokio::test]
async fn test_skipped_name_is_asked_again() {
    let pool = create_test_pool().await;
    seed_section(&pool, "1_outbound_0", "1", "Bank", "Angel").await;
    seed_section(&pool, "2_outbound_0", "2", "Bank", "Angel").await;

    // Bank skipped, Angel answered, Bank answered on second sight, Angel cached
    let mut prompt = ScriptedPrompt::queued(["", "Angel", "Bank"]);
    let mut repo = SqliteLinkRepository::new(pool.clone());
    let report = ManualResolver::new(&mut prompt, DEFAULT_WEB_BASE)
        .run(&mut repo)
        .await
        .unwrap();

    assert_eq!(prompt.asked().len(), 3);
    assert_eq!(report.sections.linked, 3);
    assert_eq!(report.sections.reused, 1);
    assert_eq!(report.sections.unresolved, 1);

    let (origin_1, destination_1) = section_links(&pool, "1_outbound_0").await;
    assert_eq!(origin_1, (None, None));
    assert_eq!(destination_1, (Some("Angel".to_string()), Some(999)));

    let (origin_2, destination_2) = section_links(&pool, "2_outbound_0").await;
    assert_eq!(origin_2, (Some("Bank".to_string()), Some(999)));
    assert_eq!(destination_2, (Some("Angel".to_string()), Some(999)));
}

#[tokio::test]
async fn test_linked_stops_not_asked() {
    let pool = create_test_pool().await;
    seed_stop(&pool, "490000001A", "Angel").await;
    seed_stop(&pool, "490000002B", "Bank").await;
    set_stop_link(&pool, "490000001A", "Angel", 100).await;

    let mut prompt = ScriptedPrompt::with_answers([("490000002", "Bank")]);
    let mut repo = SqliteLinkRepository::new(pool.clone());
    ManualResolver::new(&mut prompt, DEFAULT_WEB_BASE)
        .run(&mut repo)
        .await
        .unwrap();

    assert_eq!(prompt.asked().len(), 1);
    assert_eq!(stop_link(&pool, "490000001A").await, (Some("Angel".to_string()), Some(100)));
    assert_eq!(stop_link(&pool, "490000002B").await, (Some("Bank".to_string()), Some(999)));
}

#[tokio::test]
async fn test_caches_do_not_outlive_pass() {
    let mut repo = MemoryRepository::new(vec![], vec![stop("490000001A", "Angel")]);

    let mut first = ScriptedPrompt::default();
    ManualResolver::new(&mut first, DEFAULT_WEB_BASE)
        .run(&mut repo)
        .await
        .unwrap();

    // Skipped last time, so asked again on a fresh pass
    let mut second = ScriptedPrompt::queued(["Angel"]);
    ManualResolver::new(&mut second, DEFAULT_WEB_BASE)
        .run(&mut repo)
        .await
        .unwrap();

    assert_eq!(first.asked().len(), 1);
    assert_eq!(second.asked().len(), 1);
    assert_eq!(repo.stops[0].audio_file.as_deref(), Some("Angel"));
}
