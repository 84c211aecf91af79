use std::sync::atomic::Ordering;

use super::code::CodeNormalizer;
use super::testing::{FakeBackend, QueryEvent};
use super::*;
use crate::config::ServiceConfig;

fn code(raw: &str) -> CatalogCode {
    CodeNormalizer::new(&[]).normalize(raw).expect("valid catalog code")
}

fn orchestrator(backend: FakeBackend) -> LookupOrchestrator<FakeBackend> {
    LookupOrchestrator::new(backend, &ServiceConfig::default())
}

#[tokio::test]
async fn resolve_derives_status_from_variant_then_bare_query() {
    let mut backend = FakeBackend::with_hits(&["ABC-001 -c", "DEF-002", "JKL-004"]);
    backend.failing.insert("JKL-004 -c".to_string());
    let lookup = orchestrator(backend);

    let codes = vec![
        code("ABC-001"),
        code("DEF-002"),
        code("GHI-003"),
        code("JKL-004"),
    ];
    let statuses = lookup.resolve(&codes, |_| {}).await;

    assert_eq!(
        statuses,
        vec![
            StatusResult::PresentWithVariant,
            StatusResult::PresentNoVariant,
            StatusResult::NotPresent,
            StatusResult::PresentNoVariant,
        ]
    );

    let queries = lookup_queries(&lookup);
    assert!(queries.contains(&"ABC-001 -c".to_string()));
    assert!(!queries.contains(&"ABC-001".to_string()));
    assert!(queries.contains(&"DEF-002 -c".to_string()));
    assert!(queries.contains(&"DEF-002".to_string()));
    assert_eq!(queries.len(), 7);
}

#[tokio::test]
async fn resolve_treats_failed_queries_as_absent() {
    let mut backend = FakeBackend::default();
    backend.failing.insert("ABC-001 -c".to_string());
    backend.failing.insert("ABC-001".to_string());
    let lookup = orchestrator(backend);

    let statuses = lookup.resolve(&[code("ABC-001")], |_| {}).await;
    assert_eq!(statuses, vec![StatusResult::NotPresent]);
}

#[tokio::test]
async fn resolve_runs_batches_sequentially_with_bounded_concurrency() {
    let codes = (101..=112)
        .map(|number| code(&format!("ABC-{number}")))
        .collect::<Vec<CatalogCode>>();
    let hits = codes
        .iter()
        .map(|code| format!("{code} -c"))
        .collect::<Vec<String>>();
    let hit_refs = hits.iter().map(String::as_str).collect::<Vec<&str>>();
    let lookup = orchestrator(FakeBackend::with_hits(&hit_refs));

    let mut progress = Vec::new();
    let statuses = lookup
        .resolve(&codes, |batch| progress.push(batch))
        .await;

    assert_eq!(statuses.len(), 12);
    assert!(
        statuses
            .iter()
            .all(|status| *status == StatusResult::PresentWithVariant)
    );
    assert_eq!(
        progress
            .iter()
            .map(|batch| (batch.batch_len, batch.completed))
            .collect::<Vec<(usize, usize)>>(),
        vec![(5, 5), (5, 10), (2, 12)]
    );
    assert!(progress.iter().all(|batch| batch.total == 12));
    assert_eq!(lookup.backend().max_in_flight.load(Ordering::SeqCst), 5);

    let batch_of = |query: &str| {
        codes
            .iter()
            .position(|code| query.starts_with(&code.to_string()))
            .map(|index| index / 5)
            .expect("query for a known code")
    };
    let order = lookup
        .backend()
        .events
        .lock()
        .expect("events lock")
        .iter()
        .map(|event| match event {
            QueryEvent::Started(query) | QueryEvent::Finished(query) => batch_of(query),
        })
        .collect::<Vec<usize>>();
    assert!(order.windows(2).all(|pair| pair[0] <= pair[1]));
}

#[tokio::test]
async fn resolve_preserves_input_order_for_duplicates() {
    let lookup = orchestrator(FakeBackend::with_hits(&["XYZ-004"]));
    let codes = vec![code("XYZ-004"), code("ABC-001"), code("XYZ-004")];

    let statuses = lookup.resolve(&codes, |_| {}).await;
    assert_eq!(
        statuses,
        vec![
            StatusResult::PresentNoVariant,
            StatusResult::NotPresent,
            StatusResult::PresentNoVariant,
        ]
    );
}

#[tokio::test]
async fn reachability_requires_successful_probe() {
    assert!(orchestrator(FakeBackend::default()).is_reachable().await);

    let unreachable = FakeBackend {
        unreachable: true,
        ..FakeBackend::default()
    };
    assert!(!orchestrator(unreachable).is_reachable().await);

    let failing = FakeBackend {
        probe_error: true,
        ..FakeBackend::default()
    };
    assert!(!orchestrator(failing).is_reachable().await);
}

fn lookup_queries(lookup: &LookupOrchestrator<FakeBackend>) -> Vec<String> {
    lookup.backend().queries()
}
