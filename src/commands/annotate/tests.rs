use anyhow::anyhow;

use super::*;
use crate::catalog::testing::FakeBackend;
use crate::catalog::{LookupOrchestrator, PageDocument, StatusResult, first_seen, render_page};
use crate::config::CheckerConfig;
use crate::model::ContainerOutcome;

const HASH: &str = "0123456789abcdef0123456789abcdef01234567";
const WITH_VARIANT: &str =
    "【是否存在】：<span style=\"color: #008000; font-weight: bold;\">存在中文版本</span>";
const NOT_PRESENT: &str =
    "【是否存在】：<span style=\"color: #ff0000; font-weight: bold;\">不存在</span>";

fn separator() -> String {
    format!("<br>{}<br>", "=".repeat(29))
}

fn magnet() -> String {
    format!("magnet:?xt=urn:btih:{HASH}")
}

fn post_html() -> String {
    format!(
        "<html><body><div id=\"read_tpc\">Title A<br>ABC-123<br>=====<br>Title B<br>XYZ-004<br>\
         <a href=\"{}\">XYZ-004 magnet</a></div></body></html>",
        magnet()
    )
}

fn parse(source: &str, config: &CheckerConfig) -> PageDocument {
    PageDocument::parse(source, &config.document.container_selectors).expect("parse page")
}

#[tokio::test]
async fn run_annotates_containers_and_builds_summary() {
    let config = CheckerConfig::default();
    let pipeline = CheckerPipeline::new(&config).expect("pipeline");
    let lookup = LookupOrchestrator::new(FakeBackend::with_hits(&["ABC-123 -c"]), &config.service);
    let mut page = parse(&post_html(), &config);

    let outcome = pipeline.run(&mut page, &lookup, true).await;

    assert!(outcome.service_reachable);
    assert_eq!(
        outcome
            .containers
            .iter()
            .map(|report| report.outcome.clone())
            .collect::<Vec<ContainerOutcome>>(),
        vec![
            ContainerOutcome::Marked { entries: 2 },
            ContainerOutcome::Annotated {
                codes: 2,
                placed: 2,
                entries: 2,
            },
        ]
    );

    let expected = format!(
        "Title A<br>ABC-123<br>{WITH_VARIANT}{}Title B<br>\
         <span id=\"video_XYZ-004_1\">XYZ-004</span><br>{NOT_PRESENT}<br>\
         <a href=\"{}\">XYZ-004 magnet</a>",
        separator(),
        magnet()
    );
    assert_eq!(page.containers[0].markup, expected);
    assert!(page.containers[0].processed);

    assert_eq!(outcome.statuses.len(), 2);
    assert_eq!(outcome.statuses[0].anchor_id, "video_ABC-123_0");
    assert_eq!(outcome.statuses[0].status, StatusResult::PresentWithVariant);
    assert_eq!(outcome.statuses[1].status, StatusResult::NotPresent);

    assert_eq!(outcome.summary.len(), 1);
    assert_eq!(outcome.summary[0].code.to_string(), "XYZ-004");
    assert_eq!(outcome.summary[0].anchor_id, "video_XYZ-004_1");
    assert!(!outcome.summary[0].has_local);
    assert_eq!(outcome.summary[0].links, vec![magnet()]);
}

#[tokio::test]
async fn rerunning_on_annotated_output_changes_nothing() {
    let config = CheckerConfig::default();
    let pipeline = CheckerPipeline::new(&config).expect("pipeline");
    let lookup = LookupOrchestrator::new(FakeBackend::with_hits(&["ABC-123 -c"]), &config.service);

    let mut first = parse(&post_html(), &config);
    pipeline.run(&mut first, &lookup, true).await;
    let rendered = render_page("", &first.containers);

    let mut second = parse(&rendered, &config);
    let outcome = pipeline.run(&mut second, &lookup, true).await;

    assert_eq!(
        outcome.containers[0].outcome,
        ContainerOutcome::AlreadyMarked
    );
    assert_eq!(second.containers[0].markup, first.containers[0].markup);
}

#[tokio::test]
async fn unreachable_service_keeps_mark_only_output() {
    let config = CheckerConfig::default();
    let pipeline = CheckerPipeline::new(&config).expect("pipeline");
    let backend = FakeBackend {
        unreachable: true,
        ..FakeBackend::default()
    };
    let lookup = LookupOrchestrator::new(backend, &config.service);
    let mut page = parse(&post_html(), &config);

    let outcome = pipeline.run(&mut page, &lookup, true).await;

    assert!(!outcome.service_reachable);
    assert!(outcome.statuses.is_empty());
    assert!(outcome.summary.is_empty());
    assert_eq!(outcome.links.len(), 1);
    assert!(!page.containers[0].markup.contains("【是否存在】"));
    assert!(page.containers[0].markup.contains(&separator()));
    assert!(lookup.backend().queries().is_empty());
}

#[tokio::test]
async fn containers_without_codes_are_reported() {
    let config = CheckerConfig::default();
    let pipeline = CheckerPipeline::new(&config).expect("pipeline");
    let lookup = LookupOrchestrator::new(FakeBackend::default(), &config.service);
    let mut page = parse(
        "<div id=\"read_tpc\">just a greeting</div>",
        &config,
    );

    let outcome = pipeline.run(&mut page, &lookup, false).await;

    assert_eq!(outcome.containers.len(), 1);
    assert_eq!(outcome.containers[0].outcome, ContainerOutcome::NoCodes);
    assert_eq!(page.containers[0].markup, "just a greeting");
}

#[test]
fn mark_skips_processed_containers() {
    let config = CheckerConfig::default();
    let pipeline = CheckerPipeline::new(&config).expect("pipeline");
    let mut page = parse(
        "<div id=\"read_tpc\" data-processed=\"true\">Title A ABC-123 ===== Title B</div>\
         <div class=\"f14\">Title C ABC-124 ===== Title D</div>",
        &config,
    );

    let reports = pipeline.mark_all(&mut page);

    assert_eq!(reports[0].outcome, ContainerOutcome::AlreadyMarked);
    assert_eq!(page.containers[0].markup, "Title A ABC-123 ===== Title B");
    assert_eq!(reports[1].outcome, ContainerOutcome::Marked { entries: 2 });
    assert_eq!(
        page.containers[1].markup,
        format!("Title C ABC-124{}Title D", separator())
    );
    assert!(page.containers[1].processed);
}

#[test]
fn apply_statuses_skips_shape_mismatch() {
    let config = CheckerConfig::default();
    let pipeline = CheckerPipeline::new(&config).expect("pipeline");
    let mut page = parse(&post_html(), &config);
    let before = page.containers[0].clone();

    let located = pipeline.locate(&page.containers[0]);
    let outcome = pipeline.apply_statuses(
        &mut page.containers[0],
        &located,
        &[StatusResult::NotPresent],
    );

    assert_eq!(
        outcome,
        ContainerOutcome::ShapeMismatch {
            codes: 3,
            statuses: 1,
        }
    );
    assert_eq!(page.containers[0], before);
}

#[test]
fn failed_reconciliation_restores_container_snapshot() {
    let config = CheckerConfig::default();
    let pipeline = CheckerPipeline::new(&config).expect("pipeline");
    let mut page = parse(&post_html(), &config);
    pipeline.mark_all(&mut page);
    let before = page.containers[0].clone();
    assert!(before.processed);

    let unique = first_seen(&pipeline.locate(&page.containers[0]));
    let statuses = vec![StatusResult::NotPresent, StatusResult::NotPresent];
    let outcome = pipeline.apply_statuses_with(
        &mut page.containers[0],
        &unique,
        &statuses,
        |_, _| Err(anyhow!("entry rewrite failed")),
    );

    assert_eq!(
        outcome,
        ContainerOutcome::RolledBack {
            error: "entry rewrite failed".to_string(),
        }
    );
    assert_eq!(page.containers[0], before);
}

#[test]
fn default_output_path_sits_next_to_input() {
    let path = default_output_path(std::path::Path::new("/tmp/post.html"));
    assert_eq!(path, std::path::PathBuf::from("/tmp/post.annotated.html"));
}
