use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use super::CheckerPipeline;
use crate::catalog::{
    HttpSearchBackend, LookupOrchestrator, PageDocument, render_page, render_summary_table,
};
use crate::cli::AnnotateArgs;
use crate::config::load_config;
use crate::model::RunReport;
use crate::util::{now_utc_string, read_text, sha256_hex, write_json_pretty, write_text};

const REPORT_VERSION: u32 = 1;

pub fn run(args: AnnotateArgs) -> Result<()> {
    let config = load_config(args.config.as_deref(), args.host.as_deref())?;
    let source = read_text(&args.input)?;
    let input_sha256 = sha256_hex(source.as_bytes());

    let pipeline = CheckerPipeline::new(&config)?;
    let mut page = PageDocument::parse(&source, &config.document.container_selectors)?;
    let orchestrator = LookupOrchestrator::new(HttpSearchBackend::new(&config.service)?, &config.service);

    info!(
        input = %args.input.display(),
        containers = page.containers.len(),
        host = %config.service.host,
        "starting annotate"
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let outcome = runtime.block_on(pipeline.run(&mut page, &orchestrator, !args.skip_mark));

    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.input));
    let summary_html = render_summary_table(&outcome.summary);
    write_text(&output_path, &render_page(&summary_html, &page.containers))?;
    info!(path = %output_path.display(), "wrote annotated page");

    if let Some(report_path) = &args.report {
        let report = RunReport {
            report_version: REPORT_VERSION,
            generated_at: now_utc_string(),
            input_path: args.input.display().to_string(),
            input_sha256,
            service_host: config.service.host.clone(),
            service_reachable: outcome.service_reachable,
            containers: outcome.containers,
            statuses: outcome.statuses,
            links: outcome.links,
            summary: outcome.summary,
        };
        write_json_pretty(report_path, &report)?;
        info!(path = %report_path.display(), "wrote run report");
    }

    info!("annotate completed");
    Ok(())
}

pub(crate) fn default_output_path(input: &Path) -> PathBuf {
    input.with_extension("annotated.html")
}
