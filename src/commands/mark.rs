use anyhow::Result;
use tracing::info;

use crate::catalog::{PageDocument, render_page};
use crate::cli::MarkArgs;
use crate::commands::annotate::{CheckerPipeline, default_output_path};
use crate::config::load_config;
use crate::model::ContainerOutcome;
use crate::util::{read_text, write_text};

pub fn run(args: MarkArgs) -> Result<()> {
    let config = load_config(args.config.as_deref(), None)?;
    let source = read_text(&args.input)?;

    let pipeline = CheckerPipeline::new(&config)?;
    let mut page = PageDocument::parse(&source, &config.document.container_selectors)?;
    let reports = pipeline.mark_all(&mut page);

    let marked = reports
        .iter()
        .filter(|report| matches!(report.outcome, ContainerOutcome::Marked { .. }))
        .count();

    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.input));
    write_text(&output_path, &render_page("", &page.containers))?;

    info!(
        path = %output_path.display(),
        containers = reports.len(),
        marked,
        "mark pass completed"
    );
    Ok(())
}
