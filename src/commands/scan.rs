use std::io::{self, Write};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::catalog::{LinkRecord, PageDocument, first_seen};
use crate::cli::ScanArgs;
use crate::commands::annotate::CheckerPipeline;
use crate::config::load_config;
use crate::model::ScanReport;
use crate::util::read_text;

const PAGE_LABEL: &str = "(page)";

#[derive(Debug, Serialize)]
struct ScanResponse {
    input: String,
    containers: Vec<ScanReport>,
    links: Vec<LinkRecord>,
}

pub fn run(args: ScanArgs) -> Result<()> {
    let config = load_config(args.config.as_deref(), None)?;
    let source = read_text(&args.input)?;

    let pipeline = CheckerPipeline::new(&config)?;
    let page = PageDocument::parse(&source, &config.document.container_selectors)?;

    let mut containers = page
        .containers
        .iter()
        .map(|container| {
            let occurrences = pipeline.locate(container);
            ScanReport {
                label: container.label.clone(),
                unique_codes: first_seen(&occurrences).len(),
                occurrences,
            }
        })
        .collect::<Vec<ScanReport>>();

    if containers.is_empty() {
        let occurrences = pipeline.locate_text(&page.text());
        containers.push(ScanReport {
            label: PAGE_LABEL.to_string(),
            unique_codes: first_seen(&occurrences).len(),
            occurrences,
        });
    }

    let links = pipeline.associate_links(&page);
    info!(
        containers = containers.len(),
        links = links.len(),
        "scan completed"
    );

    let response = ScanResponse {
        input: args.input.display().to_string(),
        containers,
        links,
    };

    if args.json {
        write_json_response(&response)
    } else {
        write_text_response(&response)
    }
}

fn write_json_response(response: &ScanResponse) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());
    serde_json::to_writer_pretty(&mut output, response)
        .context("failed to serialize scan json output")?;
    writeln!(output)?;
    output.flush()?;
    Ok(())
}

fn write_text_response(response: &ScanResponse) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());

    writeln!(output, "Input: {}", response.input)?;
    for container in &response.containers {
        writeln!(
            output,
            "{}\toccurrences={}\tunique={}",
            container.label,
            container.occurrences.len(),
            container.unique_codes
        )?;
        for occurrence in &container.occurrences {
            writeln!(
                output,
                "\t{}\t{}\tentry {} line {} col {}",
                occurrence.code,
                occurrence.raw_text,
                occurrence.entry_index,
                occurrence.line_index,
                occurrence.char_offset
            )?;
        }
    }

    writeln!(output, "Links: {}", response.links.len())?;
    for link in &response.links {
        let code = link
            .code
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "(unassociated)".to_string());
        let tier = link
            .tier
            .map(|tier| format!("{tier:?}"))
            .unwrap_or_default();
        writeln!(output, "\t{code}\t{tier}\t{}", link.link_text)?;
    }

    output.flush()?;
    Ok(())
}
