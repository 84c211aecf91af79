use std::collections::{HashMap, HashSet};

use serde::Serialize;

use super::code::CatalogCode;
use super::document::{escape_attribute, escape_html};
use super::status::StatusResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeStatus {
    pub code: CatalogCode,
    pub raw_text: String,
    pub anchor_id: String,
    pub status: StatusResult,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryRow {
    pub code: CatalogCode,
    pub raw_text: String,
    pub anchor_id: String,
    pub has_local: bool,
    pub has_variant: bool,
    pub links: Vec<String>,
}

pub fn build_summary(
    statuses: &[CodeStatus],
    links: &HashMap<CatalogCode, Vec<String>>,
) -> Vec<SummaryRow> {
    let mut seen = HashSet::new();
    statuses
        .iter()
        .filter(|entry| entry.status.is_promoted())
        .filter(|entry| seen.insert(entry.code.clone()))
        .map(|entry| SummaryRow {
            code: entry.code.clone(),
            raw_text: entry.raw_text.clone(),
            anchor_id: entry.anchor_id.clone(),
            has_local: entry.status.has_local(),
            has_variant: entry.status.has_variant(),
            links: links.get(&entry.code).cloned().unwrap_or_default(),
        })
        .collect()
}

pub fn render_summary_table(rows: &[SummaryRow]) -> String {
    if rows.is_empty() {
        return String::new();
    }

    let mut html = String::from(
        "<div class=\"localcheck-summary\"><b>Local status summary</b>\
         <table border=\"1\" cellpadding=\"4\" style=\"border-collapse:collapse;margin-top:4px;min-width:300px;\">\
         <tr><th>Code</th><th>Original</th><th>Jump</th><th>Local</th><th>Variant</th><th>Links</th></tr>",
    );

    for row in rows {
        let links = row
            .links
            .iter()
            .map(|link| {
                format!(
                    "<a href=\"{}\" target=\"_blank\">link</a>",
                    escape_attribute(link)
                )
            })
            .collect::<Vec<String>>()
            .join("<br>");

        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td><a href=\"#{}\">jump</a></td><td>{}</td><td>{}</td><td>{}</td></tr>",
            row.code,
            escape_html(&row.raw_text),
            escape_attribute(&row.anchor_id),
            yes_no(row.has_local),
            yes_no(row.has_variant),
            links
        ));
    }

    html.push_str("</table></div>");
    html
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}
