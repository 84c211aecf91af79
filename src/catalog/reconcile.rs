use std::collections::HashSet;

use anyhow::{Result, bail};

use super::code::{CatalogCode, CodeNormalizer};
use super::locate::CodeLocator;
use super::segment::{Entry, EntrySegmenter, LINE_BREAK};
use super::status::{AnnotationStyle, StatusResult};
use crate::config::CheckerConfig;

#[derive(Debug, Clone, Copy)]
pub enum ReconcileMode<'a> {
    MarkOnly,
    Annotate {
        codes: &'a [CatalogCode],
        statuses: &'a [StatusResult],
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub markup: String,
    pub entry_count: usize,
    pub consumed: usize,
}

#[derive(Debug, Clone, Copy)]
struct EntryMatch {
    line_index: usize,
    code_index: usize,
}

#[derive(Debug, Clone)]
pub struct Reconciler {
    segmenter: EntrySegmenter,
    locator: CodeLocator,
    style: AnnotationStyle,
    entry_separator: String,
}

impl Reconciler {
    pub fn new(config: &CheckerConfig) -> Result<Self> {
        Ok(Self {
            segmenter: EntrySegmenter::new(&config.markup)?,
            locator: CodeLocator::new(CodeNormalizer::new(&config.codes.denylist)),
            style: AnnotationStyle::new(&config.markup.annotation_prefix, &config.markup.labels),
            entry_separator: config.markup.entry_separator.clone(),
        })
    }

    pub fn segmenter(&self) -> &EntrySegmenter {
        &self.segmenter
    }

    pub fn locator(&self) -> &CodeLocator {
        &self.locator
    }

    pub fn reconcile(&self, markup: &str, mode: ReconcileMode<'_>) -> Result<Reconciliation> {
        let entries = self.segmenter.segment(markup);

        let (rendered, consumed) = match mode {
            ReconcileMode::MarkOnly => (
                entries.iter().map(Entry::joined_markup).collect::<Vec<String>>(),
                0,
            ),
            ReconcileMode::Annotate { codes, statuses } => {
                if codes.len() != statuses.len() {
                    bail!(
                        "cannot reconcile {} codes against {} statuses",
                        codes.len(),
                        statuses.len()
                    );
                }

                let mut cursor = 0;
                let mut rendered = Vec::with_capacity(entries.len());
                for entry in &entries {
                    let matches = self.match_entry(entry, codes, &mut cursor);
                    if matches.is_empty() {
                        rendered.push(entry.joined_markup());
                    } else {
                        rendered.push(self.annotate_entry(entry, &matches, codes, statuses));
                    }
                }
                (rendered, cursor)
            }
        };

        Ok(Reconciliation {
            markup: rendered.join(&self.entry_separator),
            entry_count: entries.len(),
            consumed,
        })
    }

    fn match_entry(
        &self,
        entry: &Entry,
        codes: &[CatalogCode],
        cursor: &mut usize,
    ) -> Vec<EntryMatch> {
        let mut matches = Vec::new();

        for (line_index, line) in entry.lines.iter().enumerate() {
            for found in self.locator.scan_line(&line.text) {
                let Some(expected) = codes.get(*cursor) else {
                    return matches;
                };
                if found.code == *expected {
                    matches.push(EntryMatch {
                        line_index,
                        code_index: *cursor,
                    });
                    *cursor += 1;
                }
            }
        }

        matches
    }

    fn annotate_entry(
        &self,
        entry: &Entry,
        matches: &[EntryMatch],
        codes: &[CatalogCode],
        statuses: &[StatusResult],
    ) -> String {
        let mut annotated = HashSet::<&CatalogCode>::new();
        let mut lines = Vec::with_capacity(entry.lines.len() + matches.len());

        for (line_index, line) in entry.lines.iter().enumerate() {
            lines.push(line.markup.clone());
            for found in matches.iter().filter(|found| found.line_index == line_index) {
                if annotated.insert(&codes[found.code_index]) {
                    lines.push(self.style.render(statuses[found.code_index]));
                }
            }
        }

        // Matches whose line was never visited still get their status at the end.
        for found in matches {
            if annotated.insert(&codes[found.code_index]) {
                lines.push(self.style.render(statuses[found.code_index]));
            }
        }

        lines.join(LINE_BREAK)
    }
}
