use std::collections::HashSet;

use serde::Serialize;

use super::code::{CatalogCode, CodeNormalizer, scan_code_spans};
use super::segment::Entry;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeOccurrence {
    pub raw_text: String,
    pub code: CatalogCode,
    pub entry_index: usize,
    pub line_index: usize,
    pub char_offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineMatch<'a> {
    pub raw_text: &'a str,
    pub code: CatalogCode,
    pub byte_offset: usize,
    pub char_offset: usize,
}

#[derive(Debug, Clone)]
pub struct CodeLocator {
    normalizer: CodeNormalizer,
}

impl CodeLocator {
    pub fn new(normalizer: CodeNormalizer) -> Self {
        Self { normalizer }
    }

    pub fn scan_line<'a>(&self, line: &'a str) -> Vec<LineMatch<'a>> {
        scan_code_spans(line)
            .into_iter()
            .filter_map(|span| {
                let raw_text = &line[span.start..span.end];
                let code = self.normalizer.normalize(raw_text)?;
                Some(LineMatch {
                    raw_text,
                    code,
                    byte_offset: span.start,
                    char_offset: line[..span.start].chars().count(),
                })
            })
            .collect()
    }

    pub fn locate_text(&self, text: &str) -> Vec<CodeOccurrence> {
        text.lines()
            .enumerate()
            .flat_map(|(line_index, line)| {
                self.scan_line(line)
                    .into_iter()
                    .map(move |found| CodeOccurrence {
                        raw_text: found.raw_text.to_string(),
                        code: found.code,
                        entry_index: 0,
                        line_index,
                        char_offset: found.char_offset,
                    })
            })
            .collect()
    }

    pub fn locate_entries(&self, entries: &[Entry]) -> Vec<CodeOccurrence> {
        let mut occurrences = Vec::new();
        for (entry_index, entry) in entries.iter().enumerate() {
            for (line_index, line) in entry.lines.iter().enumerate() {
                for found in self.scan_line(&line.text) {
                    occurrences.push(CodeOccurrence {
                        raw_text: found.raw_text.to_string(),
                        code: found.code,
                        entry_index,
                        line_index,
                        char_offset: found.char_offset,
                    });
                }
            }
        }
        occurrences
    }
}

pub fn first_seen(occurrences: &[CodeOccurrence]) -> Vec<CodeOccurrence> {
    let mut seen = HashSet::new();
    occurrences
        .iter()
        .filter(|occurrence| seen.insert(occurrence.code.clone()))
        .cloned()
        .collect()
}
