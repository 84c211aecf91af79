use anyhow::{Context, Result};
use regex::Regex;

use crate::config::MarkupConfig;

pub const LINE_BREAK: &str = "<br>";

const SEPARATOR_TOKEN: &str = "\u{1e}";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryLine {
    pub markup: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub lines: Vec<EntryLine>,
}

impl Entry {
    pub fn joined_markup(&self) -> String {
        self.lines
            .iter()
            .map(|line| line.markup.as_str())
            .collect::<Vec<&str>>()
            .join(LINE_BREAK)
    }
}

#[derive(Debug, Clone)]
pub struct EntrySegmenter {
    annotation_line: Regex,
    divider: Regex,
    line_break: Regex,
    block_tag: Regex,
    tag: Regex,
}

impl EntrySegmenter {
    pub fn new(config: &MarkupConfig) -> Result<Self> {
        let annotation_line = Regex::new(&format!(
            r"(?i){}<span[^>]*>[^<]*</span>(?:<br\s*/?>)?",
            regex::escape(&config.annotation_prefix)
        ))
        .context("failed to compile annotation line regex")?;

        let run = config.divider_min_run.max(1);
        let divider = Regex::new(&format!(
            r"(?i)(?:\s*<br\s*/?>)*\s*(?:={{{run},}}|-{{{run},}})\s*(?:<br\s*/?>\s*)*"
        ))
        .context("failed to compile divider regex")?;

        let line_break =
            Regex::new(r"(?i)<br\s*/?>").context("failed to compile line break regex")?;
        let block_tag = Regex::new(
            r"(?i)</?(?:div|p|li|ul|ol|dl|dt|dd|tr|td|th|thead|tbody|table|h[1-6]|blockquote|pre|hr|section|article)\b[^>]*>",
        )
        .context("failed to compile block tag regex")?;
        let tag = Regex::new(r"<[^>]*>").context("failed to compile markup tag regex")?;

        Ok(Self {
            annotation_line,
            divider,
            line_break,
            block_tag,
            tag,
        })
    }

    pub fn strip_annotations(&self, markup: &str) -> String {
        self.annotation_line.replace_all(markup, "").into_owned()
    }

    pub fn segment(&self, markup: &str) -> Vec<Entry> {
        let cleaned = self.strip_annotations(markup);
        let normalized = self.divider.replace_all(&cleaned, SEPARATOR_TOKEN);

        normalized
            .split(SEPARATOR_TOKEN)
            .filter_map(|segment| {
                let lines = self
                    .line_break
                    .split(segment)
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(|line| EntryLine {
                        markup: line.to_string(),
                        text: self.plain_text(line),
                    })
                    .collect::<Vec<EntryLine>>();

                (!lines.is_empty()).then_some(Entry { lines })
            })
            .collect()
    }

    // Block boundaries become spaces so adjacent blocks never fuse into one token.
    pub fn plain_text(&self, markup: &str) -> String {
        let spaced = self.block_tag.replace_all(markup, " ");
        self.tag.replace_all(&spaced, "").into_owned()
    }
}
