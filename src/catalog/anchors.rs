use std::collections::HashMap;

use anyhow::{Context, Result};
use regex::Regex;

use super::code::CatalogCode;
use super::locate::CodeLocator;

#[derive(Debug, Clone)]
pub struct AnchorWriter {
    prefix: String,
    existing: Regex,
    tag: Regex,
}

impl AnchorWriter {
    pub fn new(prefix: &str) -> Result<Self> {
        let existing = Regex::new(&format!(
            r#"<span id="{}_[^"]*">([^<]*)</span>"#,
            regex::escape(prefix)
        ))
        .context("failed to compile anchor span regex")?;
        let tag = Regex::new(r"<(/?)([A-Za-z][A-Za-z0-9]*)?[^>]*>")
            .context("failed to compile anchor tag regex")?;

        Ok(Self {
            prefix: prefix.to_string(),
            existing,
            tag,
        })
    }

    pub fn anchor_id(&self, code: &CatalogCode, index: usize) -> String {
        format!("{}_{}_{}", self.prefix, code, index)
    }

    pub fn strip(&self, markup: &str) -> String {
        self.existing.replace_all(markup, "$1").into_owned()
    }

    // Wraps the first text occurrence of each promoted code. Tag attributes and
    // textarea bodies are left untouched.
    pub fn promote(
        &self,
        markup: &str,
        promoted: &[(CatalogCode, usize)],
        locator: &CodeLocator,
    ) -> String {
        let cleaned = self.strip(markup);
        let mut pending = promoted
            .iter()
            .map(|(code, index)| (code.clone(), *index))
            .collect::<HashMap<CatalogCode, usize>>();

        let mut output = String::with_capacity(cleaned.len());
        let mut in_textarea = false;
        let mut cursor = 0;

        for tag in self.tag.captures_iter(&cleaned) {
            let Some(whole) = tag.get(0) else {
                continue;
            };
            let text = &cleaned[cursor..whole.start()];
            if in_textarea || pending.is_empty() {
                output.push_str(text);
            } else {
                output.push_str(&self.wrap_text(text, &mut pending, locator));
            }
            output.push_str(whole.as_str());
            cursor = whole.end();

            let is_textarea = tag
                .get(2)
                .is_some_and(|name| name.as_str().eq_ignore_ascii_case("textarea"));
            if is_textarea {
                in_textarea = tag.get(1).is_none_or(|slash| slash.as_str().is_empty());
            }
        }

        let tail = &cleaned[cursor..];
        if in_textarea || pending.is_empty() {
            output.push_str(tail);
        } else {
            output.push_str(&self.wrap_text(tail, &mut pending, locator));
        }

        output
    }

    fn wrap_text(
        &self,
        text: &str,
        pending: &mut HashMap<CatalogCode, usize>,
        locator: &CodeLocator,
    ) -> String {
        let mut output = String::with_capacity(text.len());
        let mut cursor = 0;

        for found in locator.scan_line(text) {
            let Some(index) = pending.remove(&found.code) else {
                continue;
            };
            let end = found.byte_offset + found.raw_text.len();
            output.push_str(&text[cursor..found.byte_offset]);
            output.push_str(&format!(
                "<span id=\"{}\">{}</span>",
                self.anchor_id(&found.code, index),
                found.raw_text
            ));
            cursor = end;
        }

        output.push_str(&text[cursor..]);
        output
    }
}
