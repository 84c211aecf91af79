use std::collections::HashSet;
use std::fmt;

use serde::{Serialize, Serializer};

const MIN_PREFIX_LETTERS: usize = 2;
const MAX_PREFIX_LETTERS: usize = 5;
const MIN_SCANNED_DIGITS: usize = 3;
const MAX_SCANNED_DIGITS: usize = 5;
const MIN_BARE_DIGITS: usize = 3;
const NUMBER_WIDTH: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CatalogCode {
    prefix: String,
    number: String,
}

impl CatalogCode {
    pub fn from_parts(prefix: &str, digits: &str) -> Option<Self> {
        let prefix_ok = (MIN_PREFIX_LETTERS..=MAX_PREFIX_LETTERS).contains(&prefix.len())
            && prefix.bytes().all(|byte| byte.is_ascii_alphabetic());
        let digits_ok = !digits.is_empty() && digits.bytes().all(|byte| byte.is_ascii_digit());
        if !prefix_ok || !digits_ok {
            return None;
        }

        Some(Self {
            prefix: prefix.to_ascii_uppercase(),
            number: format!("{:0>width$}", digits, width = NUMBER_WIDTH),
        })
    }
}

impl fmt::Display for CatalogCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.prefix, self.number)
    }
}

impl Serialize for CatalogCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone)]
pub struct CodeNormalizer {
    denylist: HashSet<String>,
}

impl CodeNormalizer {
    pub fn new(denylist: &[String]) -> Self {
        Self {
            denylist: denylist
                .iter()
                .map(|value| value.trim().to_ascii_uppercase())
                .collect(),
        }
    }

    pub fn normalize(&self, raw: &str) -> Option<CatalogCode> {
        let token = raw.trim();
        let upper = token.to_ascii_uppercase();
        let prefix_end = upper
            .find(|character: char| !character.is_ascii_alphabetic())
            .unwrap_or(upper.len());
        if self.denylist.contains(&upper) || self.denylist.contains(&upper[..prefix_end]) {
            return None;
        }

        let stem = token
            .strip_suffix(|character: char| character.eq_ignore_ascii_case(&'c'))
            .unwrap_or(token);
        let letters_end = stem
            .find(|character: char| !character.is_ascii_alphabetic())
            .unwrap_or(stem.len());
        let (letters, rest) = stem.split_at(letters_end);
        let (hyphenated, digits) = match rest.strip_prefix('-') {
            Some(digits) => (true, digits),
            None => (false, rest),
        };

        if !hyphenated && digits.len() < MIN_BARE_DIGITS {
            return None;
        }

        CatalogCode::from_parts(letters, digits)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeSpan {
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, Copy)]
enum ScanState {
    Prefix(usize),
    Separator,
    Number(usize),
    Variant,
}

// Candidates may only start and end next to a non-alphanumeric character, so a
// run such as `MIDV100` is never read as the shorter `IDV100`.
pub fn scan_code_spans(text: &str) -> Vec<CodeSpan> {
    let bytes = text.as_bytes();
    let mut spans = Vec::new();
    let mut index = 0;

    while index < bytes.len() {
        let at_boundary = index == 0 || !bytes[index - 1].is_ascii_alphanumeric();
        if !at_boundary || !bytes[index].is_ascii_alphabetic() {
            index += 1;
            continue;
        }

        match match_code_at(bytes, index) {
            Some(end) => {
                spans.push(CodeSpan { start: index, end });
                index = end;
            }
            None => {
                while index < bytes.len() && bytes[index].is_ascii_alphanumeric() {
                    index += 1;
                }
            }
        }
    }

    spans
}

fn match_code_at(bytes: &[u8], start: usize) -> Option<usize> {
    let mut state = ScanState::Prefix(0);
    let mut index = start;

    loop {
        let next = bytes.get(index).copied();
        state = match (state, next) {
            (ScanState::Prefix(count), Some(byte)) if byte.is_ascii_alphabetic() => {
                if count == MAX_PREFIX_LETTERS {
                    return None;
                }
                ScanState::Prefix(count + 1)
            }
            (ScanState::Prefix(count), Some(b'-')) if count >= MIN_PREFIX_LETTERS => {
                ScanState::Separator
            }
            (ScanState::Prefix(count), Some(byte))
                if count >= MIN_PREFIX_LETTERS && byte.is_ascii_digit() =>
            {
                ScanState::Number(1)
            }
            (ScanState::Prefix(_), _) => return None,
            (ScanState::Separator, Some(byte)) if byte.is_ascii_digit() => ScanState::Number(1),
            (ScanState::Separator, _) => return None,
            (ScanState::Number(count), Some(byte)) if byte.is_ascii_digit() => {
                if count == MAX_SCANNED_DIGITS {
                    return None;
                }
                ScanState::Number(count + 1)
            }
            (ScanState::Number(count), Some(b'C')) if count >= MIN_SCANNED_DIGITS => {
                ScanState::Variant
            }
            (ScanState::Number(count), next) => {
                return (count >= MIN_SCANNED_DIGITS && !is_alphanumeric(next)).then_some(index);
            }
            (ScanState::Variant, next) => return (!is_alphanumeric(next)).then_some(index),
        };
        index += 1;
    }
}

fn is_alphanumeric(byte: Option<u8>) -> bool {
    byte.is_some_and(|value| value.is_ascii_alphanumeric())
}
