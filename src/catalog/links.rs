use std::collections::{HashMap, HashSet};

use anyhow::{Context, Result, anyhow};
use regex::Regex;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use tracing::debug;

use super::code::CatalogCode;
use crate::config::DocumentConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssociationTier {
    DisplayText,
    Target,
    Ancestor,
    Sibling,
    FuzzyAncestor,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkRecord {
    pub link_text: String,
    pub code: Option<CatalogCode>,
    pub tier: Option<AssociationTier>,
}

pub struct LinkSite<'a> {
    pub element: ElementRef<'a>,
    pub display_text: String,
    pub target: String,
}

pub struct TierContext<'a> {
    pub link_code: &'a Regex,
    pub document_codes: &'a [CatalogCode],
    pub ancestor_depth: usize,
}

type TierFn = fn(&LinkSite<'_>, &TierContext<'_>) -> Option<CatalogCode>;

const TIERS: [(AssociationTier, TierFn); 5] = [
    (AssociationTier::DisplayText, code_in_display_text),
    (AssociationTier::Target, code_in_target),
    (AssociationTier::Ancestor, code_in_ancestors),
    (AssociationTier::Sibling, code_in_siblings),
    (AssociationTier::FuzzyAncestor, known_code_in_ancestors),
];

pub struct LinkAssociator {
    link_code: Regex,
    document_code: Regex,
    link_target: Regex,
    link_prefix: String,
    ancestor_depth: usize,
    anchors: Selector,
    textareas: Selector,
}

impl LinkAssociator {
    pub fn new(config: &DocumentConfig) -> Result<Self> {
        let link_code = Regex::new(r"(?i)([a-z]{2,5})-(\d{3,5})")
            .context("failed to compile link code regex")?;
        let document_code = Regex::new(r"(?i)([a-z]{2,5})-?(\d{3,5})")
            .context("failed to compile document code regex")?;
        let link_target = Regex::new(&format!(
            r"^{}[0-9A-Fa-f]{{40,}}",
            regex::escape(&config.link_prefix)
        ))
        .context("failed to compile link target regex")?;

        Ok(Self {
            link_code,
            document_code,
            link_target,
            link_prefix: config.link_prefix.clone(),
            ancestor_depth: config.ancestor_depth,
            anchors: parse_selector("a[href]")?,
            textareas: parse_selector("textarea")?,
        })
    }

    pub fn associate(&self, html: &Html) -> Vec<LinkRecord> {
        let document_codes = self.document_codes(html);
        let context = TierContext {
            link_code: &self.link_code,
            document_codes: &document_codes,
            ancestor_depth: self.ancestor_depth,
        };

        let mut records = Vec::new();
        for site in self.link_sites(html) {
            let record = resolve_site(&site, &context);
            debug!(
                link = %record.link_text,
                code = %record.code.as_ref().map(ToString::to_string).unwrap_or_default(),
                tier = ?record.tier,
                "associated link"
            );
            records.push(record);
        }
        records
    }

    fn link_sites<'a>(&self, html: &'a Html) -> Vec<LinkSite<'a>> {
        let mut sites = Vec::new();

        for element in html.select(&self.anchors) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            if !self.link_target.is_match(href) {
                continue;
            }
            sites.push(LinkSite {
                element,
                display_text: element.text().collect(),
                target: href.to_string(),
            });
        }

        let prefix = self.link_prefix.to_lowercase();
        for element in html.select(&self.textareas) {
            let value = element.text().collect::<String>();
            if !value.to_lowercase().contains(&prefix) {
                continue;
            }
            sites.push(LinkSite {
                element,
                display_text: value.clone(),
                target: value,
            });
        }

        sites
    }

    pub fn document_codes(&self, html: &Html) -> Vec<CatalogCode> {
        let text = html.root_element().text().collect::<Vec<&str>>().join(" ");
        let mut seen = HashSet::new();
        self.document_code
            .captures_iter(&text)
            .filter_map(|captures| CatalogCode::from_parts(&captures[1], &captures[2]))
            .filter(|code| seen.insert(code.clone()))
            .collect()
    }
}

pub fn resolve_site(site: &LinkSite<'_>, context: &TierContext<'_>) -> LinkRecord {
    let resolved = TIERS
        .iter()
        .find_map(|(tier, strategy)| strategy(site, context).map(|code| (*tier, code)));

    LinkRecord {
        link_text: site.target.clone(),
        code: resolved.as_ref().map(|(_, code)| code.clone()),
        tier: resolved.map(|(tier, _)| tier),
    }
}

pub fn index_links(records: &[LinkRecord]) -> HashMap<CatalogCode, Vec<String>> {
    let mut index = HashMap::<CatalogCode, Vec<String>>::new();
    for record in records {
        let Some(code) = &record.code else {
            continue;
        };
        let links = index.entry(code.clone()).or_default();
        if !links.contains(&record.link_text) {
            links.push(record.link_text.clone());
        }
    }
    index
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|err| anyhow!("invalid selector {selector}: {err:?}"))
}

fn find_code(pattern: &Regex, text: &str) -> Option<CatalogCode> {
    let captures = pattern.captures(text)?;
    CatalogCode::from_parts(&captures[1], &captures[2])
}

fn ancestor_texts(site: &LinkSite<'_>, depth: usize) -> impl Iterator<Item = String> {
    site.element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .take(depth)
        .map(|ancestor| ancestor.text().collect::<String>())
}

fn code_in_display_text(site: &LinkSite<'_>, context: &TierContext<'_>) -> Option<CatalogCode> {
    find_code(context.link_code, &site.display_text)
}

fn code_in_target(site: &LinkSite<'_>, context: &TierContext<'_>) -> Option<CatalogCode> {
    find_code(context.link_code, &site.target)
}

fn code_in_ancestors(site: &LinkSite<'_>, context: &TierContext<'_>) -> Option<CatalogCode> {
    ancestor_texts(site, context.ancestor_depth).find_map(|text| find_code(context.link_code, &text))
}

fn code_in_siblings(site: &LinkSite<'_>, context: &TierContext<'_>) -> Option<CatalogCode> {
    let parent = site.element.parent()?;
    let own_id = site.element.id();

    parent
        .children()
        .filter(|node| node.id() != own_id)
        .find_map(|node| {
            let text = match node.value() {
                Node::Text(text) => text.to_string(),
                _ => ElementRef::wrap(node)
                    .map(|element| element.text().collect::<String>())
                    .unwrap_or_default(),
            };
            find_code(context.link_code, &text)
        })
}

fn known_code_in_ancestors(
    site: &LinkSite<'_>,
    context: &TierContext<'_>,
) -> Option<CatalogCode> {
    ancestor_texts(site, context.ancestor_depth).find_map(|text| {
        context
            .document_codes
            .iter()
            .find(|code| text.contains(&code.to_string()))
            .cloned()
    })
}
