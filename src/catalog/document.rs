use anyhow::{Result, anyhow};
use scraper::{Html, Selector};

pub const PROCESSED_ATTR: &str = "data-processed";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    pub label: String,
    pub tag_name: String,
    pub attributes: Vec<(String, String)>,
    pub markup: String,
    pub processed: bool,
}

impl Container {
    fn open_tag(&self) -> String {
        let mut tag = format!("<{}", self.tag_name);
        for (name, value) in &self.attributes {
            if name == PROCESSED_ATTR {
                continue;
            }
            tag.push_str(&format!(" {}=\"{}\"", name, escape_attribute(value)));
        }
        if self.processed {
            tag.push_str(&format!(" {PROCESSED_ATTR}=\"true\""));
        }
        tag.push('>');
        tag
    }

    pub fn render(&self) -> String {
        format!("{}{}</{}>", self.open_tag(), self.markup, self.tag_name)
    }
}

#[derive(Debug)]
pub struct PageDocument {
    pub html: Html,
    pub containers: Vec<Container>,
}

impl PageDocument {
    pub fn parse(source: &str, selectors: &[String]) -> Result<Self> {
        let html = Html::parse_document(source);
        let mut taken = Vec::new();
        let mut containers = Vec::new();

        for raw_selector in selectors {
            let selector = Selector::parse(raw_selector)
                .map_err(|err| anyhow!("invalid container selector {raw_selector}: {err:?}"))?;

            for element in html.select(&selector) {
                let overlaps = element
                    .ancestors()
                    .chain(element.descendants())
                    .any(|node| taken.contains(&node.id()));
                if overlaps {
                    continue;
                }
                taken.push(element.id());

                let value = element.value();
                containers.push(Container {
                    label: format!("{raw_selector}#{}", containers.len()),
                    tag_name: value.name().to_string(),
                    attributes: value
                        .attrs()
                        .map(|(name, value)| (name.to_string(), value.to_string()))
                        .collect(),
                    markup: element.inner_html(),
                    processed: value.attr(PROCESSED_ATTR) == Some("true"),
                });
            }
        }

        Ok(Self { html, containers })
    }

    pub fn text(&self) -> String {
        self.html
            .root_element()
            .text()
            .collect::<Vec<&str>>()
            .join("\n")
    }
}

pub fn render_page(summary: &str, containers: &[Container]) -> String {
    let mut page = String::from(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>localcheck</title></head>\n<body>\n",
    );
    if !summary.is_empty() {
        page.push_str(summary);
        page.push('\n');
    }
    for container in containers {
        page.push_str(&container.render());
        page.push('\n');
    }
    page.push_str("</body>\n</html>\n");
    page
}

pub fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub fn escape_attribute(value: &str) -> String {
    escape_html(value).replace('"', "&quot;")
}
