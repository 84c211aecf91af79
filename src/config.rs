use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckerConfig {
    pub service: ServiceConfig,
    pub codes: CodeConfig,
    pub markup: MarkupConfig,
    pub document: DocumentConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub host: String,
    pub probe_timeout_ms: u64,
    pub batch_size: usize,
    pub variant_query_suffix: String,
    pub results_marker: String,
    pub zero_results_marker: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: "http://192.168.3.252:31458".to_string(),
            probe_timeout_ms: 5000,
            batch_size: 5,
            variant_query_suffix: " -c".to_string(),
            results_marker: "结果".to_string(),
            zero_results_marker: "0 个结果".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CodeConfig {
    pub denylist: Vec<String>,
}

impl Default for CodeConfig {
    fn default() -> Self {
        Self {
            denylist: ["MP4", "HD", "AVI", "RMVB", "WMV", "MOV"]
                .into_iter()
                .map(ToOwned::to_owned)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkupConfig {
    pub annotation_prefix: String,
    pub divider_min_run: usize,
    pub entry_separator: String,
    pub labels: StatusLabels,
}

impl Default for MarkupConfig {
    fn default() -> Self {
        Self {
            annotation_prefix: "【是否存在】：".to_string(),
            divider_min_run: 5,
            entry_separator: format!("<br>{}<br>", "=".repeat(29)),
            labels: StatusLabels::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusLabel {
    pub text: String,
    pub color: String,
}

impl StatusLabel {
    fn new(text: &str, color: &str) -> Self {
        Self {
            text: text.to_string(),
            color: color.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusLabels {
    pub present_with_variant: StatusLabel,
    pub present_no_variant: StatusLabel,
    pub not_present: StatusLabel,
}

impl Default for StatusLabels {
    fn default() -> Self {
        Self {
            present_with_variant: StatusLabel::new("存在中文版本", "#008000"),
            present_no_variant: StatusLabel::new("存在无中文版本", "#FFA500"),
            not_present: StatusLabel::new("不存在", "#ff0000"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    pub container_selectors: Vec<String>,
    pub anchor_id_prefix: String,
    pub link_prefix: String,
    pub ancestor_depth: usize,
}

impl Default for DocumentConfig {
    fn default() -> Self {
        Self {
            container_selectors: vec![
                "#read_tpc".to_string(),
                ".tpc_content".to_string(),
                ".f14".to_string(),
            ],
            anchor_id_prefix: "video".to_string(),
            link_prefix: "magnet:?xt=urn:btih:".to_string(),
            ancestor_depth: 3,
        }
    }
}

pub fn load_config(path: Option<&Path>, host_override: Option<&str>) -> Result<CheckerConfig> {
    let mut config = match path {
        Some(path) => {
            let raw =
                fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_slice::<CheckerConfig>(&raw)
                .with_context(|| format!("failed to parse {}", path.display()))?
        }
        None => CheckerConfig::default(),
    };

    if let Some(host) = host_override {
        config.service.host = host.trim_end_matches('/').to_string();
    }

    Ok(config)
}
