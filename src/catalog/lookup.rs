use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::future::join_all;
use reqwest::{Client, StatusCode};
use tracing::{debug, info, warn};

use super::code::CatalogCode;
use super::status::StatusResult;
use crate::config::ServiceConfig;

#[async_trait]
pub trait SearchBackend: Send + Sync {
    async fn probe(&self) -> Result<bool>;

    async fn search(&self, query: &str) -> Result<String>;
}

pub struct HttpSearchBackend {
    http: Client,
    host: String,
    probe_timeout: Duration,
}

impl HttpSearchBackend {
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        let http = Client::builder()
            .build()
            .context("failed to create lookup HTTP client")?;

        Ok(Self {
            http,
            host: config.host.trim_end_matches('/').to_string(),
            probe_timeout: Duration::from_millis(config.probe_timeout_ms),
        })
    }
}

#[async_trait]
impl SearchBackend for HttpSearchBackend {
    async fn probe(&self) -> Result<bool> {
        let response = self
            .http
            .get(&self.host)
            .timeout(self.probe_timeout)
            .send()
            .await
            .with_context(|| format!("lookup service unreachable at {}", self.host))?;

        Ok(response.status() == StatusCode::OK)
    }

    async fn search(&self, query: &str) -> Result<String> {
        let response = self
            .http
            .get(search_url(&self.host, query))
            .send()
            .await
            .with_context(|| format!("lookup request failed for {query}"))?;

        response
            .text()
            .await
            .with_context(|| format!("failed to read lookup response for {query}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchProgress {
    pub batch_index: usize,
    pub batch_len: usize,
    pub completed: usize,
    pub total: usize,
}

pub struct LookupOrchestrator<B> {
    backend: B,
    batch_size: usize,
    variant_query_suffix: String,
    results_marker: String,
    zero_results_marker: String,
}

impl<B: SearchBackend> LookupOrchestrator<B> {
    pub fn new(backend: B, config: &ServiceConfig) -> Self {
        Self {
            backend,
            batch_size: config.batch_size.max(1),
            variant_query_suffix: config.variant_query_suffix.clone(),
            results_marker: config.results_marker.clone(),
            zero_results_marker: config.zero_results_marker.clone(),
        }
    }

    #[cfg(test)]
    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub async fn is_reachable(&self) -> bool {
        match self.backend.probe().await {
            Ok(true) => {
                info!("lookup service reachable");
                true
            }
            Ok(false) => {
                warn!("lookup service answered with a non-200 status");
                false
            }
            Err(err) => {
                warn!(error = %err, "lookup service probe failed");
                false
            }
        }
    }

    pub async fn resolve<F>(&self, codes: &[CatalogCode], mut on_batch: F) -> Vec<StatusResult>
    where
        F: FnMut(BatchProgress),
    {
        let mut statuses = Vec::with_capacity(codes.len());

        for (batch_index, batch) in codes.chunks(self.batch_size).enumerate() {
            let results = join_all(batch.iter().map(|code| self.check_code(code))).await;
            statuses.extend(results);

            let progress = BatchProgress {
                batch_index,
                batch_len: batch.len(),
                completed: statuses.len(),
                total: codes.len(),
            };
            info!(
                batch = progress.batch_index + 1,
                completed = progress.completed,
                total = progress.total,
                "lookup batch finished"
            );
            on_batch(progress);
        }

        statuses
    }

    async fn check_code(&self, code: &CatalogCode) -> StatusResult {
        let variant_query = format!("{code}{}", self.variant_query_suffix);
        if self.has_results(&variant_query).await {
            return StatusResult::PresentWithVariant;
        }

        let bare_query = code.to_string();
        let has_bare = self.has_results(&bare_query).await;
        StatusResult::from_queries(false, has_bare)
    }

    async fn has_results(&self, query: &str) -> bool {
        match self.backend.search(query).await {
            Ok(body) => {
                let found = body_has_results(&body, &self.results_marker, &self.zero_results_marker);
                debug!(query = %query, found, "lookup query answered");
                found
            }
            Err(err) => {
                warn!(query = %query, error = %err, "lookup query failed; treating as no results");
                false
            }
        }
    }
}

// Spaces go out as `%20`, never the form-style `+`.
pub fn search_url(host: &str, query: &str) -> String {
    format!(
        "{}/?search={}",
        host.trim_end_matches('/'),
        urlencoding::encode(query)
    )
}

pub fn body_has_results(body: &str, results_marker: &str, zero_results_marker: &str) -> bool {
    body.contains(results_marker) && !contains_exact_zero(body, zero_results_marker)
}

// `10 个结果` contains `0 个结果`; only a zero count not preceded by another digit counts.
fn contains_exact_zero(body: &str, zero_results_marker: &str) -> bool {
    if zero_results_marker.is_empty() {
        return false;
    }

    body.match_indices(zero_results_marker).any(|(start, _)| {
        !body[..start]
            .chars()
            .next_back()
            .is_some_and(|previous| previous.is_ascii_digit())
    })
}
