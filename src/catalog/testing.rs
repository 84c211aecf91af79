use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;

use super::lookup::SearchBackend;

pub const HIT_BODY: &str = "<html><body>共 1 个结果</body></html>";
pub const MISS_BODY: &str = "<html><body>0 个结果</body></html>";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryEvent {
    Started(String),
    Finished(String),
}

#[derive(Default)]
pub struct FakeBackend {
    pub unreachable: bool,
    pub probe_error: bool,
    pub hits: HashSet<String>,
    pub failing: HashSet<String>,
    pub events: Mutex<Vec<QueryEvent>>,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl FakeBackend {
    pub fn with_hits(hits: &[&str]) -> Self {
        Self {
            hits: hits.iter().map(|hit| hit.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.events
            .lock()
            .expect("events lock")
            .iter()
            .filter_map(|event| match event {
                QueryEvent::Started(query) => Some(query.clone()),
                QueryEvent::Finished(_) => None,
            })
            .collect()
    }

    fn record(&self, event: QueryEvent) {
        self.events.lock().expect("events lock").push(event);
    }
}

#[async_trait]
impl SearchBackend for FakeBackend {
    async fn probe(&self) -> Result<bool> {
        if self.probe_error {
            bail!("connection refused");
        }
        Ok(!self.unreachable)
    }

    async fn search(&self, query: &str) -> Result<String> {
        self.record(QueryEvent::Started(query.to_string()));
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        tokio::task::yield_now().await;

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.record(QueryEvent::Finished(query.to_string()));

        if self.failing.contains(query) {
            return Err(anyhow!("simulated transport failure for {query}"));
        }
        if self.hits.contains(query) {
            Ok(HIT_BODY.to_string())
        } else {
            Ok(MISS_BODY.to_string())
        }
    }
}
