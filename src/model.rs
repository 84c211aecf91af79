use serde::Serialize;

use crate::catalog::{CodeOccurrence, CodeStatus, LinkRecord, SummaryRow};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ContainerOutcome {
    Marked { entries: usize },
    AlreadyMarked,
    NoCodes,
    Annotated { codes: usize, placed: usize, entries: usize },
    ShapeMismatch { codes: usize, statuses: usize },
    RolledBack { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct ContainerReport {
    pub label: String,
    pub outcome: ContainerOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub label: String,
    pub occurrences: Vec<CodeOccurrence>,
    pub unique_codes: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub report_version: u32,
    pub generated_at: String,
    pub input_path: String,
    pub input_sha256: String,
    pub service_host: String,
    pub service_reachable: bool,
    pub containers: Vec<ContainerReport>,
    pub statuses: Vec<CodeStatus>,
    pub links: Vec<LinkRecord>,
    pub summary: Vec<SummaryRow>,
}
