mod anchors;
mod code;
mod document;
mod links;
mod locate;
mod lookup;
mod reconcile;
mod segment;
mod status;
mod summary;

#[cfg(test)]
mod lookup_tests;
#[cfg(test)]
pub(crate) mod testing;

pub use anchors::AnchorWriter;
pub use code::CatalogCode;
pub use document::{Container, PageDocument, render_page};
pub use links::{LinkAssociator, LinkRecord, index_links};
pub use locate::{CodeOccurrence, first_seen};
pub use lookup::{HttpSearchBackend, LookupOrchestrator, SearchBackend};
pub use reconcile::{ReconcileMode, Reconciler, Reconciliation};
pub use status::StatusResult;
pub use summary::{CodeStatus, SummaryRow, build_summary, render_summary_table};
