use anyhow::Result;
use tracing::{debug, info, warn};

use crate::catalog::{
    AnchorWriter, CatalogCode, CodeOccurrence, CodeStatus, Container, LinkAssociator, LinkRecord,
    LookupOrchestrator, PageDocument, ReconcileMode, Reconciler, Reconciliation, SearchBackend,
    StatusResult, SummaryRow, build_summary, first_seen, index_links,
};
use crate::config::CheckerConfig;
use crate::model::{ContainerOutcome, ContainerReport};

#[derive(Debug, Clone, Default)]
pub struct PipelineRun {
    pub service_reachable: bool,
    pub containers: Vec<ContainerReport>,
    pub statuses: Vec<CodeStatus>,
    pub links: Vec<LinkRecord>,
    pub summary: Vec<SummaryRow>,
}

pub struct CheckerPipeline {
    reconciler: Reconciler,
    anchors: AnchorWriter,
    associator: LinkAssociator,
}

impl CheckerPipeline {
    pub fn new(config: &CheckerConfig) -> Result<Self> {
        Ok(Self {
            reconciler: Reconciler::new(config)?,
            anchors: AnchorWriter::new(&config.document.anchor_id_prefix)?,
            associator: LinkAssociator::new(&config.document)?,
        })
    }

    pub fn mark(&self, container: &mut Container) -> ContainerOutcome {
        if container.processed {
            return ContainerOutcome::AlreadyMarked;
        }

        match self
            .reconciler
            .reconcile(&container.markup, ReconcileMode::MarkOnly)
        {
            Ok(reconciled) => {
                container.markup = reconciled.markup;
                container.processed = true;
                ContainerOutcome::Marked {
                    entries: reconciled.entry_count,
                }
            }
            Err(err) => {
                warn!(container = %container.label, error = %err, "mark pass failed; container left unchanged");
                ContainerOutcome::RolledBack {
                    error: format!("{err:#}"),
                }
            }
        }
    }

    pub fn mark_all(&self, page: &mut PageDocument) -> Vec<ContainerReport> {
        page.containers
            .iter_mut()
            .map(|container| {
                let outcome = self.mark(container);
                debug!(container = %container.label, outcome = ?outcome, "mark pass");
                ContainerReport {
                    label: container.label.clone(),
                    outcome,
                }
            })
            .collect()
    }

    pub fn locate(&self, container: &Container) -> Vec<CodeOccurrence> {
        let entries = self.reconciler.segmenter().segment(&container.markup);
        self.reconciler.locator().locate_entries(&entries)
    }

    pub fn locate_text(&self, text: &str) -> Vec<CodeOccurrence> {
        self.reconciler.locator().locate_text(text)
    }

    pub fn associate_links(&self, page: &PageDocument) -> Vec<LinkRecord> {
        self.associator.associate(&page.html)
    }

    pub fn apply_statuses(
        &self,
        container: &mut Container,
        located: &[CodeOccurrence],
        statuses: &[StatusResult],
    ) -> ContainerOutcome {
        self.apply_statuses_with(container, located, statuses, |markup, mode| {
            self.reconciler.reconcile(markup, mode)
        })
    }

    pub(crate) fn apply_statuses_with<F>(
        &self,
        container: &mut Container,
        located: &[CodeOccurrence],
        statuses: &[StatusResult],
        reconcile: F,
    ) -> ContainerOutcome
    where
        F: FnOnce(&str, ReconcileMode<'_>) -> Result<Reconciliation>,
    {
        if located.len() != statuses.len() {
            warn!(
                container = %container.label,
                codes = located.len(),
                statuses = statuses.len(),
                "status count does not match located codes; skipping container"
            );
            return ContainerOutcome::ShapeMismatch {
                codes: located.len(),
                statuses: statuses.len(),
            };
        }

        let snapshot = container.clone();
        container.processed = false;

        let codes = located
            .iter()
            .map(|occurrence| occurrence.code.clone())
            .collect::<Vec<CatalogCode>>();
        let promoted = codes
            .iter()
            .zip(statuses)
            .enumerate()
            .filter(|(_, (_, status))| status.is_promoted())
            .map(|(index, (code, _))| (code.clone(), index))
            .collect::<Vec<(CatalogCode, usize)>>();

        let anchored = self
            .anchors
            .promote(&container.markup, &promoted, self.reconciler.locator());
        let mode = ReconcileMode::Annotate {
            codes: &codes,
            statuses,
        };

        match reconcile(&anchored, mode) {
            Ok(reconciled) => {
                if reconciled.consumed < codes.len() {
                    warn!(
                        container = %container.label,
                        placed = reconciled.consumed,
                        codes = codes.len(),
                        "some located codes were not placed in any entry"
                    );
                }
                container.markup = reconciled.markup;
                container.processed = true;
                ContainerOutcome::Annotated {
                    codes: codes.len(),
                    placed: reconciled.consumed,
                    entries: reconciled.entry_count,
                }
            }
            Err(err) => {
                warn!(container = %container.label, error = %err, "reconciliation failed; restored original markup");
                *container = snapshot;
                ContainerOutcome::RolledBack {
                    error: format!("{err:#}"),
                }
            }
        }
    }

    pub async fn run<B: SearchBackend>(
        &self,
        page: &mut PageDocument,
        lookup: &LookupOrchestrator<B>,
        mark_first: bool,
    ) -> PipelineRun {
        let mut run = PipelineRun::default();

        if mark_first {
            run.containers = self.mark_all(page);
        }

        if !lookup.is_reachable().await {
            warn!("lookup service unavailable; keeping mark-only output");
            run.links = self.associate_links(page);
            return run;
        }
        run.service_reachable = true;

        for container in &mut page.containers {
            let unique = first_seen(&self.locate(container));
            if unique.is_empty() {
                info!(container = %container.label, "no catalog codes found");
                run.containers.push(ContainerReport {
                    label: container.label.clone(),
                    outcome: ContainerOutcome::NoCodes,
                });
                continue;
            }

            info!(
                container = %container.label,
                codes = unique.len(),
                "located catalog codes"
            );

            let codes = unique
                .iter()
                .map(|occurrence| occurrence.code.clone())
                .collect::<Vec<CatalogCode>>();
            let label = container.label.clone();
            let statuses = lookup
                .resolve(&codes, |progress| {
                    debug!(
                        container = %label,
                        completed = progress.completed,
                        total = progress.total,
                        "container lookup progress"
                    );
                })
                .await;

            for (index, (occurrence, status)) in unique.iter().zip(&statuses).enumerate() {
                debug!(code = %occurrence.code, status = status.as_str(), "resolved status");
                run.statuses.push(CodeStatus {
                    code: occurrence.code.clone(),
                    raw_text: occurrence.raw_text.clone(),
                    anchor_id: self.anchors.anchor_id(&occurrence.code, index),
                    status: *status,
                });
            }

            let outcome = self.apply_statuses(container, &unique, &statuses);
            run.containers.push(ContainerReport {
                label: container.label.clone(),
                outcome,
            });
        }

        run.links = self.associate_links(page);
        run.summary = build_summary(&run.statuses, &index_links(&run.links));
        run
    }
}
