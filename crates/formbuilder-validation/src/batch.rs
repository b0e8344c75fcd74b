//! # Batch Validation
//!
//! Validates a whole form after load or import. The work is an explicit queue of
//! `(node, field)` units so the host can interleave its own edits between steps,
//! or let [`BatchRun::drive`] process the queue cooperatively on a tokio runtime.

use crate::context::{ValidationContext, ValidationMode};
use crate::error::BatchError;
use crate::field::{FieldKind, ValidationObject};
use crate::provider::TreeProvider;
use form_tree::{Item, NodeId};
use serde::Serialize;
use std::collections::VecDeque;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// One field of one node, snapshotted when the run was scheduled.
#[derive(Clone, Debug)]
pub struct ValidationUnit {
    pub object: ValidationObject,
    /// Copy of the item at scheduling time.
    pub item: Item,
}

impl ValidationUnit {
    pub fn node(&self) -> NodeId {
        self.object.id
    }

    pub fn field(&self) -> FieldKind {
        self.object.field()
    }
}

/// Counters of a batch run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub run_id: Uuid,
    pub scheduled: usize,
    pub validated: usize,
    /// Units whose node left the tree, or whose field was edited, before they ran.
    pub skipped: usize,
    /// Validation errors found by this run.
    pub error_count: usize,
}

pub struct BatchValidator;

impl BatchValidator {
    /// Queues one unit per node per registered validator, in `FieldKind::ALL` order.
    /// Nodes missing from the tree are ignored.
    pub fn schedule<P: TreeProvider>(tree: &P, nodes: &[NodeId]) -> BatchRun {
        let queue: VecDeque<ValidationUnit> = nodes
            .iter()
            .filter_map(|&id| tree.item(id).map(|item| (id, item)))
            .flat_map(|(id, item)| {
                FieldKind::ALL.into_iter().map(move |field| ValidationUnit {
                    object: ValidationObject::from_item(id, item, field),
                    item: item.clone(),
                })
            })
            .collect();

        let run = BatchRun {
            id: Uuid::new_v4(),
            report: BatchReport {
                scheduled: queue.len(),
                ..Default::default()
            },
            queue,
        };
        tracing::info!(run_id = %run.id, units = run.queue.len(), "Batch validation scheduled");
        run
    }

    /// Schedules every node of the tree, parents before children.
    pub fn schedule_all<P: TreeProvider>(tree: &P) -> BatchRun {
        Self::schedule(tree, &tree.validation_nodes())
    }
}

#[derive(Debug)]
pub struct BatchRun {
    id: Uuid,
    queue: VecDeque<ValidationUnit>,
    report: BatchReport,
}

impl BatchRun {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Units still queued.
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    pub fn is_finished(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn pending(&self) -> impl Iterator<Item = &ValidationUnit> {
        self.queue.iter()
    }

    pub fn report(&self) -> BatchReport {
        BatchReport {
            run_id: self.id,
            ..self.report.clone()
        }
    }

    /// Processes the next unit. Returns `Ok(false)` once the queue is empty.
    ///
    /// Units whose node was removed or whose field no longer matches its snapshot are
    /// skipped. A faulting unit is consumed; the units behind it stay queued.
    pub fn step<P: TreeProvider>(
        &mut self,
        ctx: &mut ValidationContext,
        tree: &P,
    ) -> Result<bool, BatchError> {
        let Some(unit) = self.queue.pop_front() else {
            return Ok(false);
        };

        let Some(current) = tree.item(unit.node()) else {
            tracing::debug!(node = ?unit.node(), field = %unit.field(), "Skipping unit of removed node");
            self.report.skipped += 1;
            return Ok(true);
        };
        // The host edited this field after scheduling and already validated the new value.
        if unit.field().extract(current) != unit.object.value {
            tracing::debug!(node = ?unit.node(), field = %unit.field(), "Skipping superseded unit");
            self.report.skipped += 1;
            return Ok(true);
        }

        let errors = ctx
            .validate_field(tree, &unit.object, ValidationMode::Batch)
            .map_err(|source| BatchError::Unit {
                node: unit.node(),
                field: unit.field(),
                source,
            })?;
        self.report.validated += 1;
        self.report.error_count += errors.map_or(0, |e| e.len());
        Ok(true)
    }

    /// Drains the queue without yielding.
    pub fn run_to_completion<P: TreeProvider>(
        &mut self,
        ctx: &mut ValidationContext,
        tree: &P,
    ) -> Result<BatchReport, BatchError> {
        while self.step(ctx, tree)? {}
        Ok(self.report())
    }

    /// Drains the queue, yielding to the runtime every `batch_yield_every` units and
    /// checking `cancel` before each unit.
    #[tracing::instrument(skip_all, fields(run_id = %self.id))]
    pub async fn drive<P: TreeProvider>(
        &mut self,
        ctx: &mut ValidationContext,
        tree: &P,
        cancel: &CancellationToken,
    ) -> Result<BatchReport, BatchError> {
        let yield_every = ctx.config().batch_yield_every.max(1);
        let mut since_yield = 0;

        loop {
            if cancel.is_cancelled() {
                tracing::warn!(remaining = self.remaining(), "Batch validation cancelled");
                return Err(BatchError::Cancelled {
                    remaining: self.remaining(),
                });
            }
            if !self.step(ctx, tree)? {
                break;
            }
            since_yield += 1;
            if since_yield >= yield_every {
                since_yield = 0;
                tokio::task::yield_now().await;
            }
        }

        let report = self.report();
        tracing::info!(
            validated = report.validated,
            skipped = report.skipped,
            errors = report.error_count,
            "Batch validation finished"
        );
        Ok(report)
    }
}
