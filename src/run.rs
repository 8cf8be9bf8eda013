//! Run orchestration
//!
//! One seed item's full loop plus its evaluation is the unit of work.
//! Items run concurrently up to the configured limit and fail
//! independently; the run ends with a `RunSummary` persisted next to the
//! artifacts for the reporting layer.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::capability::{Evaluator, Transformer};
use crate::controller::LoopController;
use crate::domain::{
    ItemStatus, IterationRecord, LoopSpec, RunContext, SeedItem, StepStatus, contiguous_succeeded,
};
use crate::engine::EvaluationEngine;
use crate::error::{DriftError, Result};
use crate::id;
use crate::signal::AbortFlag;
use crate::store::ArtifactStore;

/// File name of the persisted run summary
pub const SUMMARY_FILE: &str = "summary.json";

/// Per-item line of the run summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemReport {
    pub item_id: String,
    pub loop_status: ItemStatus,
    pub scored: u32,
    pub unscored: u32,
    /// Pairs not yet rated (abort or partial-evaluation policy)
    pub pending: u32,
}

/// Run-level summary consumed by the reporting layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: String,
    pub pattern: String,
    pub iterations: u32,
    pub items: Vec<ItemReport>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunSummary {
    /// Items whose loop reached Completed
    pub fn completed_items(&self) -> usize {
        self.items
            .iter()
            .filter(|i| i.loop_status == ItemStatus::Completed)
            .count()
    }

    /// Total (scored, unscored) pairs across all items
    pub fn pair_totals(&self) -> (u32, u32) {
        self.items
            .iter()
            .fold((0, 0), |(s, u), i| (s + i.scored, u + i.unscored))
    }
}

/// Orchestrates generation and evaluation across items
pub struct Runner<T: Transformer + ?Sized, E: Evaluator + ?Sized> {
    controller: Arc<LoopController<T>>,
    engine: Arc<EvaluationEngine<E>>,
    store: Arc<ArtifactStore>,
    ctx: Arc<RunContext>,
}

impl<T, E> Runner<T, E>
where
    T: Transformer + ?Sized + 'static,
    E: Evaluator + ?Sized + 'static,
{
    pub fn new(
        transformer: Arc<T>,
        evaluator: Arc<E>,
        store: Arc<ArtifactStore>,
        ctx: Arc<RunContext>,
    ) -> Self {
        Self {
            controller: Arc::new(LoopController::new(
                transformer,
                store.clone(),
                ctx.clone(),
            )),
            engine: Arc::new(EvaluationEngine::new(evaluator, store.clone(), ctx.clone())),
            store,
            ctx,
        }
    }

    /// Full run: generate every item's loop, then evaluate its pairs
    pub async fn run_full(&self, seeds: Vec<SeedItem>, abort: &AbortFlag) -> Result<RunSummary> {
        let started_at = id::now();
        let semaphore = Arc::new(Semaphore::new(self.ctx.concurrency.max_items.max(1)));
        let mut tasks: JoinSet<Result<ItemReport>> = JoinSet::new();

        for seed in seeds {
            let controller = self.controller.clone();
            let engine = self.engine.clone();
            let semaphore = semaphore.clone();
            let abort = abort.clone();
            tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("semaphore never closed");
                let loop_result = controller.run_item(&seed, &abort).await?;
                let eval = engine.evaluate_item(&seed.id, &abort).await?;
                Ok(ItemReport {
                    item_id: seed.id,
                    loop_status: loop_result.status,
                    scored: eval.scored,
                    unscored: eval.unscored,
                    pending: eval.pending,
                })
            });
        }

        self.collect(tasks, started_at).await
    }

    /// Evaluate-only run against a pre-populated artifact store
    pub async fn run_evaluate_only(&self, abort: &AbortFlag) -> Result<RunSummary> {
        let started_at = id::now();
        let semaphore = Arc::new(Semaphore::new(self.ctx.concurrency.max_items.max(1)));
        let mut tasks: JoinSet<Result<ItemReport>> = JoinSet::new();

        for item_id in self.store.list_items()? {
            let engine = self.engine.clone();
            let store = self.store.clone();
            let ctx = self.ctx.clone();
            let semaphore = semaphore.clone();
            let abort = abort.clone();
            tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("semaphore never closed");
                let records = store.load_iterations(&item_id)?;
                let loop_status = derive_status(&ctx.spec, &records);
                let eval = engine.evaluate_item(&item_id, &abort).await?;
                Ok(ItemReport {
                    item_id,
                    loop_status,
                    scored: eval.scored,
                    unscored: eval.unscored,
                    pending: eval.pending,
                })
            });
        }

        self.collect(tasks, started_at).await
    }

    async fn collect(
        &self,
        mut tasks: JoinSet<Result<ItemReport>>,
        started_at: DateTime<Utc>,
    ) -> Result<RunSummary> {
        let mut items = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            let report =
                joined.map_err(|e| DriftError::Store(format!("item task failed: {}", e)))??;
            items.push(report);
        }
        items.sort_by(|a, b| a.item_id.cmp(&b.item_id));

        let summary = RunSummary {
            run_id: id::generate_run_id(),
            pattern: self.ctx.spec.pattern_string(),
            iterations: self.ctx.spec.iterations(),
            items,
            started_at,
            finished_at: id::now(),
        };
        self.store.write_json(SUMMARY_FILE, &summary)?;
        tracing::info!(
            run = %summary.run_id,
            items = summary.items.len(),
            completed = summary.completed_items(),
            "run summary persisted"
        );
        Ok(summary)
    }
}

/// Reconstruct an item's terminal loop status from its records
fn derive_status(spec: &LoopSpec, records: &[IterationRecord]) -> ItemStatus {
    let prefix = contiguous_succeeded(records);
    if prefix == spec.iterations() {
        ItemStatus::Completed
    } else if records
        .iter()
        .any(|r| r.index == prefix + 1 && r.status == StepStatus::Failed)
    {
        ItemStatus::Failed
    } else {
        ItemStatus::Aborted
    }
}
