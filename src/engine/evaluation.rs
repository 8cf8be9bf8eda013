//! Pairwise evaluation of a loop's artifact chain
//!
//! The engine produces raw per-pair RatingRecords and nothing else; score
//! fusion and trends belong to the reporting layer. A response failing the
//! five-score contract is retried like a transient capability fault; once
//! the budget is gone the pair is recorded as an Unscored sentinel instead
//! of failing its sibling pairs.

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::Semaphore;

use crate::capability::{CapabilityError, Evaluator};
use crate::domain::{
    Artifact, ComparisonPair, PartialEvalPolicy, RatingOutcome, RatingRecord, RunContext,
    contiguous_succeeded,
};
use crate::engine::pairs::enumerate_pairs;
use crate::error::{DriftError, Result};
use crate::id;
use crate::retry::{Retryable, with_retry};
use crate::signal::AbortFlag;
use crate::store::ArtifactStore;

/// Evaluator-side failure: either the capability itself failed, or its
/// response broke the scoring contract. Contract violations are retryable
/// by policy; capability errors keep their own classification.
#[derive(Debug, thiserror::Error)]
enum EvalError {
    #[error(transparent)]
    Capability(#[from] CapabilityError),

    #[error("score contract violation: {0}")]
    Contract(String),
}

impl Retryable for EvalError {
    fn is_retryable(&self) -> bool {
        match self {
            EvalError::Capability(e) => e.is_retryable(),
            EvalError::Contract(_) => true,
        }
    }
}

/// How one pair ended up after an evaluation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PairResult {
    Scored,
    Unscored,
    /// Not rated in this pass (abort); resumable later
    Pending,
}

/// Final tally for one item's rating set
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ItemEvaluation {
    pub item_id: String,
    pub scored: u32,
    pub unscored: u32,
    /// Pairs left unrated by abort or by the partial-evaluation policy
    pub pending: u32,
    /// True when the item's loop was not Completed (degraded rating set)
    pub partial: bool,
}

impl ItemEvaluation {
    /// Whether every required pair carries a rating record
    pub fn is_final(&self) -> bool {
        self.pending == 0
    }
}

/// Drives pairwise evaluation for completed (or, by policy, partial) items
pub struct EvaluationEngine<E: Evaluator + ?Sized> {
    evaluator: Arc<E>,
    store: Arc<ArtifactStore>,
    ctx: Arc<RunContext>,
}

impl<E: Evaluator + ?Sized> EvaluationEngine<E> {
    pub fn new(evaluator: Arc<E>, store: Arc<ArtifactStore>, ctx: Arc<RunContext>) -> Self {
        Self {
            evaluator,
            store,
            ctx,
        }
    }

    /// Evaluate every outstanding pair for one item.
    ///
    /// Pairs already rated on disk are kept as-is (idempotent re-runs);
    /// within the item, outstanding pairs run concurrently up to the
    /// configured limit. Only store faults return `Err`.
    pub async fn evaluate_item(&self, item_id: &str, abort: &AbortFlag) -> Result<ItemEvaluation> {
        let spec = &self.ctx.spec;
        let records = self.store.load_iterations(item_id)?;
        let prefix = contiguous_succeeded(&records);
        let complete = prefix == spec.iterations();

        if !complete && self.ctx.partial_eval == PartialEvalPolicy::Skip {
            tracing::info!(item = item_id, prefix, "loop incomplete, skipping evaluation");
            let (scored, unscored) = self.existing_tally(item_id)?;
            return Ok(ItemEvaluation {
                item_id: item_id.to_string(),
                scored,
                unscored,
                pending: 0,
                partial: true,
            });
        }

        let artifact_count = prefix + 1;
        let pairs = enumerate_pairs(item_id, spec, artifact_count);

        let artifacts = self.store.load_chain(item_id, spec)?;
        if (artifacts.len() as u32) < artifact_count {
            return Err(DriftError::MissingArtifact(format!(
                "{}: records cover {} artifacts but only {} on disk",
                item_id,
                artifact_count,
                artifacts.len()
            )));
        }

        // keep ratings from earlier passes, evaluate only the rest
        let existing: HashMap<ComparisonPair, RatingOutcome> = self
            .store
            .load_ratings(item_id)?
            .into_iter()
            .map(|r| (r.pair.clone(), r.outcome))
            .collect();

        let mut scored = 0u32;
        let mut unscored = 0u32;
        let mut todo = Vec::new();
        for pair in pairs {
            match existing.get(&pair) {
                Some(RatingOutcome::Scored { .. }) => scored += 1,
                Some(RatingOutcome::Unscored { .. }) => unscored += 1,
                None => todo.push(pair),
            }
        }

        let semaphore = Arc::new(Semaphore::new(self.ctx.concurrency.max_pairs.max(1)));
        let results = join_all(todo.into_iter().map(|pair| {
            let semaphore = semaphore.clone();
            let artifacts = &artifacts;
            async move {
                let _permit = semaphore.acquire().await.expect("semaphore never closed");
                self.evaluate_pair(pair, artifacts, abort).await
            }
        }))
        .await;

        let mut pending = 0u32;
        for result in results {
            match result? {
                PairResult::Scored => scored += 1,
                PairResult::Unscored => unscored += 1,
                PairResult::Pending => pending += 1,
            }
        }

        if unscored > 0 {
            tracing::warn!(
                item = item_id,
                unscored,
                "rating set degraded: some pairs exhausted their retry budget"
            );
        }

        Ok(ItemEvaluation {
            item_id: item_id.to_string(),
            scored,
            unscored,
            pending,
            partial: !complete,
        })
    }

    async fn evaluate_pair(
        &self,
        pair: ComparisonPair,
        artifacts: &[Artifact],
        abort: &AbortFlag,
    ) -> Result<PairResult> {
        if abort.is_aborted() {
            return Ok(PairResult::Pending);
        }

        let left = self.store.load_payload(&artifacts[pair.left as usize])?;
        let right = self.store.load_payload(&artifacts[pair.right as usize])?;
        let rubric = self.ctx.rubrics.rubric_for(pair.kind);

        let outcome = with_retry(&self.ctx.eval_retry, "evaluate", |_| {
            let (left, right) = (&left, &right);
            async move {
                let scores = self
                    .evaluator
                    .evaluate(left, right, rubric)
                    .await
                    .map_err(EvalError::Capability)?;
                scores.validate().map_err(EvalError::Contract)?;
                Ok::<_, EvalError>(scores.normalized())
            }
        })
        .await;

        let (result, record_outcome) = match outcome {
            Ok((scores, attempts)) => {
                tracing::debug!(
                    item = %pair.item_id,
                    pair = %pair.file_stem(),
                    attempts,
                    "pair scored"
                );
                (PairResult::Scored, RatingOutcome::Scored { scores })
            }
            Err(failure) => {
                tracing::warn!(
                    item = %pair.item_id,
                    pair = %pair.file_stem(),
                    attempts = failure.attempts,
                    error = %failure,
                    "recording unscored sentinel"
                );
                (
                    PairResult::Unscored,
                    RatingOutcome::Unscored {
                        reason: failure.to_string(),
                    },
                )
            }
        };

        self.store.write_rating(&RatingRecord {
            item_id: pair.item_id.clone(),
            pair,
            outcome: record_outcome,
            computed_at: id::now(),
        })?;

        Ok(result)
    }

    fn existing_tally(&self, item_id: &str) -> Result<(u32, u32)> {
        let mut scored = 0;
        let mut unscored = 0;
        for rating in self.store.load_ratings(item_id)? {
            match rating.outcome {
                RatingOutcome::Scored { .. } => scored += 1,
                RatingOutcome::Unscored { .. } => unscored += 1,
            }
        }
        Ok((scored, unscored))
    }
}
