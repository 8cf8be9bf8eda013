//! Per-item loop execution
//!
//! Each item runs the state machine
//! `Init -> Generating -> (Succeeded | Retrying) -> ... -> Completed | Failed`.
//! Steps are strictly sequential: step k's input is artifact k-1. The
//! artifact file is written before its iteration record, so a record's
//! existence is the commit point for a step; a torn write without a record
//! is regenerated on resume.

use std::sync::Arc;

use crate::capability::Transformer;
use crate::domain::{
    Artifact, ItemStatus, IterationRecord, LoopResult, RunContext, SeedItem, StepStatus,
    contiguous_succeeded,
};
use crate::error::{DriftError, Result};
use crate::id;
use crate::retry::with_retry;
use crate::signal::AbortFlag;
use crate::store::ArtifactStore;

/// Drives one item's transformation loop against a Transformer
pub struct LoopController<T: Transformer + ?Sized> {
    transformer: Arc<T>,
    store: Arc<ArtifactStore>,
    ctx: Arc<RunContext>,
}

impl<T: Transformer + ?Sized> LoopController<T> {
    pub fn new(transformer: Arc<T>, store: Arc<ArtifactStore>, ctx: Arc<RunContext>) -> Self {
        Self {
            transformer,
            store,
            ctx,
        }
    }

    /// Execute (or resume) the loop for one seed item.
    ///
    /// Capability failures never escape: they end in a terminal
    /// `LoopResult` status. Only store faults return `Err`, and those are
    /// fatal to the run as a whole.
    pub async fn run_item(&self, seed: &SeedItem, abort: &AbortFlag) -> Result<LoopResult> {
        let spec = &self.ctx.spec;

        if seed.payload.modality() != spec.seed_modality() {
            tracing::error!(
                item = %seed.id,
                expected = %spec.seed_modality(),
                got = %seed.payload.modality(),
                "seed modality does not match loop pattern"
            );
            return Ok(LoopResult {
                status: ItemStatus::Failed,
                artifacts: Vec::new(),
            });
        }

        // Init: iteration 0 is the registered seed
        let seed_artifact = self.store.register_seed(&seed.id, &seed.payload)?;

        let existing = self.store.load_iterations(&seed.id)?;
        let resume_from = contiguous_succeeded(&existing) + 1;

        // A step already recorded Failed is terminal for the item; records
        // are immutable, so only external cleanup can re-arm it
        if existing
            .iter()
            .any(|r| r.index == resume_from && r.status == StepStatus::Failed)
        {
            tracing::warn!(item = %seed.id, step = resume_from, "item previously failed, skipping");
            return Ok(LoopResult {
                status: ItemStatus::Failed,
                artifacts: self.load_prefix(&seed.id, resume_from - 1)?,
            });
        }

        let mut chain = if resume_from > 1 {
            tracing::info!(item = %seed.id, from = resume_from, "resuming loop");
            self.load_prefix(&seed.id, resume_from - 1)?
        } else {
            vec![seed_artifact]
        };

        let mut current = match chain.last() {
            Some(last) if last.index > 0 => self.store.load_payload(last)?,
            _ => seed.payload.clone(),
        };

        for step in resume_from..=spec.iterations() {
            if abort.is_aborted() {
                tracing::info!(item = %seed.id, step, "abort requested, leaving item resumable");
                return Ok(LoopResult {
                    status: ItemStatus::Aborted,
                    artifacts: chain,
                });
            }

            // Generating: one capability call under the retry policy
            let target = spec.target_for_step(step);
            let prompt = self.ctx.prompts.render(target, &seed.id, step);
            let input_ref = chain.last().expect("chain starts at seed").file_name.clone();
            let started_at = id::now();

            let outcome = with_retry(&self.ctx.transform_retry, "transform", |_| {
                self.transformer.transform(&current, target, &prompt)
            })
            .await;

            match outcome {
                Ok((payload, attempts)) => {
                    let artifact = self.store.write_artifact(&seed.id, step, &payload)?;
                    self.store.write_iteration(&IterationRecord {
                        item_id: seed.id.clone(),
                        index: step,
                        input: input_ref,
                        output: Some(artifact.file_name.clone()),
                        attempts,
                        status: StepStatus::Succeeded,
                        error: None,
                        started_at,
                        finished_at: id::now(),
                    })?;
                    tracing::debug!(item = %seed.id, step, attempts, target = %target, "step succeeded");
                    chain.push(artifact);
                    current = payload;
                }
                Err(failure) => {
                    self.store.write_iteration(&IterationRecord {
                        item_id: seed.id.clone(),
                        index: step,
                        input: input_ref,
                        output: None,
                        attempts: failure.attempts,
                        status: StepStatus::Failed,
                        error: Some(failure.to_string()),
                        started_at,
                        finished_at: id::now(),
                    })?;
                    tracing::warn!(
                        item = %seed.id,
                        step,
                        attempts = failure.attempts,
                        error = %failure,
                        "step failed, item terminal"
                    );
                    return Ok(LoopResult {
                        status: ItemStatus::Failed,
                        artifacts: chain,
                    });
                }
            }
        }

        Ok(LoopResult {
            status: ItemStatus::Completed,
            artifacts: chain,
        })
    }

    /// Load artifacts 0..=upto; every index recorded Succeeded must still
    /// be on disk, anything less is store corruption
    fn load_prefix(&self, item_id: &str, upto: u32) -> Result<Vec<Artifact>> {
        let chain = self.store.load_chain(item_id, &self.ctx.spec)?;
        let have = chain.len() as u32;
        if have < upto + 1 {
            return Err(DriftError::MissingArtifact(format!(
                "{}: records cover steps through {} but only {} artifacts on disk",
                item_id, upto, have
            )));
        }
        Ok(chain.into_iter().take(upto as usize + 1).collect())
    }
}
