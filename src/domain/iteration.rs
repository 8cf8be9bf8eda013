//! Iteration records and per-item loop outcomes
//!
//! One `IterationRecord` is written per transformation step, in strict
//! index order, and never mutated afterwards. Together with the seed they
//! are the durable state the controller resumes from.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::Artifact;

/// Outcome of a single transformation step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Succeeded,
    Failed,
}

/// Durable record of one loop step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationRecord {
    pub item_id: String,
    /// Index of the artifact this step produced (1-based; 0 is the seed)
    pub index: u32,
    /// Payload reference of the step's input artifact
    pub input: String,
    /// Payload reference of the step's output artifact, if it succeeded
    pub output: Option<String>,
    /// Total attempts made, including the final one
    pub attempts: u32,
    pub status: StepStatus,
    /// Terminal error description for a Failed step
    pub error: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Terminal state of one item's loop for this run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    /// All steps Succeeded; full chain available for evaluation
    Completed,
    /// A step failed permanently or exhausted its retry budget
    Failed,
    /// Run abort stopped the loop before completion; state is resumable
    Aborted,
}

impl ItemStatus {
    /// Whether the generation chain can be extended by a later run
    pub fn is_resumable(&self) -> bool {
        matches!(self, ItemStatus::Aborted)
    }
}

/// Result of running one item's loop
///
/// `artifacts` is the contiguous chain of persisted artifacts starting at
/// the seed; for a Completed loop it spans indices 0..=N.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopResult {
    pub status: ItemStatus,
    pub artifacts: Vec<Artifact>,
}

impl LoopResult {
    /// Whether evaluation can run on the full chain
    pub fn is_complete(&self) -> bool {
        self.status == ItemStatus::Completed
    }
}

/// Highest step index K such that steps 1..=K are all recorded Succeeded
/// with no gaps. 0 means no completed steps; resume starts at K+1.
pub fn contiguous_succeeded(records: &[IterationRecord]) -> u32 {
    let mut next = 1u32;
    loop {
        let done = records
            .iter()
            .any(|r| r.index == next && r.status == StepStatus::Succeeded);
        if !done {
            return next - 1;
        }
        next += 1;
    }
}
