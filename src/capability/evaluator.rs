//! The model-graded comparison capability

use async_trait::async_trait;

use crate::capability::CapabilityError;
use crate::domain::{Payload, ScoreSet};

/// Grades the semantic correspondence of two artifacts
///
/// A successful call returns the raw five-score rubric result; the
/// evaluation engine owns contract validation and normalization, so
/// implementations just report what the judge said.
#[async_trait]
pub trait Evaluator: Send + Sync {
    /// Compare `left` (earlier artifact) against `right` (later artifact)
    /// under the rubric named by `rubric_id`.
    async fn evaluate(
        &self,
        left: &Payload,
        right: &Payload,
        rubric_id: &str,
    ) -> Result<ScoreSet, CapabilityError>;
}
