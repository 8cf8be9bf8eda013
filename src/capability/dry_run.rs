//! Dry-run capabilities
//!
//! Placeholder captions, a blank image, and a flat rating so a full loop
//! can be exercised end-to-end without any generative backend or API key.

use async_trait::async_trait;

use crate::capability::{CapabilityError, Evaluator, Transformer};
use crate::domain::{Modality, Payload, ScoreSet};

/// A minimal valid 1x1 transparent PNG
pub const BLANK_PNG: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F,
    0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00,
    0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49,
    0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

/// Transformer that fabricates outputs instead of calling a model
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunTransformer;

impl DryRunTransformer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Transformer for DryRunTransformer {
    async fn transform(
        &self,
        input: &Payload,
        target: Modality,
        prompt: &str,
    ) -> Result<Payload, CapabilityError> {
        if input.as_bytes().is_empty() {
            return Err(CapabilityError::InvalidInput(
                "empty input payload".to_string(),
            ));
        }
        match target {
            Modality::Text => Ok(Payload::Text(format!("Placeholder caption: {}", prompt))),
            Modality::Image => Ok(Payload::Image(BLANK_PNG.to_vec())),
        }
    }
}

/// Evaluator that rates every pair with the same neutral scores
///
/// Stands in when no judge backend is configured, so dry runs still
/// produce structurally complete rating sets.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunEvaluator;

impl DryRunEvaluator {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Evaluator for DryRunEvaluator {
    async fn evaluate(
        &self,
        _left: &Payload,
        _right: &Payload,
        rubric_id: &str,
    ) -> Result<ScoreSet, CapabilityError> {
        Ok(ScoreSet::uniform(
            5.5,
            &format!("placeholder rating ({}): no judge backend configured", rubric_id),
        ))
    }
}
