//! The modality-transformation capability

use async_trait::async_trait;

use crate::capability::CapabilityError;
use crate::domain::{Modality, Payload};

/// Translates an artifact into the opposite modality
///
/// Implementations are stateless between calls; each call carries the full
/// input payload and the rendered stage prompt. Failures self-classify
/// through `CapabilityError` so the caller's retry policy can act on them.
#[async_trait]
pub trait Transformer: Send + Sync {
    /// Produce a `target`-modality payload from `input`.
    ///
    /// `input.modality()` and `target` are always opposite; callers derive
    /// both from the loop spec's cycle.
    async fn transform(
        &self,
        input: &Payload,
        target: Modality,
        prompt: &str,
    ) -> Result<Payload, CapabilityError>;
}
