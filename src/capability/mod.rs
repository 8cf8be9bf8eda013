//! Capability interfaces consumed by the core
//!
//! The core never branches on provider names; it talks to two narrow
//! traits, `Transformer` (modality translation) and `Evaluator`
//! (model-graded comparison), with swappable implementations behind them.
//! Both share one error taxonomy that self-classifies for the retry layer.

pub mod dry_run;
pub mod evaluator;
pub mod gemini;
pub mod mock;
pub mod transformer;

pub use dry_run::{DryRunEvaluator, DryRunTransformer};
pub use evaluator::Evaluator;
pub use gemini::{GeminiConfig, GeminiEvaluator};
pub use mock::{MockEvaluator, MockTransformer};
pub use transformer::Transformer;

use std::time::Duration;

use crate::retry::Retryable;

/// Errors a capability call can surface
#[derive(Debug, thiserror::Error)]
pub enum CapabilityError {
    /// The call did not complete within its deadline
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Provider asked us to slow down
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    /// Non-success HTTP status from the provider
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Transport-level failure
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The input artifact cannot be processed (wrong modality, empty)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Unrecoverable content policy rejection
    #[error("Content policy rejection: {0}")]
    PolicyRejection(String),

    /// Response arrived but could not be understood
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl Retryable for CapabilityError {
    fn is_retryable(&self) -> bool {
        match self {
            CapabilityError::Timeout(_) => true,
            CapabilityError::RateLimited { .. } => true,
            CapabilityError::Api { status, .. } => *status >= 500,
            CapabilityError::Network(_) => true,
            CapabilityError::InvalidInput(_) => false,
            CapabilityError::PolicyRejection(_) => false,
            CapabilityError::InvalidResponse(_) => false,
        }
    }
}
