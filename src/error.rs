//! Error types for driftbench
//!
//! Centralized error handling using thiserror. Capability-level failures
//! (Transformer/Evaluator) have their own taxonomy in `capability` and are
//! contained per item; `DriftError` covers the infrastructure faults that
//! are allowed to abort a run.

use thiserror::Error;

/// Infrastructure-level errors for driftbench operations
#[derive(Debug, Error)]
pub enum DriftError {
    /// Item not found in the artifact store
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    /// Artifact file missing or unreadable for a recorded iteration
    #[error("Missing artifact: {0}")]
    MissingArtifact(String),

    /// Loop spec validation failed (bad pattern, zero iterations)
    #[error("Invalid loop spec: {0}")]
    InvalidSpec(String),

    /// Artifact store read/write error
    #[error("Store error: {0}")]
    Store(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for driftbench operations
pub type Result<T> = std::result::Result<T, DriftError>;
