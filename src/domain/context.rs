//! Immutable run context threaded through the core
//!
//! All experiment configuration the controller and engine need travels in
//! one explicit `RunContext`, built once at startup and shared behind an
//! `Arc`. Nothing in the core reads ambient/global state.

use serde::{Deserialize, Serialize};

use crate::domain::{LoopSpec, Modality, PairKind};
use crate::retry::RetryPolicy;

/// Per-modality prompt templates for transformation steps
///
/// Templates may reference `{item}` and `{iteration}`; rendering is plain
/// substitution. Prompt wording carries no contract beyond being handed to
/// the Transformer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptSet {
    /// Prompt for steps producing text (e.g. captioning an image)
    pub to_text: String,
    /// Prompt for steps producing an image (e.g. rendering a caption)
    pub to_image: String,
}

impl PromptSet {
    /// Template for a step targeting the given modality
    pub fn template_for(&self, target: Modality) -> &str {
        match target {
            Modality::Text => &self.to_text,
            Modality::Image => &self.to_image,
        }
    }

    /// Render a step prompt for one item and iteration index
    pub fn render(&self, target: Modality, item_id: &str, iteration: u32) -> String {
        self.template_for(target)
            .replace("{item}", item_id)
            .replace("{iteration}", &iteration.to_string())
    }
}

impl Default for PromptSet {
    fn default() -> Self {
        Self {
            to_text: "Describe this image completely and faithfully.".to_string(),
            to_image: "Generate an image depicting exactly this description.".to_string(),
        }
    }
}

/// Rubric prompt ids, selected per pair kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RubricSelection {
    pub cross_modal: String,
    pub intra_text: String,
    pub intra_image: String,
}

impl RubricSelection {
    /// Rubric id for pairs of the given kind
    pub fn rubric_for(&self, kind: PairKind) -> &str {
        match kind {
            PairKind::CrossModal => &self.cross_modal,
            PairKind::IntraModalText => &self.intra_text,
            PairKind::IntraModalImage => &self.intra_image,
        }
    }
}

impl Default for RubricSelection {
    fn default() -> Self {
        Self {
            cross_modal: "cross-modal-v1".to_string(),
            intra_text: "intra-text-v1".to_string(),
            intra_image: "intra-image-v1".to_string(),
        }
    }
}

/// What to do with a Failed item's already-generated artifacts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PartialEvalPolicy {
    /// Do not evaluate Failed items at all
    Skip,
    /// Evaluate pairs over the contiguous Succeeded prefix of the chain
    CompletedPrefix,
}

impl Default for PartialEvalPolicy {
    fn default() -> Self {
        PartialEvalPolicy::Skip
    }
}

/// Concurrency limits for a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Concurrency {
    /// Items processed in parallel
    pub max_items: usize,
    /// Comparison pairs evaluated in parallel within one item
    pub max_pairs: usize,
}

impl Default for Concurrency {
    fn default() -> Self {
        Self {
            max_items: 4,
            max_pairs: 4,
        }
    }
}

/// The immutable experiment context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunContext {
    pub spec: LoopSpec,
    pub prompts: PromptSet,
    /// Retry policy for Transformer calls
    pub transform_retry: RetryPolicy,
    /// Retry policy for Evaluator calls
    pub eval_retry: RetryPolicy,
    pub rubrics: RubricSelection,
    pub partial_eval: PartialEvalPolicy,
    pub concurrency: Concurrency,
}

impl RunContext {
    /// Minimal context for the given spec, defaults elsewhere
    pub fn new(spec: LoopSpec) -> Self {
        Self {
            spec,
            prompts: PromptSet::default(),
            transform_retry: RetryPolicy::default(),
            eval_retry: RetryPolicy::default(),
            rubrics: RubricSelection::default(),
            partial_eval: PartialEvalPolicy::default(),
            concurrency: Concurrency::default(),
        }
    }
}
