//! Evaluation engine module - pairwise drift scoring.
//!
//! Enumerates the comparison pairs a completed loop requires, drives the
//! Evaluator capability for each, validates the five-score contract, and
//! persists one RatingRecord per pair.

mod evaluation;
mod pairs;

pub use evaluation::{EvaluationEngine, ItemEvaluation};
pub use pairs::enumerate_pairs;
