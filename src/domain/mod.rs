//! Domain types for driftbench
//!
//! This module contains all core domain types:
//! - Artifact/Modality/Payload: the elements of a generation chain
//! - LoopSpec: the modality-cycle state table driving a loop
//! - IterationRecord/ItemStatus/LoopResult: durable per-step state
//! - ComparisonPair/PairKind: derived comparison targets
//! - Score/ScoreSet/RatingRecord: the five-score rubric contract
//! - RunContext: the immutable experiment context

pub mod artifact;
pub mod context;
pub mod iteration;
pub mod loop_spec;
pub mod pair;
pub mod rating;

pub use artifact::{Artifact, Modality, Payload, SeedItem};
pub use context::{Concurrency, PartialEvalPolicy, PromptSet, RubricSelection, RunContext};
pub use iteration::{ItemStatus, IterationRecord, LoopResult, StepStatus, contiguous_succeeded};
pub use loop_spec::LoopSpec;
pub use pair::{ComparisonPair, PairKind};
pub use rating::{RatingOutcome, RatingRecord, Score, ScoreSet, SCORE_MAX, SCORE_MIN};
