//! driftbench - a cross-modal telephone-game benchmark
//!
//! A seed artifact (image or text) is repeatedly translated between
//! modalities by a generative backend; every intermediate artifact is
//! persisted, and a model-graded judge scores comparison pairs on a fixed
//! five-dimension rubric to quantify how much meaning survives the loop.

pub mod capability;
pub mod controller;
pub mod domain;
pub mod engine;
pub mod error;
pub mod id;
pub mod retry;
pub mod run;
pub mod signal;
pub mod store;

pub use error::{DriftError, Result};
