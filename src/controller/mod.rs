//! Loop controller module - recursive cross-modal generation.
//!
//! The controller walks one item through its transformation loop,
//! persisting every artifact and iteration record, retrying transient
//! Transformer failures, and resuming across restarts.

mod loop_controller;

pub use loop_controller::LoopController;
