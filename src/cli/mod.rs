//! CLI module for driftbench - command-line interface and run modes.
//!
//! Provides the main entry point with subcommands for the three run
//! modes: full run, evaluate-only, and report-only.

pub mod commands;

pub use commands::Cli;
