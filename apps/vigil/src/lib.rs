//! Vigil core library.
//!
//! This crate exposes programmatic APIs for selecting recently changed
//! source files, checking them against coding-standard rules, scoring
//! compliance, rendering a markdown report, and gating validation on task
//! progress.
//!
//! High-level modules:
//! - `cli`: CLI argument parsing (binary uses this).
//! - `config`: Discovery and effective configuration resolution.
//! - `select`: Candidate selection (history, modification time, full walk).
//! - `rules`: The rule registry and the individual rules.
//! - `lint`: Parallel, order-preserving evaluation and the pipeline entry.
//! - `report`: Pure markdown rendering and persistence.
//! - `gate`: Completion gate over work items.
//! - `models`: Violations, results, policy, and work items.
//! - `output`: Human/JSON printers for check/gate/rules.
//! - `logging`: `tracing` subscriber setup.
//! - `error`: The crate error type.
//! - `utils`: Supporting helpers.
pub mod cli;
pub mod config;
pub mod error;
pub mod gate;
pub mod lint;
pub mod logging;
pub mod models;
pub mod output;
pub mod report;
pub mod rules;
pub mod select;
pub mod utils;
