//! # TaskTrack Shared Library
//!
//! This crate contains the data layer shared by the TaskTrack API server:
//! database pooling and migrations, store error classification, and the
//! models (users, tasks, assignments) with their query operations.
//!
//! ## Module Organization
//!
//! - `db`: Connection pool, migration runner, and store error classification
//! - `models`: Database models and their query operations

pub mod db;
pub mod models;

/// Current version of the TaskTrack shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
