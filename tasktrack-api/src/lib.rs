//! # TaskTrack API Server Library
//!
//! This library provides the core functionality for the TaskTrack API server.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: API error type and HTTP response mapping
//! - `response`: Uniform response envelope
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod response;
pub mod routes;
