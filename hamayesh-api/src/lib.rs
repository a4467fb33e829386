//! # Hamayesh API Server Library
//!
//! HTTP surface of the conference task engine: the task widget's
//! conference-change endpoint, category task edits with assignment
//! propagation, and the lifecycle deletes that keep assignments consistent.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod routes;
