//! Compute layer for query processing and algorithms.
//!
//! This module separates computation and query logic from point storage.
//! It provides:
//! - The k-d tree index and distance conversions
//! - Input validation shared by every entry point
//! - The kilometer-based query engine

pub mod queries;
pub mod spatial;
pub mod validation;

pub use queries::QueryEngine;
