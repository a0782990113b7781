//! Relief Core - Foundational types for the Relief heightmap pipeline
//!
//! This crate provides the error types that all other Relief crates depend on:
//! - `ReliefError` - IO, dependency, kernel and state failures
//! - `FormatError` - malformed heightmap data
//! - `Result` alias

mod error;

pub use error::{FormatError, ReliefError, Result};
