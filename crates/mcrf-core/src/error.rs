//! Unified error types for the MCRF workspace
//!
//! This module provides a common error type [`McrfError`] that can represent
//! errors from any part of the system. Domain-specific error types (such as
//! the LP solver errors in `mcrf-algo`) convert into `McrfError` so callers
//! can handle failures uniformly at API boundaries.
//!
//! # Example
//!
//! ```ignore
//! use mcrf_core::{McrfError, McrfResult};
//!
//! fn bound_for(path: &str) -> McrfResult<f64> {
//!     let graph = load_instance(path)?;
//!     let result = solve_hm(&graph)?;
//!     Ok(result.objective_value)
//! }
//! ```

use thiserror::Error;

/// Unified error type for all MCRF operations.
#[derive(Error, Debug)]
pub enum McrfError {
    /// I/O errors (file access)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Instance parsing errors
    #[error("Parse error: {0}")]
    Parse(String),

    /// Data validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Linear relaxation solver failures (infeasible, unbounded, numerical)
    #[error("Solver error: {0}")]
    Solver(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Graph structure errors (self loops, dangling endpoints)
    #[error("Graph error: {0}")]
    Graph(String),

    /// Generic errors (for wrapping external errors)
    #[error("{0}")]
    Other(String),
}

/// Convenience type alias for Results using McrfError.
pub type McrfResult<T> = Result<T, McrfError>;

impl From<anyhow::Error> for McrfError {
    fn from(err: anyhow::Error) -> Self {
        McrfError::Other(err.to_string())
    }
}

impl From<String> for McrfError {
    fn from(s: String) -> Self {
        McrfError::Other(s)
    }
}

impl From<&str> for McrfError {
    fn from(s: &str) -> Self {
        McrfError::Other(s.to_string())
    }
}

impl From<serde_json::Error> for McrfError {
    fn from(err: serde_json::Error) -> Self {
        McrfError::Parse(err.to_string())
    }
}
