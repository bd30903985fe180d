//! Error types for version-control operations.

use thiserror::Error;

/// Errors from invoking the `git` binary.
#[derive(Error, Debug)]
pub enum GitError {
    #[error("Failed to run git {operation}: {source}")]
    Spawn {
        operation: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("git {operation} failed: {stderr}")]
    Failed { operation: &'static str, stderr: String },

    #[error("Not inside a git work tree: {0}")]
    NotARepository(String),
}
