//! Errors surfaced to the calling agent.

use crate::guard::GuardError;
use crate::reader::ReadError;
use std::path::PathBuf;
use thiserror::Error;

/// Failure of a single tool invocation.
///
/// Messages of wrapped errors are passed through unchanged.
#[derive(Error, Debug)]
pub enum ToolError {
    /// The requested path resolves outside the sandbox root.
    #[error("Access denied: {0} is outside the allowed directory")]
    AccessDenied(PathBuf),
    /// The path could not be resolved.
    #[error(transparent)]
    Guard(#[from] GuardError),
    /// A filesystem call failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// The operation does not apply to the target.
    #[error("{0}")]
    InvalidOperation(String),
    /// Content could not be read or extracted.
    #[error(transparent)]
    Read(#[from] ReadError),
}
