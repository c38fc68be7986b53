/*!
 * Error types for the sublayout engine.
 *
 * This module contains custom error types for the different parts of the engine,
 * using the thiserror crate for ergonomic error definitions.
 *
 * Only configuration problems are fatal. Collaborator failures are recovered
 * locally by the orchestrator and never reach the caller of `layout()`.
 */

use thiserror::Error;

/// Errors raised while validating a layout configuration
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    /// The style configuration cannot produce any layout
    #[error("Invalid layout configuration: {0}")]
    Configuration(String),
}

/// Errors reported by external collaborators (tokenizers, face samplers, fonts, frames)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CollaboratorError {
    /// The capability could not be constructed or is not installed
    #[error("{name} unavailable: {reason}")]
    Unavailable {
        /// Collaborator name (strategy name, detector name, font path)
        name: String,
        /// Why it is unavailable
        reason: String,
    },

    /// The capability did not answer within its time budget
    #[error("{name} exceeded its {budget_ms}ms budget")]
    Timeout {
        /// Collaborator name
        name: String,
        /// Budget that was exceeded, in milliseconds
        budget_ms: u64,
    },

    /// The capability was available but failed on this input
    #[error("Collaborator failed: {0}")]
    Failed(String),
}

impl CollaboratorError {
    /// Shorthand for an `Unavailable` error
    pub fn unavailable(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Main application error type that wraps all other errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a file operation
    #[error("File error: {0}")]
    File(String),

    /// Error from layout configuration
    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),

    /// Any other error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::Unknown(error.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::File(error.to_string())
    }
}
