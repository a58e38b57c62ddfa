//! Common types and utilities shared across Satya crates.
//!
//! This crate defines the shared error taxonomy and observability helpers
//! used throughout the Satya workspace. It is intentionally lightweight so
//! that every crate can depend on it without heavy transitive costs.
//!
//! # Overview
//!
//! - [`SatyaError`] and [`Result`]: Shared error handling
//! - [`observability`]: Centralised tracing/logging initialisation
//! - [`ErrorKind`]: Coarse classification used by front-ends to pick a
//!   status code or exit message
//!
//! # Examples
//!
//! ```rust
//! use satya_common::{ErrorKind, SatyaError};
//!
//! let err = SatyaError::Validation("input text is empty".into());
//! assert_eq!(err.kind(), ErrorKind::Input);
//! assert_eq!(err.to_string(), "Invalid input: input text is empty");
//! ```

pub mod observability;

/// Coarse classification of a [`SatyaError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller supplied something unusable; nothing went over the network.
    Input,
    /// The upstream analysis service failed or answered with garbage.
    Upstream,
    /// Local configuration is incomplete or invalid.
    Config,
}

/// Error types used across the Satya system.
#[derive(thiserror::Error, Debug)]
pub enum SatyaError {
    /// The input text was empty or otherwise unusable.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// A required credential was missing or blank.
    #[error("Missing credential: {0}")]
    Credential(String),

    /// The analysis service answered with a non-success status, or could not
    /// be reached at all (`status` is `None` then).
    #[error("{}", service_message(.status, .message))]
    Service { status: Option<u16>, message: String },

    /// The analysis service answered, but not with the expected JSON report.
    #[error("Malformed response from analysis service: {0}")]
    MalformedResponse(String),

    /// A source (URL or file) could not be turned into text.
    #[error("Could not read source: {0}")]
    Source(String),

    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

fn service_message(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("Analysis service error ({code}): {message}"),
        None => format!("Analysis service unreachable: {message}"),
    }
}

impl SatyaError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SatyaError::Validation(_) | SatyaError::Credential(_) | SatyaError::Source(_) => {
                ErrorKind::Input
            }
            SatyaError::Service { .. } | SatyaError::MalformedResponse(_) => ErrorKind::Upstream,
            SatyaError::Config(_) => ErrorKind::Config,
        }
    }
}

/// Convenient alias for results that use [`SatyaError`].
pub type Result<T> = std::result::Result<T, SatyaError>;
