// SPDX-License-Identifier: MIT OR Apache-2.0
//! Rewrite errors.

use texprep_graph::GraphError;
use thiserror::Error;

/// Error raised by matching, rewriting and replication
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RewriteError {
    /// A required structural match is absent
    #[error("Pattern not found: {0}")]
    PatternNotFound(String),

    /// A named template resource cannot be instantiated
    #[error("Template '{0}' could not be resolved")]
    TemplateUnresolved(String),

    /// The operation would break a graph invariant
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Palette lookup unavailable or without a match
    #[error("Color resolution failed: {0}")]
    ExternalResolutionFailed(String),

    /// Caller-supplied parameters do not fit the request
    #[error("Parameter mismatch: {0}")]
    ParameterMismatch(String),
}

impl RewriteError {
    /// Shorthand for [`RewriteError::PatternNotFound`]
    pub fn pattern(description: impl Into<String>) -> Self {
        Self::PatternNotFound(description.into())
    }

    /// Shorthand for [`RewriteError::InvariantViolation`]
    pub fn invariant(description: impl Into<String>) -> Self {
        Self::InvariantViolation(description.into())
    }

    /// Whether the error aborts the rest of the current pass
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::TemplateUnresolved(_))
    }
}

impl From<GraphError> for RewriteError {
    fn from(err: GraphError) -> Self {
        Self::InvariantViolation(err.to_string())
    }
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, RewriteError>;
