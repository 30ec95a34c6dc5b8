//! Error types for logdog-template.

use thiserror::Error;

/// Errors raised while building an [`Expander`](crate::Expander).
#[derive(Debug, Error)]
pub enum TemplateError {
    /// The keyword pattern failed to compile.
    #[error("keyword pattern error: {0}")]
    Pattern(#[from] regex::Error),
}
