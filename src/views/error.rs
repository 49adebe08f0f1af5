//! View engine error types

use thiserror::Error;

/// Template errors
#[derive(Debug, Error)]
pub enum ViewError {
    /// Template name not registered
    #[error("Template not found: {0}")]
    NotFound(String),

    /// Template parsing or rendering error
    #[error("Template error: {0}")]
    TemplateError(String),
}
