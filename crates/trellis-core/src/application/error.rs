//! Application layer errors.
//!
//! These errors represent failures while orchestrating a scaffold run.
//! Model invariant violations are `DomainError` from `crate::domain`.

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::ExpressionError;
use crate::error::ErrorCategory;

/// Errors that occur during application orchestration.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ApplicationError {
    /// No template directory or manifest under the given name.
    #[error("Template '{name}' not found (looked for {})", path.display())]
    TemplateNotFound { name: String, path: PathBuf },

    /// The manifest exists but could not be parsed or violates an invariant.
    #[error("Template '{name}' is malformed: {reason}")]
    MalformedTemplate { name: String, reason: String },

    /// A required parameter has no value and nobody can be asked for one.
    #[error("Template '{template}' requires parameter '{parameter}'")]
    MissingParameter { template: String, parameter: String },

    /// A supplied value cannot be converted to the parameter's type.
    #[error("Invalid value for parameter '{parameter}' of template '{template}': {reason}")]
    InvalidParameterValue {
        template: String,
        parameter: String,
        reason: String,
    },

    /// An expression in a manifest failed to parse or evaluate.
    #[error("Template '{template}': cannot evaluate `{expression}`: {source}")]
    Expression {
        template: String,
        expression: String,
        source: ExpressionError,
    },

    /// A template (transitively) depends on itself at the same location.
    #[error("Cyclic template dependency: {}", chain.join(" -> "))]
    CyclicDependency { chain: Vec<String> },

    /// Filesystem operation failed.
    #[error("Filesystem error at {path}: {reason}")]
    FilesystemError { path: PathBuf, reason: String },

    /// Template rendering failed.
    #[error("Template rendering failed: {reason}")]
    RenderingFailed { reason: String },

    /// Reading user input failed.
    #[error("Prompt failed: {reason}")]
    PromptFailed { reason: String },
}

impl ApplicationError {
    /// Get user-actionable suggestions.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::TemplateNotFound { path, .. } => vec![
                format!("Expected a manifest at: {}", path.display()),
                "Try: trellis list to see available templates".into(),
                "Or point at another directory with --templates".into(),
            ],
            Self::MalformedTemplate { reason, .. } => vec![
                "Fix the template manifest".into(),
                format!("Details: {reason}"),
            ],
            Self::MissingParameter { parameter, .. } => vec![
                format!("Supply it with: -p {parameter}=<value>"),
                "Or run interactively to be prompted".into(),
            ],
            Self::InvalidParameterValue { parameter, .. } => vec![
                format!("Check the value given for '{parameter}'"),
            ],
            Self::Expression { .. } => vec![
                "Check the expression in the template manifest".into(),
                "Only parameters declared earlier, `project` and `global` are in scope".into(),
            ],
            Self::CyclicDependency { .. } => vec![
                "Remove one of the dependsOn entries forming the cycle".into(),
                "Or give the nested application a different baseDir".into(),
            ],
            Self::FilesystemError { path, .. } => vec![
                format!("Failed to access: {}", path.display()),
                "Check that you have write permissions".into(),
            ],
            _ => vec!["Check the error details above".into()],
        }
    }

    /// Get error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::TemplateNotFound { .. } => ErrorCategory::NotFound,
            Self::MalformedTemplate { .. } | Self::CyclicDependency { .. } => {
                ErrorCategory::Configuration
            }
            Self::MissingParameter { .. } | Self::InvalidParameterValue { .. } => {
                ErrorCategory::Validation
            }
            Self::Expression { .. } => ErrorCategory::Expression,
            Self::FilesystemError { .. } | Self::RenderingFailed { .. } | Self::PromptFailed { .. } => {
                ErrorCategory::Internal
            }
        }
    }
}
