use thiserror::Error;

use super::expression::ExpressionError;

/// Errors raised by the template model and the expression language.
///
/// All variants are `Clone + PartialEq` so they can be compared in tests
/// and carried inside application errors.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    // ========================================================================
    // Template configuration invariants
    // ========================================================================
    #[error("Invalid template: {0}")]
    InvalidTemplate(String),

    #[error("Parameter id cannot be blank")]
    BlankParameterId,

    #[error("Duplicate parameter id '{id}'")]
    DuplicateParameter { id: String },

    #[error("Parameter id '{id}' is reserved for the {id} root")]
    ReservedParameterId { id: String },

    #[error("Enum parameter '{parameter}' declares no values")]
    EmptyEnumValues { parameter: String },

    #[error("Enum parameter '{parameter}' declares a blank value")]
    BlankEnumValue { parameter: String },

    #[error("Absolute paths not allowed: {path}")]
    AbsolutePathNotAllowed { path: String },

    // ========================================================================
    // Values
    // ========================================================================
    #[error("Invalid value for parameter '{parameter}': {reason}")]
    InvalidParameterValue { parameter: String, reason: String },

    #[error("Expression error: {0}")]
    Expression(#[from] ExpressionError),
}

impl DomainError {
    /// Get user-actionable suggestions for fixing this error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::InvalidTemplate(msg) => vec![
                "Check the template manifest".into(),
                format!("Details: {msg}"),
            ],
            Self::DuplicateParameter { id } => vec![
                format!("Parameter '{id}' is declared more than once"),
                "Rename or remove one of the declarations".into(),
            ],
            Self::ReservedParameterId { id } => vec![
                format!("'{id}' always refers to the read-only {id} configuration"),
                "Rename the parameter".into(),
            ],
            Self::EmptyEnumValues { parameter } | Self::BlankEnumValue { parameter } => vec![
                format!("List the allowed values of '{parameter}' under `values`"),
            ],
            Self::InvalidParameterValue { parameter, .. } => vec![
                format!("Pass a different value with -p {parameter}=<value>"),
            ],
            Self::Expression(ExpressionError::UnboundVariable { name }) => vec![
                format!("'{name}' is not a parameter of this template or of its callers"),
                "Parameters can only refer to parameters declared before them".into(),
            ],
            Self::Expression(_) => vec!["Check the expression syntax in the manifest".into()],
            _ => vec!["See documentation for more details".into()],
        }
    }

    /// Error category for CLI display styling.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Expression(_) => ErrorCategory::Expression,
            _ => ErrorCategory::Validation,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Expression,
}
