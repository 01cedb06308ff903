use trellis_core::{
    application::{
        ApplicationError,
        ports::{PromptRequest, Prompter},
    },
    error::TrellisResult,
};

/// Prompter for unattended runs (CI, piped input, `--non-interactive`).
///
/// Parameters fall back to their defaults and overwrites are not confirmed.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonInteractivePrompter;

impl NonInteractivePrompter {
    pub fn new() -> Self {
        Self
    }
}

impl Prompter for NonInteractivePrompter {
    fn is_interactive(&self) -> bool {
        false
    }

    fn prompt(&self, request: &PromptRequest) -> TrellisResult<String> {
        Err(ApplicationError::PromptFailed {
            reason: format!("cannot ask for '{}' in non-interactive mode", request.label),
        }
        .into())
    }

    fn confirm(&self, question: &str) -> TrellisResult<bool> {
        Err(ApplicationError::PromptFailed {
            reason: format!("cannot confirm '{question}' in non-interactive mode"),
        }
        .into())
    }
}
