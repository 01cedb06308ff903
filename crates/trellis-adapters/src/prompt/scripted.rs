use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use trellis_core::{
    application::{
        ApplicationError,
        ports::{PromptRequest, Prompter},
    },
    error::{TrellisError, TrellisResult},
};

/// Interactive prompter that replays canned answers.
///
/// Answers are consumed in order; running out is a `PromptFailed` error.
/// Clones share the queues and the transcript.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPrompter {
    state: Arc<Mutex<Script>>,
}

#[derive(Debug, Default)]
struct Script {
    answers: VecDeque<String>,
    confirmations: VecDeque<bool>,
    asked: Vec<PromptRequest>,
}

impl ScriptedPrompter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a text answer.
    pub fn answer(self, answer: impl Into<String>) -> Self {
        if let Ok(mut script) = self.state.lock() {
            script.answers.push_back(answer.into());
        }
        self
    }

    /// Queue a yes/no answer.
    pub fn confirmation(self, yes: bool) -> Self {
        if let Ok(mut script) = self.state.lock() {
            script.confirmations.push_back(yes);
        }
        self
    }

    /// Every prompt shown so far.
    pub fn asked(&self) -> Vec<PromptRequest> {
        self.state
            .lock()
            .map(|script| script.asked.clone())
            .unwrap_or_default()
    }

    fn script(&self) -> TrellisResult<std::sync::MutexGuard<'_, Script>> {
        self.state.lock().map_err(|_| TrellisError::Internal {
            message: "scripted prompter lock poisoned".into(),
        })
    }
}

impl Prompter for ScriptedPrompter {
    fn is_interactive(&self) -> bool {
        true
    }

    fn prompt(&self, request: &PromptRequest) -> TrellisResult<String> {
        let mut script = self.script()?;
        script.asked.push(request.clone());
        script.answers.pop_front().ok_or_else(|| {
            ApplicationError::PromptFailed {
                reason: format!("no scripted answer left for '{}'", request.label),
            }
            .into()
        })
    }

    fn confirm(&self, question: &str) -> TrellisResult<bool> {
        self.script()?.confirmations.pop_front().ok_or_else(|| {
            ApplicationError::PromptFailed {
                reason: format!("no scripted confirmation left for '{question}'"),
            }
            .into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replays_answers_in_order() {
        let prompter = ScriptedPrompter::new().answer("a").answer("b");
        let request = PromptRequest {
            label: "name".into(),
            ..Default::default()
        };

        assert_eq!(prompter.prompt(&request).unwrap(), "a");
        assert_eq!(prompter.prompt(&request).unwrap(), "b");
        assert!(prompter.prompt(&request).is_err());
        assert_eq!(prompter.asked().len(), 3);
    }

    #[test]
    fn confirmations_are_separate() {
        let prompter = ScriptedPrompter::new().confirmation(false);
        assert!(!prompter.confirm("overwrite?").unwrap());
        assert!(prompter.confirm("again?").is_err());
    }
}
