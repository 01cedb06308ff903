use console::{Term, style};
use dialoguer::{Confirm, Input, Select, theme::ColorfulTheme};

use trellis_core::{
    application::{
        ApplicationError,
        ports::{PromptRequest, Prompter},
    },
    error::{TrellisError, TrellisResult},
};

/// Prompts on the terminal with `dialoguer`.
///
/// Prompts are drawn on stderr so stdout stays clean for reports.
pub struct TerminalPrompter {
    term: Term,
    theme: ColorfulTheme,
}

impl TerminalPrompter {
    pub fn new() -> Self {
        Self {
            term: Term::stderr(),
            theme: ColorfulTheme::default(),
        }
    }
}

impl Default for TerminalPrompter {
    fn default() -> Self {
        Self::new()
    }
}

fn prompt_failed(e: dialoguer::Error) -> TrellisError {
    ApplicationError::PromptFailed {
        reason: e.to_string(),
    }
    .into()
}

/// Label of the blank entry offered for optional choices.
const NO_CHOICE: &str = "(none)";

/// Items shown by the choice list, and the index selected initially.
///
/// Optional choices without a default get a leading blank entry that is
/// selected first, so leaving the parameter unset is a single keypress.
fn choice_items(request: &PromptRequest) -> (Vec<String>, usize) {
    let blank = request.accepts_blank();
    let mut items = Vec::with_capacity(request.choices.len() + usize::from(blank));
    if blank {
        items.push(NO_CHOICE.to_string());
    }
    items.extend(request.choices.iter().cloned());

    let selected = request
        .default
        .as_ref()
        .and_then(|d| items.iter().position(|c| c == d))
        .unwrap_or(0);
    (items, selected)
}

/// Answer for the item at `index` of [`choice_items`]; the blank entry maps
/// to an empty answer.
fn choice_answer(request: &PromptRequest, index: usize) -> String {
    match (request.accepts_blank(), index) {
        (true, 0) => String::new(),
        (true, i) => request.choices[i - 1].clone(),
        (false, i) => request.choices[i].clone(),
    }
}

impl Prompter for TerminalPrompter {
    fn is_interactive(&self) -> bool {
        self.term.is_term()
    }

    fn prompt(&self, request: &PromptRequest) -> TrellisResult<String> {
        if let Some(help) = &request.help {
            // Best effort; a failed hint line should not abort the prompt.
            let _ = self.term.write_line(&style(help).dim().to_string());
        }

        if !request.choices.is_empty() {
            let (items, selected) = choice_items(request);
            let index = Select::with_theme(&self.theme)
                .with_prompt(&request.label)
                .items(&items)
                .default(selected)
                .interact_on(&self.term)
                .map_err(prompt_failed)?;
            return Ok(choice_answer(request, index));
        }

        let label = match &request.default {
            Some(default) => format!("{} [{}]", request.label, default),
            None => request.label.clone(),
        };
        Input::<String>::with_theme(&self.theme)
            .with_prompt(label)
            .allow_empty(true)
            .interact_text_on(&self.term)
            .map_err(prompt_failed)
    }

    fn confirm(&self, question: &str) -> TrellisResult<bool> {
        Confirm::with_theme(&self.theme)
            .with_prompt(question)
            .default(false)
            .interact_on(&self.term)
            .map_err(prompt_failed)
    }
}
