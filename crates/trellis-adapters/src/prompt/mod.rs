//! [`Prompter`](trellis_core::application::ports::Prompter) adapters.

mod non_interactive;
mod scripted;
#[cfg(feature = "interactive")]
mod terminal;

pub use non_interactive::NonInteractivePrompter;
pub use scripted::ScriptedPrompter;
#[cfg(feature = "interactive")]
pub use terminal::TerminalPrompter;
