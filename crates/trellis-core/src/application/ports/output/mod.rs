//! Driven (output) ports - implemented by infrastructure.
//!
//! These traits define what the application needs from external systems.
//! The `trellis-adapters` crate provides implementations.

use std::path::{Path, PathBuf};

use crate::domain::{Template, VariableEnvironment};
use crate::error::TrellisResult;

/// Port for filesystem operations.
///
/// Used both to read template sources and to write generated files.
///
/// Implemented by:
/// - `trellis_adapters::filesystem::LocalFilesystem` (production)
/// - `trellis_adapters::filesystem::MemoryFilesystem` (testing)
#[cfg_attr(test, mockall::automock)]
pub trait Filesystem: Send + Sync {
    /// Check if path exists (file or directory).
    fn exists(&self, path: &Path) -> bool;

    /// Create a directory and all parent directories.
    fn create_dir_all(&self, path: &Path) -> TrellisResult<()>;

    /// Read a whole file.
    fn read_file(&self, path: &Path) -> TrellisResult<Vec<u8>>;

    /// Create or truncate `path` and write `content`.
    fn write_file(&self, path: &Path, content: &[u8]) -> TrellisResult<()>;

    /// Append `content` to `path`, creating it when absent.
    fn append_file(&self, path: &Path, content: &[u8]) -> TrellisResult<()>;

    /// All regular files below `root`, as sorted paths relative to `root`.
    fn list_files(&self, root: &Path) -> TrellisResult<Vec<PathBuf>>;
}

/// Port for template lookup.
///
/// Implemented by:
/// - `trellis_adapters::template_loader::DirectoryTemplateRepository`
#[cfg_attr(test, mockall::automock)]
pub trait TemplateRepository: Send + Sync {
    /// Load and validate the template called `name`.
    ///
    /// # Errors
    /// - `TemplateNotFound`: no such template (the error lists the path tried)
    /// - `MalformedTemplate`: the manifest failed to parse or violates an invariant
    fn load(&self, name: &str) -> TrellisResult<Template>;

    /// Names of all templates in the repository, sorted.
    fn list(&self) -> TrellisResult<Vec<String>>;
}

/// Port for text templating.
///
/// Implemented by:
/// - `trellis_adapters::renderer::HandlebarsRenderer`
#[cfg_attr(test, mockall::automock)]
pub trait TemplateRenderer: Send + Sync {
    /// Render `source` with every binding of `env` in scope.
    ///
    /// `name` identifies the source in error messages.
    fn render(&self, name: &str, source: &str, env: &VariableEnvironment) -> TrellisResult<String>;
}

/// A question put to the user while resolving a parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptRequest {
    pub label: String,
    pub help: Option<String>,
    /// Display form of the default, if any.
    pub default: Option<String>,
    /// Allowed answers, for enum parameters.
    pub choices: Vec<String>,
    /// A blank answer is rejected unless a default exists.
    pub required: bool,
}

impl PromptRequest {
    /// `true` when a blank answer leaves the parameter unset, so a choice
    /// list must offer one.
    pub fn accepts_blank(&self) -> bool {
        !self.required && self.default.is_none()
    }
}

/// Port for user interaction.
///
/// Implemented by:
/// - `trellis_adapters::prompt::TerminalPrompter` (dialoguer)
/// - `trellis_adapters::prompt::NonInteractivePrompter` (CI)
/// - `trellis_adapters::prompt::ScriptedPrompter` (tests)
#[cfg_attr(test, mockall::automock)]
pub trait Prompter: Send + Sync {
    /// Whether a human can be asked. When false, `prompt` and `confirm` are
    /// never called.
    fn is_interactive(&self) -> bool;

    /// Ask for a value. A blank answer means "no input".
    fn prompt(&self, request: &PromptRequest) -> TrellisResult<String>;

    /// Ask a yes/no question.
    fn confirm(&self, question: &str) -> TrellisResult<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_optional_prompts_without_default_accept_blank() {
        let optional = PromptRequest {
            label: "kind".into(),
            choices: vec!["app".into(), "lib".into()],
            ..Default::default()
        };
        assert!(optional.accepts_blank());

        let with_default = PromptRequest {
            default: Some("app".into()),
            ..optional.clone()
        };
        assert!(!with_default.accepts_blank());

        let required = PromptRequest {
            required: true,
            ..optional
        };
        assert!(!required.accepts_blank());
    }
}
