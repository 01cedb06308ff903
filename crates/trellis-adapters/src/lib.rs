//! Infrastructure adapters for Trellis.
//!
//! This crate implements the ports defined in `trellis-core::application::ports`.
//! It contains all external dependencies and I/O operations.

pub mod filesystem;
pub mod prompt;
pub mod renderer;
pub mod template_loader;

// Re-export commonly used adapters
pub use filesystem::{LocalFilesystem, MemoryFilesystem};
#[cfg(feature = "interactive")]
pub use prompt::TerminalPrompter;
pub use prompt::{NonInteractivePrompter, ScriptedPrompter};
pub use renderer::HandlebarsRenderer;
pub use template_loader::DirectoryTemplateRepository;
