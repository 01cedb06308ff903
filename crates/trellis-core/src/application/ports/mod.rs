//! Application ports (traits) for external dependencies.
//!
//! In hexagonal architecture, ports define interfaces that the application
//! needs from the outside world. Adapters in `trellis-adapters` implement these.
//!
//! ## Port Types
//!
//! - **Driven (Output) Ports**: called by the application, implemented by infrastructure
//!   - `Filesystem`: file operations on template sources and destinations
//!   - `TemplateRepository`: template lookup by name
//!   - `TemplateRenderer`: text templating
//!   - `Prompter`: user interaction
//!
//! - **Driving (Input) Ports**: the services in `application::services`

pub mod output;

pub use output::{Filesystem, PromptRequest, Prompter, TemplateRenderer, TemplateRepository};

#[cfg(test)]
pub use output::{MockFilesystem, MockPrompter, MockTemplateRenderer, MockTemplateRepository};
