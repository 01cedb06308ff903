//! Application layer for Trellis.
//!
//! This layer contains:
//! - **Services**: use case orchestration (ScaffoldService, TemplateService)
//! - **Ports**: interface definitions (traits) for external dependencies
//! - **Errors**: application-specific error types
//!
//! The application layer coordinates the domain layer; model rules and the
//! expression language live in `crate::domain`.

pub mod error;
pub mod ports;
pub mod services;

pub use services::{
    ApplyRequest, FileAction, FileOutcome, ScaffoldReport, ScaffoldService, SkipReason,
    TemplateInfo, TemplateService,
};

pub use ports::{Filesystem, PromptRequest, Prompter, TemplateRenderer, TemplateRepository};

pub use error::ApplicationError;
