//! Trellis Core - Hexagonal Architecture Implementation
//!
//! This crate provides the domain and application layers for the Trellis
//! scaffold template engine, following hexagonal (ports and adapters) architecture.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │           trellis-cli (CLI)             │
//! │     (Implements Driving Ports)          │
//! └──────────────────┬──────────────────────┘
//!                    │ calls
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Application Services            │
//! │   (ScaffoldService, TemplateService)    │
//! │  resolver · materializer · cache        │
//! └──────────────────┬──────────────────────┘
//!                    │ uses
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │      Application Ports (Traits)         │
//! │ Filesystem · TemplateRepository         │
//! │ TemplateRenderer · Prompter             │
//! └──────────────────┬──────────────────────┘
//!                    │ implemented by
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │    trellis-adapters (Infrastructure)    │
//! │ LocalFilesystem, HandlebarsRenderer ... │
//! └─────────────────────────────────────────┘
//!                    │
//!                    ▼
//! ┌─────────────────────────────────────────┐
//! │         Domain Layer (Pure Logic)       │
//! │ Template · Value · VariableEnvironment  │
//! │ expression (lexer → AST → evaluator)    │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use trellis_core::prelude::*;
//!
//! let service = ScaffoldService::new(repository, renderer, filesystem, prompter);
//! let report = service.apply_template(
//!     ApplyRequest::new("kotlin-lib", "./my-lib").parameter("name", "my-lib"),
//! )?;
//! ```

pub mod domain;

pub mod application;

pub mod error;

// Public API - what external crates should use
pub mod prelude {
    pub use crate::application::{
        ApplyRequest, FileAction, ScaffoldReport, ScaffoldService, SkipReason, TemplateInfo,
        TemplateService,
        ports::{Filesystem, PromptRequest, Prompter, TemplateRenderer, TemplateRepository},
    };
    pub use crate::domain::{
        ConflictPolicy, FileExpansion, Parameter, ParameterKind, Template, TemplateConfig,
        TemplateReference, Value, VariableEnvironment,
    };
    pub use crate::error::{TrellisError, TrellisResult};
}

// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
