//! Application services - orchestrate use cases.
//!
//! `ScaffoldService` applies templates; `TemplateService` answers catalogue
//! queries. The remaining modules are the pieces one scaffold run is made of.

pub mod materializer;
pub mod parameter_resolver;
pub mod scaffold_service;
pub mod template_cache;
pub mod template_service;

pub use materializer::{FileAction, FileMaterializer, SkipReason};
pub use parameter_resolver::ParameterResolver;
pub use scaffold_service::{ApplyRequest, FileOutcome, ScaffoldReport, ScaffoldService};
pub use template_cache::TemplateCache;
pub use template_service::{ParameterInfo, TemplateInfo, TemplateService};
