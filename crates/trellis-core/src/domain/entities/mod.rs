pub mod common;
pub mod template;

pub use crate::domain::DomainError;
pub use common::RelativePath;
pub use template::{Template, TemplateConfig};
