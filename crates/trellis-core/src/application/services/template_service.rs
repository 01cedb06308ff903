//! Template Service - template catalogue queries.
//!
//! Separated from ScaffoldService for single responsibility.

use serde::Serialize;
use tracing::{instrument, warn};

use crate::{
    application::ports::TemplateRepository,
    domain::{Template, TemplateConfig},
    error::TrellisResult,
};

/// Information about a template for display purposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateInfo {
    pub name: String,
    pub description: Option<String>,
    pub parameters: Vec<ParameterInfo>,
    pub dependencies: Vec<String>,
    pub files: usize,
    /// Set when the manifest could not be loaded.
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterInfo {
    pub id: String,
    pub kind: String,
    pub required: bool,
    pub default: Option<String>,
}

impl TemplateInfo {
    fn from_config(name: &str, config: &TemplateConfig) -> Self {
        Self {
            name: name.to_string(),
            description: config.description().map(str::to_string),
            parameters: config
                .parameters()
                .iter()
                .map(|p| ParameterInfo {
                    id: p.id.clone(),
                    kind: p.kind.to_string(),
                    required: p.required,
                    default: p.default.clone(),
                })
                .collect(),
            dependencies: config
                .dependencies()
                .iter()
                .map(|d| d.name.clone())
                .collect(),
            files: config.files().len(),
            error: None,
        }
    }

    fn broken(name: &str, error: String) -> Self {
        Self {
            name: name.to_string(),
            description: None,
            parameters: Vec::new(),
            dependencies: Vec::new(),
            files: 0,
            error: Some(error),
        }
    }
}

/// Service for template operations.
pub struct TemplateService {
    repository: Box<dyn TemplateRepository>,
}

impl TemplateService {
    /// Create a new template service.
    pub fn new(repository: Box<dyn TemplateRepository>) -> Self {
        Self { repository }
    }

    /// Load one template by name.
    pub fn get(&self, name: &str) -> TrellisResult<Template> {
        self.repository.load(name)
    }

    /// Describe every template in the repository.
    ///
    /// A template whose manifest fails to load is still listed, with
    /// `error` set, so one broken template does not hide the others.
    #[instrument(skip_all)]
    pub fn list(&self) -> TrellisResult<Vec<TemplateInfo>> {
        let names = self.repository.list()?;

        Ok(names
            .iter()
            .map(|name| match self.repository.load(name) {
                Ok(template) => TemplateInfo::from_config(name, template.config()),
                Err(e) => {
                    warn!(template = %name, error = %e, "Skipping unloadable template");
                    TemplateInfo::broken(name, e.to_string())
                }
            })
            .collect())
    }
}
