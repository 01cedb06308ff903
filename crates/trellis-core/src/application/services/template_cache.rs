//! Per-invocation memo of loaded templates.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::{application::ports::TemplateRepository, domain::Template, error::TrellisResult};

/// Loads each template at most once for the lifetime of the cache.
///
/// One cache is created per top-level scaffold run and dropped with it, so
/// independent runs never share state.
pub struct TemplateCache<'a> {
    repository: &'a dyn TemplateRepository,
    loaded: HashMap<String, Arc<Template>>,
}

impl<'a> TemplateCache<'a> {
    pub fn new(repository: &'a dyn TemplateRepository) -> Self {
        Self {
            repository,
            loaded: HashMap::new(),
        }
    }

    pub fn get(&mut self, name: &str) -> TrellisResult<Arc<Template>> {
        if let Some(template) = self.loaded.get(name) {
            debug!(template = name, "Template cache hit");
            return Ok(Arc::clone(template));
        }

        let template = Arc::new(self.repository.load(name)?);
        self.loaded.insert(name.to_string(), Arc::clone(&template));
        Ok(template)
    }

    pub fn len(&self) -> usize {
        self.loaded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty()
    }
}
