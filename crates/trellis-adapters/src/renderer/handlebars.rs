//! Handlebars rendering backend.
//!
//! Strict mode is on, so a reference to an unbound variable fails the render
//! instead of producing an empty string. Output is not HTML-escaped.

use handlebars::{Handlebars, handlebars_helper};
use tracing::{debug, instrument};

use trellis_core::{
    application::{ApplicationError, ports::TemplateRenderer},
    domain::{VariableEnvironment, casing},
    error::TrellisResult,
};

handlebars_helper!(snake_case: |s: str| casing::to_snake_case(s));
handlebars_helper!(kebab_case: |s: str| casing::to_kebab_case(s));
handlebars_helper!(pascal_case: |s: str| casing::to_pascal_case(s));
handlebars_helper!(camel_case: |s: str| casing::to_camel_case(s));

/// [`TemplateRenderer`] backed by the `handlebars` crate.
#[derive(Debug, Clone)]
pub struct HandlebarsRenderer {
    handlebars: Handlebars<'static>,
}

impl HandlebarsRenderer {
    pub fn new() -> Self {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(true);
        handlebars.set_dev_mode(false);
        handlebars.register_escape_fn(handlebars::no_escape);

        handlebars.register_helper("snake_case", Box::new(snake_case));
        handlebars.register_helper("kebab_case", Box::new(kebab_case));
        handlebars.register_helper("pascal_case", Box::new(pascal_case));
        handlebars.register_helper("camel_case", Box::new(camel_case));

        Self { handlebars }
    }
}

impl Default for HandlebarsRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer for HandlebarsRenderer {
    #[instrument(skip(self, source, env), fields(template = %name))]
    fn render(&self, name: &str, source: &str, env: &VariableEnvironment) -> TrellisResult<String> {
        let context = env.to_json();
        let rendered = self
            .handlebars
            .render_template(source, &context)
            .map_err(|e| ApplicationError::RenderingFailed {
                reason: format!("{name}: {e}"),
            })?;
        debug!(bytes = rendered.len(), "Rendered template");
        Ok(rendered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_core::domain::Value;

    fn env() -> VariableEnvironment {
        VariableEnvironment::with_roots(
            Value::from(serde_json::json!({ "group": "com.acme" })),
            Value::Null,
        )
        .with("name", "my cool-lib")
        .with("port", 8080_i64)
    }

    fn render(source: &str) -> TrellisResult<String> {
        HandlebarsRenderer::new().render("test.hbs", source, &env())
    }

    #[test]
    fn renders_bindings_and_roots() {
        assert_eq!(
            render("{{name}} on {{port}} in {{project.group}}").unwrap(),
            "my cool-lib on 8080 in com.acme"
        );
    }

    #[test]
    fn does_not_escape_html() {
        let env = VariableEnvironment::empty().with("generic", "List<String> & co");
        let out = HandlebarsRenderer::new()
            .render("t", "{{generic}}", &env)
            .unwrap();
        assert_eq!(out, "List<String> & co");
    }

    #[test]
    fn case_helpers() {
        assert_eq!(
            render("{{snake_case name}} {{kebab_case name}} {{pascal_case name}} {{camel_case name}}")
                .unwrap(),
            "my_cool_lib my-cool-lib MyCoolLib myCoolLib"
        );
    }

    #[test]
    fn unbound_variables_fail_and_name_the_source() {
        let err = render("{{missing}}").unwrap_err();
        assert!(err.to_string().contains("test.hbs"), "{err}");
    }

    #[test]
    fn syntax_errors_fail() {
        assert!(render("{{#if name}}unclosed").is_err());
    }
}
