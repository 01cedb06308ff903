// ============================================================================
//  CLEAN MODULE BOUNDARIES
// ============================================================================

//! Core domain layer for Trellis.
//!
//! Pure logic with no I/O: the template model, the value and environment
//! types, and the expression language. Filesystem access, rendering and user
//! interaction are reached through ports defined in the application layer.
//!
//! ## Hexagonal Architecture Compliance
//!
//! - **No async**: domain logic is synchronous
//! - **No I/O**: no filesystem, network or terminal calls
//! - **Immutable entities**: templates and environments are never mutated in place
pub mod casing;
pub mod entities;
pub mod environment;
pub mod error;
pub mod expression;
pub mod value;

mod validation;

pub use entities::{
    common::{RelativePath, normalize, resolve_within},
    template::{
        ConflictPolicy, FileExpansion, MANIFEST_FILE, Parameter, ParameterKind, TEMPLATE_SUFFIX,
        Template, TemplateConfig, TemplateConfigBuilder, TemplateReference, has_template_suffix,
        strip_template_suffix,
    },
};
pub use environment::{GLOBAL_ROOT, PROJECT_ROOT, VariableEnvironment, is_root};
pub use error::{DomainError, ErrorCategory};
pub use expression::ExpressionError;
pub use validation::DomainValidator;
pub use value::Value;

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // Model + expressions together
    // ========================================================================

    fn kotlin_lib() -> TemplateConfig {
        TemplateConfig::builder()
            .description("Kotlin library")
            .parameter(
                Parameter::new("name", ParameterKind::String)
                    .with_display_name("Project name")
                    .with_validation("it.length > 2"),
            )
            .parameter(Parameter::new("pkg", ParameterKind::String).with_default("name.snakeCase()"))
            .dependency(TemplateReference::new("gitignore").with_parameter("name", "name + '-core'"))
            .file(FileExpansion::copy("Main.kt.hbs", "src/${pkg}/Main.kt"))
            .file(FileExpansion::glob("docs/**").when("project.isLibrary"))
            .build()
            .unwrap()
    }

    #[test]
    fn default_expression_sees_earlier_parameters() {
        let config = kotlin_lib();
        let env = VariableEnvironment::empty().with("name", "my-lib");
        let pkg = config.parameter("pkg").unwrap();

        let value = expression::eval(pkg.default.as_deref().unwrap(), &env).unwrap();
        assert_eq!(value, Value::from("my_lib"));
    }

    #[test]
    fn validation_binds_candidate_as_it() {
        let config = kotlin_lib();
        let rule = config.parameter("name").unwrap().validation.clone().unwrap();

        let short = VariableEnvironment::empty().with("it", "ab");
        let long = VariableEnvironment::empty().with("it", "abc");
        assert!(!expression::eval_bool(&rule, &short).unwrap());
        assert!(expression::eval_bool(&rule, &long).unwrap());
    }

    #[test]
    fn destination_paths_interpolate() {
        let config = kotlin_lib();
        let env = VariableEnvironment::empty().with("pkg", "my_lib");
        let to = config.files()[0].to.as_deref().unwrap();

        assert_eq!(
            expression::eval_in_string(to, &env).unwrap(),
            "src/my_lib/Main.kt"
        );
    }

    #[test]
    fn expression_errors_convert_into_domain_errors() {
        let err: DomainError = expression::eval("missing", &VariableEnvironment::empty())
            .unwrap_err()
            .into();
        assert_eq!(err.category(), ErrorCategory::Expression);
        assert!(!err.suggestions().is_empty());
    }
}
