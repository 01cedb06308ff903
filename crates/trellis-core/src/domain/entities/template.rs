//! Template aggregate: the parsed `template.toml` plus where it lives.
//!
//! ```text
//! Template (Aggregate Root)
//! ├── name            unique registry key
//! ├── root            read-only content directory
//! └── TemplateConfig
//!      ├── Vec<Parameter>          (ids unique, declaration order)
//!      │    └── ParameterKind      String | Int | Enum { values }
//!      ├── Vec<TemplateReference>  dependencies, applied first
//!      └── Vec<FileExpansion>      what to copy or render
//! ```
//!
//! Expressions (defaults, validations, conditions, dependency parameter
//! maps) are stored as unparsed text and only evaluated during scaffolding.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::domain::{
    entities::common::RelativePath, environment::is_root, error::DomainError, value::Value,
};

/// File name of the manifest inside a template directory.
pub const MANIFEST_FILE: &str = "template.toml";

/// Suffix marking a source file as a template to be rendered.
pub const TEMPLATE_SUFFIX: &str = ".hbs";

// ============================================================================
// Template
// ============================================================================

/// A loaded template. Immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    name: String,
    root: PathBuf,
    config: TemplateConfig,
}

impl Template {
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>, config: TemplateConfig) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
            config,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Directory holding the manifest and the template's source files.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &TemplateConfig {
        &self.config
    }
}

// ============================================================================
// TemplateConfig
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateConfig {
    description: Option<String>,
    parameters: Vec<Parameter>,
    dependencies: Vec<TemplateReference>,
    files: Vec<FileExpansion>,
}

impl TemplateConfig {
    pub fn builder() -> TemplateConfigBuilder {
        TemplateConfigBuilder::default()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Parameters in declaration order.
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn parameter(&self, id: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.id == id)
    }

    pub fn dependencies(&self) -> &[TemplateReference] {
        &self.dependencies
    }

    pub fn files(&self) -> &[FileExpansion] {
        &self.files
    }
}

/// Builder for [`TemplateConfig`]. Invariants are checked in [`build`](Self::build).
#[derive(Debug, Default)]
pub struct TemplateConfigBuilder {
    description: Option<String>,
    parameters: Vec<Parameter>,
    dependencies: Vec<TemplateReference>,
    files: Vec<FileExpansion>,
}

impl TemplateConfigBuilder {
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn dependency(mut self, dependency: TemplateReference) -> Self {
        self.dependencies.push(dependency);
        self
    }

    pub fn file(mut self, file: FileExpansion) -> Self {
        self.files.push(file);
        self
    }

    /// Consume the builder and construct the config.
    ///
    /// # Errors
    ///
    /// - `BlankParameterId` / `DuplicateParameter` for bad ids
    /// - `ReservedParameterId` for an id naming the `project` or `global` root
    /// - `EmptyEnumValues` / `BlankEnumValue` for bad enum declarations
    /// - `InvalidTemplate` for a dependency without a name or a file without a source
    pub fn build(self) -> Result<TemplateConfig, DomainError> {
        let mut seen = HashSet::new();
        for parameter in &self.parameters {
            parameter.validate()?;
            if is_root(&parameter.id) {
                return Err(DomainError::ReservedParameterId {
                    id: parameter.id.clone(),
                });
            }
            if !seen.insert(parameter.id.as_str()) {
                return Err(DomainError::DuplicateParameter {
                    id: parameter.id.clone(),
                });
            }
        }

        if self.dependencies.iter().any(|d| d.name.trim().is_empty()) {
            return Err(DomainError::InvalidTemplate(
                "dependency name cannot be blank".into(),
            ));
        }

        if self.files.iter().any(|f| f.from.trim().is_empty()) {
            return Err(DomainError::InvalidTemplate(
                "file `from` cannot be blank".into(),
            ));
        }

        Ok(TemplateConfig {
            description: self.description,
            parameters: self.parameters,
            dependencies: self.dependencies,
            files: self.files,
        })
    }
}

// ============================================================================
// Parameters
// ============================================================================

/// A named input a template needs before its files can be generated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub id: String,
    pub display_name: String,
    pub help: Option<String>,
    pub required: bool,
    /// Expression evaluated lazily, in the environment accumulated so far.
    pub default: Option<String>,
    /// Boolean expression with the candidate value bound as `it`.
    pub validation: Option<String>,
    pub kind: ParameterKind,
}

impl Parameter {
    /// A required parameter whose display name is its id.
    pub fn new(id: impl Into<String>, kind: ParameterKind) -> Self {
        let id = id.into();
        Self {
            display_name: id.clone(),
            id,
            help: None,
            required: true,
            default: None,
            validation: None,
            kind,
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn with_default(mut self, expr: impl Into<String>) -> Self {
        self.default = Some(expr.into());
        self
    }

    pub fn with_validation(mut self, expr: impl Into<String>) -> Self {
        self.validation = Some(expr.into());
        self
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    fn validate(&self) -> Result<(), DomainError> {
        if self.id.trim().is_empty() {
            return Err(DomainError::BlankParameterId);
        }
        if let ParameterKind::Enum { values } = &self.kind {
            if values.is_empty() {
                return Err(DomainError::EmptyEnumValues {
                    parameter: self.id.clone(),
                });
            }
            if values.iter().any(|v| v.trim().is_empty()) {
                return Err(DomainError::BlankEnumValue {
                    parameter: self.id.clone(),
                });
            }
        }
        Ok(())
    }

    /// Convert `value` to this parameter's kind.
    ///
    /// Strings are parsed for `Int`; enum membership is checked for `Enum`.
    /// `Null` is passed through untouched (an absent optional value).
    pub fn coerce(&self, value: Value) -> Result<Value, DomainError> {
        let invalid = |reason: String| DomainError::InvalidParameterValue {
            parameter: self.id.clone(),
            reason,
        };

        match (&self.kind, value) {
            (_, Value::Null) => Ok(Value::Null),
            (ParameterKind::String, Value::Str(s)) => Ok(Value::Str(s)),
            (ParameterKind::String, v @ (Value::Int(_) | Value::Bool(_))) => {
                Ok(Value::Str(v.to_string()))
            }
            (ParameterKind::Int, Value::Int(i)) => Ok(Value::Int(i)),
            (ParameterKind::Int, Value::Str(s)) => s
                .trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| invalid(format!("'{s}' is not an integer"))),
            (ParameterKind::Enum { values }, v @ (Value::Str(_) | Value::Int(_))) => {
                let text = v.to_string();
                if values.iter().any(|allowed| *allowed == text) {
                    Ok(Value::Str(text))
                } else {
                    Err(invalid(format!(
                        "'{text}' is not one of: {}",
                        values.join(", ")
                    )))
                }
            }
            (kind, other) => Err(invalid(format!(
                "expected {kind}, got {}",
                other.type_name()
            ))),
        }
    }
}

/// The type of a parameter's value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterKind {
    String,
    Int,
    Enum { values: Vec<String> },
}

impl ParameterKind {
    /// Allowed values for enum parameters, empty otherwise.
    pub fn allowed_values(&self) -> &[String] {
        match self {
            Self::Enum { values } => values,
            _ => &[],
        }
    }
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String => f.write_str("string"),
            Self::Int => f.write_str("int"),
            Self::Enum { .. } => f.write_str("enum"),
        }
    }
}

// ============================================================================
// Dependencies
// ============================================================================

/// Another template applied before this one's files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateReference {
    pub name: String,
    /// Applied relative to the caller's base directory.
    pub base_dir: RelativePath,
    /// Parameter id → expression, evaluated in the caller's environment.
    pub parameters: Vec<(String, String)>,
}

impl TemplateReference {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_dir: RelativePath::current(),
            parameters: Vec::new(),
        }
    }

    pub fn with_base_dir(mut self, base_dir: RelativePath) -> Self {
        self.base_dir = base_dir;
        self
    }

    pub fn with_parameter(mut self, id: impl Into<String>, expr: impl Into<String>) -> Self {
        self.parameters.push((id.into(), expr.into()));
        self
    }
}

// ============================================================================
// Files
// ============================================================================

/// What to do when a destination file already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictPolicy {
    /// Leave existing files untouched.
    Keep,
    /// Replace existing files (after confirmation unless forced).
    #[default]
    Overwrite,
    /// Append to existing files, creating them when absent.
    Append,
}

impl FromStr for ConflictPolicy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "keep" | "skip" => Ok(Self::Keep),
            "overwrite" => Ok(Self::Overwrite),
            "append" => Ok(Self::Append),
            _ => Err(DomainError::InvalidTemplate(format!(
                "unknown conflict policy '{s}' (expected keep, overwrite or append)"
            ))),
        }
    }
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keep => f.write_str("keep"),
            Self::Overwrite => f.write_str("overwrite"),
            Self::Append => f.write_str("append"),
        }
    }
}

/// One entry of the manifest's `files` list.
///
/// With `to` set, `from` names a single source file. Without it, `from` is a
/// glob over the template root and every match keeps its relative path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileExpansion {
    pub from: String,
    pub to: Option<String>,
    pub is_template: Option<bool>,
    pub condition: Option<String>,
    pub on_conflict: ConflictPolicy,
}

impl FileExpansion {
    /// Copy `from` to `to`.
    pub fn copy(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: Some(to.into()),
            is_template: None,
            condition: None,
            on_conflict: ConflictPolicy::default(),
        }
    }

    /// Expand `pattern` against the template root.
    pub fn glob(pattern: impl Into<String>) -> Self {
        Self {
            from: pattern.into(),
            to: None,
            is_template: None,
            condition: None,
            on_conflict: ConflictPolicy::default(),
        }
    }

    pub fn template(mut self, is_template: bool) -> Self {
        self.is_template = Some(is_template);
        self
    }

    pub fn when(mut self, condition: impl Into<String>) -> Self {
        self.condition = Some(condition.into());
        self
    }

    pub fn on_conflict(mut self, policy: ConflictPolicy) -> Self {
        self.on_conflict = policy;
        self
    }

    /// Whether `source` should be rendered. An explicit flag wins; otherwise
    /// files ending in [`TEMPLATE_SUFFIX`] are templates.
    pub fn is_template_for(&self, source: &Path) -> bool {
        self.is_template.unwrap_or_else(|| has_template_suffix(source))
    }
}

pub fn has_template_suffix(path: &Path) -> bool {
    path.to_str().is_some_and(|s| s.ends_with(TEMPLATE_SUFFIX))
}

/// Drop a trailing [`TEMPLATE_SUFFIX`] from `path`, if present.
pub fn strip_template_suffix(path: &Path) -> PathBuf {
    match path.to_str().and_then(|s| s.strip_suffix(TEMPLATE_SUFFIX)) {
        Some(stripped) if !stripped.is_empty() && !stripped.ends_with('/') => {
            PathBuf::from(stripped)
        }
        _ => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enum_param(id: &str, values: &[&str]) -> Parameter {
        Parameter::new(
            id,
            ParameterKind::Enum {
                values: values.iter().map(|v| v.to_string()).collect(),
            },
        )
    }

    #[test]
    fn builder_keeps_declaration_order() {
        let config = TemplateConfig::builder()
            .parameter(Parameter::new("name", ParameterKind::String))
            .parameter(Parameter::new("port", ParameterKind::Int))
            .parameter(enum_param("kind", &["app", "lib"]))
            .build()
            .unwrap();

        let ids: Vec<_> = config.parameters().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["name", "port", "kind"]);
        assert_eq!(config.parameter("port").unwrap().kind, ParameterKind::Int);
        assert!(config.parameter("missing").is_none());
    }

    #[test]
    fn builder_rejects_duplicate_ids() {
        let result = TemplateConfig::builder()
            .parameter(Parameter::new("name", ParameterKind::String))
            .parameter(Parameter::new("name", ParameterKind::Int))
            .build();

        assert_eq!(
            result.unwrap_err(),
            DomainError::DuplicateParameter { id: "name".into() }
        );
    }

    #[test]
    fn builder_rejects_root_names_as_ids() {
        for root in ["project", "global"] {
            let result = TemplateConfig::builder()
                .parameter(Parameter::new(root, ParameterKind::String))
                .build();
            assert_eq!(
                result.unwrap_err(),
                DomainError::ReservedParameterId { id: root.into() }
            );
        }
    }

    #[test]
    fn builder_rejects_blank_ids_and_bad_enums() {
        let blank = TemplateConfig::builder()
            .parameter(Parameter::new("  ", ParameterKind::String))
            .build();
        assert_eq!(blank.unwrap_err(), DomainError::BlankParameterId);

        let empty = TemplateConfig::builder()
            .parameter(enum_param("kind", &[]))
            .build();
        assert!(matches!(empty, Err(DomainError::EmptyEnumValues { .. })));

        let blank_value = TemplateConfig::builder()
            .parameter(enum_param("kind", &["app", " "]))
            .build();
        assert!(matches!(blank_value, Err(DomainError::BlankEnumValue { .. })));
    }

    #[test]
    fn builder_rejects_blank_file_source() {
        let result = TemplateConfig::builder()
            .file(FileExpansion::copy("", "out"))
            .build();
        assert!(matches!(result, Err(DomainError::InvalidTemplate(_))));
    }

    #[test]
    fn coercion_by_kind() {
        let port = Parameter::new("port", ParameterKind::Int);
        assert_eq!(port.coerce(Value::from("8080")).unwrap(), Value::Int(8080));
        assert!(matches!(
            port.coerce(Value::from("eighty")),
            Err(DomainError::InvalidParameterValue { .. })
        ));

        let name = Parameter::new("name", ParameterKind::String);
        assert_eq!(name.coerce(Value::Int(3)).unwrap(), Value::from("3"));

        let kind = enum_param("kind", &["app", "lib"]);
        assert_eq!(kind.coerce(Value::from("lib")).unwrap(), Value::from("lib"));
        assert!(kind.coerce(Value::from("plugin")).is_err());
        assert_eq!(kind.coerce(Value::Null).unwrap(), Value::Null);
    }

    #[test]
    fn template_inference_from_suffix() {
        let inferred = FileExpansion::copy("README.md.hbs", "README.md");
        assert!(inferred.is_template_for(Path::new("README.md.hbs")));
        assert!(!inferred.is_template_for(Path::new("logo.png")));

        let forced = FileExpansion::copy("a.hbs", "a").template(false);
        assert!(!forced.is_template_for(Path::new("a.hbs")));
    }

    #[test]
    fn strip_suffix() {
        assert_eq!(
            strip_template_suffix(Path::new("src/main.rs.hbs")),
            PathBuf::from("src/main.rs")
        );
        assert_eq!(
            strip_template_suffix(Path::new("src/main.rs")),
            PathBuf::from("src/main.rs")
        );
        assert_eq!(strip_template_suffix(Path::new(".hbs")), PathBuf::from(".hbs"));
    }

    #[test]
    fn conflict_policy_parsing() {
        assert_eq!("keep".parse::<ConflictPolicy>().unwrap(), ConflictPolicy::Keep);
        assert_eq!(
            "Append".parse::<ConflictPolicy>().unwrap(),
            ConflictPolicy::Append
        );
        assert!("merge".parse::<ConflictPolicy>().is_err());
        assert_eq!(ConflictPolicy::default(), ConflictPolicy::Overwrite);
    }
}
