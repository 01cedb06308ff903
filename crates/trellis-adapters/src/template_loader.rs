//! Filesystem-based template repository.
//!
//! Resolves a template name to `<templates_dir>/<name>/template.toml`, parses
//! the manifest and converts it into a domain [`Template`].
//!
//! # Directory layout expected
//!
//! ```text
//! templates/
//! ├── kotlin-lib/
//! │   ├── template.toml        ← manifest (required)
//! │   ├── README.md.hbs
//! │   └── src/
//! │       └── Main.kt.hbs
//! └── gitignore/
//!     ├── template.toml
//!     └── .gitignore
//! ```
//!
//! # `template.toml` format
//!
//! ```toml
//! description = "Kotlin library"
//!
//! [parameters.name]
//! type       = "string"           # string | int | enum
//! name       = "Project name"     # optional display name
//! help       = "Used for the package"
//! required   = true               # default true
//! default    = "'demo'"           # expression, evaluated lazily
//! validation = "it.length > 2"    # `it` is the candidate value
//!
//! [parameters.kind]
//! type   = "enum"
//! values = ["app", "lib"]
//!
//! [[dependsOn]]
//! name       = "gitignore"
//! baseDir    = "."
//! parameters = { name = "name + '-core'" }
//!
//! [[files]]
//! from       = "README.md.hbs"
//! to         = "README.md"        # omit to treat `from` as a glob
//! isTemplate = true               # default: inferred from `.hbs`
//! condition  = "kind == 'lib'"
//! onConflict = "keep"             # keep | overwrite | append
//! ```

use std::{
    fmt,
    marker::PhantomData,
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::{
    Deserialize, Deserializer,
    de::{MapAccess, Visitor},
};
use tracing::{debug, instrument};

use trellis_core::{
    application::{ApplicationError, ports::Filesystem, ports::TemplateRepository},
    domain::{
        DomainValidator, FileExpansion, MANIFEST_FILE, Parameter, ParameterKind, RelativePath,
        Template, TemplateConfig, TemplateReference,
    },
    error::TrellisResult,
};

use crate::filesystem::LocalFilesystem;

// ── Manifest types ────────────────────────────────────────────────────────────

/// Deserialised representation of a `template.toml` file.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct TemplateManifest {
    description: Option<String>,
    #[serde(default)]
    parameters: OrderedTable<ParameterEntry>,
    #[serde(default)]
    depends_on: Vec<DependencyEntry>,
    #[serde(default)]
    files: Vec<FileEntry>,
}

/// One `[parameters.<id>]` table.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ParameterEntry {
    #[serde(rename = "type")]
    kind: KindEntry,
    values: Option<Vec<String>>,
    name: Option<String>,
    help: Option<String>,
    required: Option<bool>,
    default: Option<DefaultEntry>,
    validation: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum KindEntry {
    String,
    Int,
    Enum,
}

/// Defaults are expressions, but plain TOML integers and booleans are
/// accepted as their literal form.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DefaultEntry {
    Expression(String),
    Int(i64),
    Bool(bool),
}

impl DefaultEntry {
    fn into_expression(self) -> String {
        match self {
            Self::Expression(expr) => expr,
            Self::Int(i) => i.to_string(),
            Self::Bool(b) => b.to_string(),
        }
    }
}

/// One `[[dependsOn]]` entry.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct DependencyEntry {
    name: String,
    base_dir: Option<String>,
    #[serde(default)]
    parameters: OrderedTable<String>,
}

/// One `[[files]]` entry.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct FileEntry {
    from: String,
    to: Option<String>,
    is_template: Option<bool>,
    condition: Option<String>,
    on_conflict: Option<String>,
}

/// A TOML table decoded as key/value pairs in document order.
#[derive(Debug)]
struct OrderedTable<T>(Vec<(String, T)>);

impl<T> Default for OrderedTable<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for OrderedTable<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TableVisitor<T>(PhantomData<T>);

        impl<'de, T: Deserialize<'de>> Visitor<'de> for TableVisitor<T> {
            type Value = OrderedTable<T>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a table")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, T>()? {
                    entries.push(entry);
                }
                Ok(OrderedTable(entries))
            }
        }

        deserializer.deserialize_map(TableVisitor(PhantomData))
    }
}

// ── Conversion ────────────────────────────────────────────────────────────────

impl TemplateManifest {
    fn into_config(self) -> Result<TemplateConfig, String> {
        let mut builder = TemplateConfig::builder();

        if let Some(description) = self.description {
            builder = builder.description(description);
        }

        for (id, entry) in self.parameters.0 {
            builder = builder.parameter(entry.into_parameter(id)?);
        }

        for entry in self.depends_on {
            builder = builder.dependency(entry.into_reference()?);
        }

        for entry in self.files {
            builder = builder.file(entry.into_expansion()?);
        }

        builder.build().map_err(|e| e.to_string())
    }
}

impl ParameterEntry {
    fn into_parameter(self, id: String) -> Result<Parameter, String> {
        let kind = match (self.kind, self.values) {
            (KindEntry::String, None) => ParameterKind::String,
            (KindEntry::Int, None) => ParameterKind::Int,
            (KindEntry::Enum, Some(values)) => ParameterKind::Enum { values },
            (KindEntry::Enum, None) => {
                return Err(format!("parameter '{id}' of type enum requires `values`"));
            }
            (_, Some(_)) => {
                return Err(format!("parameter '{id}': `values` is only allowed on enum parameters"));
            }
        };

        let mut parameter = Parameter::new(id, kind);
        parameter.display_name = self.name.unwrap_or_else(|| parameter.id.clone());
        parameter.help = self.help;
        parameter.required = self.required.unwrap_or(true);
        parameter.default = self.default.map(DefaultEntry::into_expression);
        parameter.validation = self.validation;
        Ok(parameter)
    }
}

impl DependencyEntry {
    fn into_reference(self) -> Result<TemplateReference, String> {
        let mut reference = TemplateReference::new(self.name);
        if let Some(base_dir) = self.base_dir {
            let base_dir = RelativePath::try_new(base_dir).map_err(|e| e.to_string())?;
            reference = reference.with_base_dir(base_dir);
        }
        for (id, expr) in self.parameters.0 {
            reference = reference.with_parameter(id, expr);
        }
        Ok(reference)
    }
}

impl FileEntry {
    fn into_expansion(self) -> Result<FileExpansion, String> {
        let mut expansion = match self.to {
            Some(to) => FileExpansion::copy(self.from, to),
            None => FileExpansion::glob(self.from),
        };
        expansion.is_template = self.is_template;
        expansion.condition = self.condition;
        if let Some(policy) = self.on_conflict {
            expansion = expansion.on_conflict(policy.parse().map_err(|e| format!("{e}"))?);
        }
        Ok(expansion)
    }
}

/// Parse manifest text into a [`TemplateConfig`].
///
/// The returned error is a human-readable reason, without the template name.
pub fn parse_manifest(text: &str) -> Result<TemplateConfig, String> {
    let manifest: TemplateManifest = toml::from_str(text).map_err(|e| e.to_string())?;
    manifest.into_config()
}

// ── Repository ────────────────────────────────────────────────────────────────

/// Loads templates from `<templates_dir>/<name>/template.toml`.
///
/// # Example
///
/// ```no_run
/// use trellis_adapters::template_loader::DirectoryTemplateRepository;
/// use trellis_core::application::ports::TemplateRepository;
///
/// let repository = DirectoryTemplateRepository::new("./templates");
/// let template = repository.load("kotlin-lib")?;
/// println!("{} has {} files", template.name(), template.config().files().len());
/// # Ok::<(), trellis_core::error::TrellisError>(())
/// ```
#[derive(Clone)]
pub struct DirectoryTemplateRepository {
    templates_dir: PathBuf,
    filesystem: Arc<dyn Filesystem>,
}

impl DirectoryTemplateRepository {
    /// A repository reading from the local disk.
    pub fn new(templates_dir: impl Into<PathBuf>) -> Self {
        Self::with_filesystem(templates_dir, Arc::new(LocalFilesystem::new()))
    }

    /// A repository reading through `filesystem`.
    pub fn with_filesystem(
        templates_dir: impl Into<PathBuf>,
        filesystem: Arc<dyn Filesystem>,
    ) -> Self {
        Self {
            templates_dir: templates_dir.into(),
            filesystem,
        }
    }

    pub fn templates_dir(&self) -> &Path {
        &self.templates_dir
    }

    fn malformed(name: &str, reason: impl Into<String>) -> ApplicationError {
        ApplicationError::MalformedTemplate {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

impl fmt::Debug for DirectoryTemplateRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectoryTemplateRepository")
            .field("templates_dir", &self.templates_dir)
            .finish_non_exhaustive()
    }
}

impl TemplateRepository for DirectoryTemplateRepository {
    #[instrument(skip(self), fields(dir = %self.templates_dir.display()))]
    fn load(&self, name: &str) -> TrellisResult<Template> {
        let root = self.templates_dir.join(name);
        let manifest_path = root.join(MANIFEST_FILE);

        if DomainValidator::validate_template_name(name).is_err()
            || !self.filesystem.exists(&manifest_path)
        {
            return Err(ApplicationError::TemplateNotFound {
                name: name.to_string(),
                path: manifest_path,
            }
            .into());
        }

        let bytes = self.filesystem.read_file(&manifest_path)?;
        let text = String::from_utf8(bytes)
            .map_err(|_| Self::malformed(name, format!("{MANIFEST_FILE} is not valid UTF-8")))?;

        let config = parse_manifest(&text).map_err(|reason| Self::malformed(name, reason))?;

        debug!(
            template = %name,
            parameters = config.parameters().len(),
            dependencies = config.dependencies().len(),
            files = config.files().len(),
            "Loaded template"
        );
        Ok(Template::new(name, root, config))
    }

    fn list(&self) -> TrellisResult<Vec<String>> {
        if !self.filesystem.exists(&self.templates_dir) {
            debug!(dir = %self.templates_dir.display(), "Templates directory does not exist");
            return Ok(Vec::new());
        }

        let mut names: Vec<String> = self
            .filesystem
            .list_files(&self.templates_dir)?
            .into_iter()
            .filter_map(|path| {
                let mut components = path.components();
                let dir = components.next()?.as_os_str().to_str()?.to_string();
                let file = components.next()?;
                (components.next().is_none() && file.as_os_str() == MANIFEST_FILE).then_some(dir)
            })
            .collect();

        names.sort();
        names.dedup();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filesystem::MemoryFilesystem;
    use trellis_core::domain::ConflictPolicy;
    use trellis_core::error::TrellisError;

    fn repository(fs: &MemoryFilesystem) -> DirectoryTemplateRepository {
        DirectoryTemplateRepository::with_filesystem("/templates", Arc::new(fs.clone()))
    }

    fn malformed_reason(err: TrellisError) -> String {
        match err {
            TrellisError::Application(ApplicationError::MalformedTemplate { reason, .. }) => reason,
            other => panic!("expected MalformedTemplate, got {other:?}"),
        }
    }

    const KOTLIN: &str = r#"
description = "Kotlin library"

[parameters.name]
type = "string"
name = "Project name"
default = "'demo'"
validation = "it.length > 2"

[parameters.kind]
type = "enum"
values = ["app", "lib"]
required = false

[parameters.port]
type = "int"
default = 8080

[[dependsOn]]
name = "gitignore"
baseDir = "core"
parameters = { name = "name + '-core'", extra = "'x'" }

[[files]]
from = "README.md.hbs"
to = "README.md"
condition = "kind == 'lib'"
onConflict = "keep"

[[files]]
from = "src/**/*.kt"
isTemplate = false
"#;

    #[test]
    fn parses_a_full_manifest() {
        let config = parse_manifest(KOTLIN).unwrap();

        assert_eq!(config.description(), Some("Kotlin library"));

        let ids: Vec<&str> = config.parameters().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["name", "kind", "port"]);

        let name = config.parameter("name").unwrap();
        assert_eq!(name.display_name, "Project name");
        assert!(name.required);
        assert_eq!(name.default.as_deref(), Some("'demo'"));

        let kind = config.parameter("kind").unwrap();
        assert!(!kind.required);
        assert_eq!(kind.kind.allowed_values(), ["app", "lib"]);

        assert_eq!(config.parameter("port").unwrap().default.as_deref(), Some("8080"));

        let dep = &config.dependencies()[0];
        assert_eq!(dep.name, "gitignore");
        assert_eq!(dep.base_dir.as_path(), Path::new("core"));
        assert_eq!(
            dep.parameters,
            vec![
                ("name".to_string(), "name + '-core'".to_string()),
                ("extra".to_string(), "'x'".to_string()),
            ]
        );

        let files = config.files();
        assert_eq!(files[0].to.as_deref(), Some("README.md"));
        assert_eq!(files[0].on_conflict, ConflictPolicy::Keep);
        assert_eq!(files[1].to, None);
        assert_eq!(files[1].is_template, Some(false));
        assert_eq!(files[1].on_conflict, ConflictPolicy::Overwrite);
    }

    #[test]
    fn empty_manifest_is_valid() {
        let config = parse_manifest("").unwrap();
        assert!(config.parameters().is_empty());
        assert!(config.files().is_empty());
    }

    #[test]
    fn rejects_unknown_parameter_type() {
        let err = parse_manifest("[parameters.x]\ntype = \"float\"\n").unwrap_err();
        assert!(err.contains("float"), "{err}");
    }

    #[test]
    fn rejects_empty_enum_values() {
        let err = parse_manifest("[parameters.x]\ntype = \"enum\"\nvalues = []\n").unwrap_err();
        assert!(err.contains("'x'"), "{err}");
    }

    #[test]
    fn rejects_misspelled_parameter_keys() {
        let err = parse_manifest("[parameters.x]\ntype = \"string\"\nrequird = false\n")
            .unwrap_err();
        assert!(err.contains("requird"), "{err}");
    }

    #[test]
    fn rejects_values_on_non_enum_parameters() {
        let err = parse_manifest("[parameters.x]\ntype = \"string\"\nvalues = [\"a\"]\n")
            .unwrap_err();
        assert!(err.contains("only allowed on enum"), "{err}");
    }

    #[test]
    fn rejects_enum_without_values() {
        let err = parse_manifest("[parameters.x]\ntype = \"enum\"\n").unwrap_err();
        assert!(err.contains("requires `values`"), "{err}");
    }

    #[test]
    fn rejects_parameters_named_after_roots() {
        for root in ["project", "global"] {
            let err = parse_manifest(&format!("[parameters.{root}]\ntype = \"string\"\n"))
                .unwrap_err();
            assert!(err.contains("reserved"), "{err}");
        }
    }

    #[test]
    fn rejects_absolute_dependency_base_dir() {
        let err = parse_manifest("[[dependsOn]]\nname = \"a\"\nbaseDir = \"/etc\"\n").unwrap_err();
        assert!(err.contains("/etc"), "{err}");
    }

    #[test]
    fn rejects_unknown_conflict_policy() {
        let err =
            parse_manifest("[[files]]\nfrom = \"a\"\nto = \"b\"\nonConflict = \"merge\"\n")
                .unwrap_err();
        assert!(err.contains("merge"), "{err}");
    }

    #[test]
    fn missing_template_reports_the_manifest_path() {
        let fs = MemoryFilesystem::new();

        let err = repository(&fs).load("nope").unwrap_err();

        assert_eq!(
            err,
            TrellisError::Application(ApplicationError::TemplateNotFound {
                name: "nope".into(),
                path: PathBuf::from("/templates/nope/template.toml"),
            })
        );
    }

    #[test]
    fn path_like_names_are_not_found() {
        let fs = MemoryFilesystem::new();
        fs.add_file("/secret/template.toml", "");

        let err = repository(&fs).load("../secret").unwrap_err();

        assert!(matches!(
            err,
            TrellisError::Application(ApplicationError::TemplateNotFound { .. })
        ));
    }

    #[test]
    fn parse_errors_are_malformed() {
        let fs = MemoryFilesystem::new();
        fs.add_file("/templates/bad/template.toml", "description = [");

        let err = repository(&fs).load("bad").unwrap_err();

        assert!(!malformed_reason(err).is_empty());
    }

    #[test]
    fn loads_template_rooted_in_its_directory() {
        let fs = MemoryFilesystem::new();
        fs.add_file("/templates/kotlin/template.toml", KOTLIN);

        let template = repository(&fs).load("kotlin").unwrap();

        assert_eq!(template.name(), "kotlin");
        assert_eq!(template.root(), Path::new("/templates/kotlin"));
        assert_eq!(template.config().parameters().len(), 3);
    }

    #[test]
    fn lists_directories_with_manifests() {
        let fs = MemoryFilesystem::new();
        fs.add_file("/templates/zeta/template.toml", "")
            .add_file("/templates/alpha/template.toml", "")
            .add_file("/templates/alpha/nested/template.toml", "")
            .add_file("/templates/notes/README.md", "");

        let names = repository(&fs).list().unwrap();

        assert_eq!(names, ["alpha", "zeta"]);
    }

    #[test]
    fn missing_templates_dir_lists_nothing() {
        let fs = MemoryFilesystem::new();
        assert!(repository(&fs).list().unwrap().is_empty());
    }
}
