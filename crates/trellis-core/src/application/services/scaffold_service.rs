//! Scaffold Service - main application orchestrator.
//!
//! Applies a named template to a base directory:
//!
//! ```text
//! ResolvingOwnParameters → ApplyingDependencies → ExpandingFiles → Done
//!                                 │
//!                                 └── recursive application per dependsOn entry
//! ```
//!
//! A fatal error anywhere aborts the whole invocation; files already
//! written stay on disk. Per-file problems (render failures, destinations
//! outside the base directory) are logged, reported and skipped.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use glob::{MatchOptions, Pattern};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::{
    application::{
        ApplicationError,
        ports::{Filesystem, Prompter, TemplateRenderer, TemplateRepository},
        services::{
            materializer::{FileAction, FileMaterializer, SkipReason},
            parameter_resolver::ParameterResolver,
            template_cache::TemplateCache,
        },
    },
    domain::{
        ExpressionError, FileExpansion, MANIFEST_FILE, Template, Value, VariableEnvironment,
        expression, is_root, normalize, resolve_within, strip_template_suffix,
    },
    error::{TrellisError, TrellisResult},
};

/// Nesting limit for dependency applications. A template that re-applies
/// itself in ever deeper sub-directories never repeats a (name, dir) pair.
const MAX_DEPTH: usize = 64;

// ============================================================================
// Request / report
// ============================================================================

/// Everything one top-level invocation needs.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplyRequest {
    pub name: String,
    pub base_dir: PathBuf,
    /// Overwrite existing files without asking.
    pub overwrite_existing: bool,
    /// Values bound before any prompting, as typed on the command line.
    pub external_parameters: BTreeMap<String, String>,
    /// The `project` root (persisted project configuration).
    pub project: Value,
    /// The `global` root (per-user configuration).
    pub global: Value,
}

impl ApplyRequest {
    pub fn new(name: impl Into<String>, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            base_dir: base_dir.into(),
            overwrite_existing: false,
            external_parameters: BTreeMap::new(),
            project: Value::Map(BTreeMap::new()),
            global: Value::Map(BTreeMap::new()),
        }
    }

    pub fn overwrite_existing(mut self, overwrite: bool) -> Self {
        self.overwrite_existing = overwrite;
        self
    }

    pub fn parameter(mut self, id: impl Into<String>, value: impl Into<String>) -> Self {
        self.external_parameters.insert(id.into(), value.into());
        self
    }

    pub fn project(mut self, project: Value) -> Self {
        self.project = project;
        self
    }

    pub fn global(mut self, global: Value) -> Self {
        self.global = global;
        self
    }
}

/// One destination file and what happened to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileOutcome {
    pub template: String,
    pub destination: PathBuf,
    #[serde(flatten)]
    pub action: FileAction,
}

/// Result of a successful invocation, in processing order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScaffoldReport {
    /// `(template, base dir)` for every application, dependencies first.
    pub applied: Vec<(String, PathBuf)>,
    pub files: Vec<FileOutcome>,
}

impl ScaffoldReport {
    pub fn written(&self) -> impl Iterator<Item = &FileOutcome> {
        self.files.iter().filter(|f| f.action.is_write())
    }

    pub fn skipped(&self) -> impl Iterator<Item = &FileOutcome> {
        self.files.iter().filter(|f| !f.action.is_write())
    }
}

// ============================================================================
// Service
// ============================================================================

/// Main scaffolding service.
pub struct ScaffoldService {
    repository: Box<dyn TemplateRepository>,
    renderer: Box<dyn TemplateRenderer>,
    filesystem: Box<dyn Filesystem>,
    prompter: Box<dyn Prompter>,
}

/// State of one top-level invocation.
struct Run<'a> {
    cache: TemplateCache<'a>,
    resolver: ParameterResolver<'a>,
    materializer: FileMaterializer<'a>,
    /// `(template, base dir)` pairs currently being applied.
    stack: Vec<(String, PathBuf)>,
    report: ScaffoldReport,
}

impl ScaffoldService {
    /// Create a new scaffold service with the given adapters.
    pub fn new(
        repository: Box<dyn TemplateRepository>,
        renderer: Box<dyn TemplateRenderer>,
        filesystem: Box<dyn Filesystem>,
        prompter: Box<dyn Prompter>,
    ) -> Self {
        Self {
            repository,
            renderer,
            filesystem,
            prompter,
        }
    }

    /// Apply a template, its dependencies first, to `request.base_dir`.
    #[instrument(
        skip_all,
        fields(
            template = %request.name,
            base_dir = %request.base_dir.display(),
            force = request.overwrite_existing
        )
    )]
    pub fn apply_template(&self, request: ApplyRequest) -> TrellisResult<ScaffoldReport> {
        info!("Applying template");

        if let Some(id) = request.external_parameters.keys().find(|id| is_root(id)) {
            return Err(reserved_root(&request.name, id));
        }

        let env = VariableEnvironment::with_roots(request.project, request.global).extend(
            request
                .external_parameters
                .into_iter()
                .map(|(k, v)| (k, Value::Str(v))),
        );

        let mut run = Run {
            cache: TemplateCache::new(self.repository.as_ref()),
            resolver: ParameterResolver::new(self.prompter.as_ref()),
            materializer: FileMaterializer::new(
                self.filesystem.as_ref(),
                self.prompter.as_ref(),
                request.overwrite_existing,
            ),
            stack: Vec::new(),
            report: ScaffoldReport::default(),
        };

        self.apply(&mut run, &request.name, &normalize(&request.base_dir), env)?;

        info!(
            written = run.report.written().count(),
            skipped = run.report.skipped().count(),
            "Scaffold completed"
        );
        Ok(run.report)
    }

    // -------------------------------------------------------------------------
    // Internal Helpers
    // -------------------------------------------------------------------------

    fn apply(
        &self,
        run: &mut Run<'_>,
        name: &str,
        base_dir: &Path,
        env: VariableEnvironment,
    ) -> TrellisResult<()> {
        let key = (name.to_string(), base_dir.to_path_buf());
        if run.stack.contains(&key) || run.stack.len() >= MAX_DEPTH {
            let chain = run
                .stack
                .iter()
                .chain(std::iter::once(&key))
                .map(|(n, dir)| format!("{n}@{}", dir.display()))
                .collect();
            return Err(ApplicationError::CyclicDependency { chain }.into());
        }
        run.stack.push(key);

        let template = run.cache.get(name)?;
        debug!(template = name, base_dir = %base_dir.display(), "Resolving parameters");
        let env = run.resolver.resolve(&template, env)?;

        for dependency in template.config().dependencies() {
            let mut child_env = env.clone();
            for (id, expr) in &dependency.parameters {
                if is_root(id) {
                    return Err(reserved_root(template.name(), id));
                }
                let value = evaluate(&template, expr, expression::eval(expr, &env))?;
                child_env = child_env.with(id.clone(), value);
            }
            let child_base = normalize(&base_dir.join(dependency.base_dir.as_path()));
            debug!(
                dependency = %dependency.name,
                base_dir = %child_base.display(),
                "Applying dependency"
            );
            self.apply(run, &dependency.name, &child_base, child_env)?;
        }

        for file in template.config().files() {
            self.expand(run, &template, base_dir, &env, file)?;
        }

        run.stack.pop();
        run.report
            .applied
            .push((name.to_string(), base_dir.to_path_buf()));
        info!(template = name, base_dir = %base_dir.display(), "Template applied");
        Ok(())
    }

    fn expand(
        &self,
        run: &mut Run<'_>,
        template: &Arc<Template>,
        base_dir: &Path,
        env: &VariableEnvironment,
        file: &FileExpansion,
    ) -> TrellisResult<()> {
        if let Some(condition) = &file.condition {
            let holds = evaluate(template, condition, expression::eval_bool(condition, env))?;
            if !holds {
                debug!(from = %file.from, condition = %condition, "Condition false, skipping");
                return Ok(());
            }
        }

        let from = evaluate(template, &file.from, expression::eval_in_string(&file.from, env))?;
        let pairs = match &file.to {
            Some(to) => {
                let to = evaluate(template, to, expression::eval_in_string(to, env))?;
                vec![(PathBuf::from(&from), PathBuf::from(to))]
            }
            None => self
                .glob(template, &from)?
                .into_iter()
                .map(|rel| (rel.clone(), rel))
                .collect(),
        };

        for (source, destination) in pairs {
            let is_template = file.is_template_for(&source);
            let destination = if is_template {
                strip_template_suffix(&destination)
            } else {
                destination
            };

            let Some(dest) = resolve_within(base_dir, &destination) else {
                warn!(
                    template = %template.name(),
                    destination = %destination.display(),
                    "Destination escapes the target directory, skipping"
                );
                run.report.files.push(FileOutcome {
                    template: template.name().to_string(),
                    destination: base_dir.join(&destination),
                    action: FileAction::Skipped(SkipReason::OutsideBaseDir),
                });
                continue;
            };

            let Some(source_path) = resolve_within(template.root(), &source) else {
                warn!(
                    template = %template.name(),
                    source = %source.display(),
                    "Source escapes the template directory, skipping"
                );
                run.report.files.push(FileOutcome {
                    template: template.name().to_string(),
                    destination: dest,
                    action: FileAction::Skipped(SkipReason::OutsideTemplateRoot),
                });
                continue;
            };

            let action = run.materializer.write(
                &dest,
                || self.produce(&source_path, is_template, env),
                file.on_conflict,
            )?;
            run.report.files.push(FileOutcome {
                template: template.name().to_string(),
                destination: dest,
                action,
            });
        }

        Ok(())
    }

    /// Files under the template root matching `pattern`, sorted, manifest excluded.
    fn glob(&self, template: &Template, pattern: &str) -> TrellisResult<Vec<PathBuf>> {
        let matcher = Pattern::new(pattern).map_err(|e| ApplicationError::MalformedTemplate {
            name: template.name().to_string(),
            reason: format!("invalid glob '{pattern}': {e}"),
        })?;
        let options = MatchOptions {
            require_literal_separator: true,
            ..MatchOptions::default()
        };

        let matches: Vec<PathBuf> = self
            .filesystem
            .list_files(template.root())?
            .into_iter()
            .filter(|rel| rel != Path::new(MANIFEST_FILE))
            .filter(|rel| matcher.matches_with(&rel.to_string_lossy().replace('\\', "/"), options))
            .collect();

        if matches.is_empty() {
            warn!(template = %template.name(), pattern, "Glob matched no files");
        }
        Ok(matches)
    }

    fn produce(
        &self,
        source: &Path,
        is_template: bool,
        env: &VariableEnvironment,
    ) -> TrellisResult<Vec<u8>> {
        let bytes = self.filesystem.read_file(source)?;
        if !is_template {
            return Ok(bytes);
        }

        let text = String::from_utf8(bytes).map_err(|_| ApplicationError::RenderingFailed {
            reason: format!("{} is not valid UTF-8", source.display()),
        })?;
        let name = source.to_string_lossy();
        Ok(self.renderer.render(&name, &text, env)?.into_bytes())
    }
}

fn evaluate<T>(
    template: &Template,
    expr: &str,
    result: Result<T, ExpressionError>,
) -> TrellisResult<T> {
    result.map_err(|source| {
        ApplicationError::Expression {
            template: template.name().to_string(),
            expression: expr.to_string(),
            source,
        }
        .into()
    })
}

fn reserved_root(template: &str, id: &str) -> TrellisError {
    ApplicationError::InvalidParameterValue {
        template: template.to_string(),
        parameter: id.to_string(),
        reason: format!("'{id}' is a read-only root and cannot be set as a parameter"),
    }
    .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{
        MockFilesystem, MockPrompter, MockTemplateRenderer, MockTemplateRepository,
    };
    use crate::domain::{RelativePath, TemplateConfig, TemplateReference};
    use crate::error::TrellisError;

    fn batch() -> MockPrompter {
        let mut prompter = MockPrompter::new();
        prompter.expect_is_interactive().return_const(false);
        prompter
    }

    fn service(repo: MockTemplateRepository, fs: MockFilesystem) -> ScaffoldService {
        ScaffoldService::new(
            Box::new(repo),
            Box::new(MockTemplateRenderer::new()),
            Box::new(fs),
            Box::new(batch()),
        )
    }

    fn repo_of(templates: Vec<(&'static str, TemplateConfig)>) -> MockTemplateRepository {
        let mut repo = MockTemplateRepository::new();
        repo.expect_load().returning(move |name| {
            templates
                .iter()
                .find(|(n, _)| *n == name)
                .map(|(n, c)| Template::new(*n, format!("/t/{n}"), c.clone()))
                .ok_or_else(|| {
                    TrellisError::from(ApplicationError::TemplateNotFound {
                        name: name.to_string(),
                        path: PathBuf::from(format!("/t/{name}")),
                    })
                })
        });
        repo
    }

    #[test]
    fn self_dependency_is_a_cycle() {
        let looping = TemplateConfig::builder()
            .dependency(TemplateReference::new("loop"))
            .build()
            .unwrap();
        let svc = service(repo_of(vec![("loop", looping)]), MockFilesystem::new());

        let err = svc.apply_template(ApplyRequest::new("loop", "/out")).unwrap_err();
        assert_eq!(
            err,
            TrellisError::Application(ApplicationError::CyclicDependency {
                chain: vec!["loop@/out".into(), "loop@/out".into()],
            })
        );
    }

    #[test]
    fn indirect_cycle_is_detected() {
        let a = TemplateConfig::builder()
            .dependency(TemplateReference::new("b"))
            .build()
            .unwrap();
        let b = TemplateConfig::builder()
            .dependency(TemplateReference::new("a"))
            .build()
            .unwrap();
        let svc = service(repo_of(vec![("a", a), ("b", b)]), MockFilesystem::new());

        let err = svc.apply_template(ApplyRequest::new("a", "/out")).unwrap_err();
        assert!(matches!(
            err,
            TrellisError::Application(ApplicationError::CyclicDependency { ref chain }) if chain.len() == 3
        ));
    }

    #[test]
    fn self_dependency_in_a_subdirectory_stops_at_the_depth_limit() {
        let descending = TemplateConfig::builder()
            .dependency(TemplateReference::new("deep").with_base_dir(RelativePath::try_new("sub").unwrap()))
            .build()
            .unwrap();
        let svc = service(repo_of(vec![("deep", descending)]), MockFilesystem::new());

        let err = svc.apply_template(ApplyRequest::new("deep", "/out")).unwrap_err();
        assert!(matches!(
            err,
            TrellisError::Application(ApplicationError::CyclicDependency { ref chain })
                if chain.len() == MAX_DEPTH + 1 && chain[0] == "deep@/out"
        ));
    }

    #[test]
    fn external_parameters_cannot_replace_roots() {
        let mut repo = MockTemplateRepository::new();
        repo.expect_load().never();
        let svc = service(repo, MockFilesystem::new());

        let request = ApplyRequest::new("lib", "/out")
            .project(Value::from(serde_json::json!({ "isLibrary": true })))
            .parameter("project", "oops");
        let err = svc.apply_template(request).unwrap_err();
        assert_eq!(
            err,
            TrellisError::Application(ApplicationError::InvalidParameterValue {
                template: "lib".into(),
                parameter: "project".into(),
                reason: "'project' is a read-only root and cannot be set as a parameter".into(),
            })
        );
    }

    #[test]
    fn dependency_parameters_cannot_replace_roots() {
        let leaf = TemplateConfig::default();
        let root = TemplateConfig::builder()
            .dependency(TemplateReference::new("leaf").with_parameter("global", "'x'"))
            .build()
            .unwrap();
        let svc = service(repo_of(vec![("root", root), ("leaf", leaf)]), MockFilesystem::new());

        let err = svc.apply_template(ApplyRequest::new("root", "/out")).unwrap_err();
        assert!(matches!(
            err,
            TrellisError::Application(ApplicationError::InvalidParameterValue {
                ref template,
                ref parameter,
                ..
            }) if template == "root" && parameter == "global"
        ));
    }

    #[test]
    fn same_template_twice_in_sequence_is_allowed() {
        let leaf = TemplateConfig::default();
        let root = TemplateConfig::builder()
            .dependency(TemplateReference::new("leaf"))
            .dependency(TemplateReference::new("leaf"))
            .build()
            .unwrap();
        let svc = service(repo_of(vec![("root", root), ("leaf", leaf)]), MockFilesystem::new());

        let report = svc.apply_template(ApplyRequest::new("root", "/out")).unwrap();
        let names: Vec<_> = report.applied.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["leaf", "leaf", "root"]);
    }

    #[test]
    fn false_condition_touches_nothing() {
        let config = TemplateConfig::builder()
            .file(FileExpansion::glob("docs/**").when("project.isLibrary"))
            .build()
            .unwrap();
        let mut fs = MockFilesystem::new();
        fs.expect_list_files().never();
        fs.expect_exists().never();
        fs.expect_create_dir_all().never();
        let svc = service(repo_of(vec![("lib", config)]), fs);

        let request = ApplyRequest::new("lib", "/out")
            .project(Value::from(serde_json::json!({ "isLibrary": false })));
        let report = svc.apply_template(request).unwrap();
        assert!(report.files.is_empty());
    }

    #[test]
    fn unbound_condition_is_fatal() {
        let config = TemplateConfig::builder()
            .file(FileExpansion::copy("a", "a").when("nope"))
            .build()
            .unwrap();
        let svc = service(repo_of(vec![("t", config)]), MockFilesystem::new());

        let err = svc.apply_template(ApplyRequest::new("t", "/out")).unwrap_err();
        assert!(matches!(
            err,
            TrellisError::Application(ApplicationError::Expression { .. })
        ));
    }

    #[test]
    fn escaping_destination_is_reported_not_written() {
        let config = TemplateConfig::builder()
            .file(FileExpansion::copy("a.txt", "../evil.txt"))
            .build()
            .unwrap();
        let mut fs = MockFilesystem::new();
        fs.expect_write_file().never();
        fs.expect_exists().never();
        let svc = service(repo_of(vec![("t", config)]), fs);

        let report = svc.apply_template(ApplyRequest::new("t", "/out")).unwrap();
        assert_eq!(report.files.len(), 1);
        assert_eq!(
            report.files[0].action,
            FileAction::Skipped(SkipReason::OutsideBaseDir)
        );
    }

    #[test]
    fn glob_excludes_manifest_and_respects_separators() {
        let config = TemplateConfig::builder()
            .file(FileExpansion::glob("*").template(false))
            .build()
            .unwrap();
        let mut fs = MockFilesystem::new();
        fs.expect_list_files().returning(|_| {
            Ok(vec![
                PathBuf::from("README.md"),
                PathBuf::from("src/main.rs"),
                PathBuf::from("template.toml"),
            ])
        });
        fs.expect_exists().return_const(false);
        fs.expect_read_file().returning(|_| Ok(b"x".to_vec()));
        fs.expect_write_file()
            .withf(|p, _| p == Path::new("/out/README.md"))
            .times(1)
            .returning(|_, _| Ok(()));
        let svc = service(repo_of(vec![("t", config)]), fs);

        let report = svc.apply_template(ApplyRequest::new("t", "/out")).unwrap();
        assert_eq!(report.written().count(), 1);
    }
}
