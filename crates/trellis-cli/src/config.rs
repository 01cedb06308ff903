//! Application configuration.
//!
//! [`AppConfig`] is loaded once at startup and passed down by value.  The
//! CLI layer owns config; the core crate only sees the `global` table, as the
//! `global` root of the variable environment.
//!
//! # Resolution order (highest priority first)
//!
//! 1. CLI flags (handled at the call-site, not here)
//! 2. Environment variables prefixed `TRELLIS__` (`TRELLIS__TEMPLATES__DIR`)
//! 3. Config file (`--config`, or the platform config directory)
//! 4. Built-in defaults (always present)

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::debug;

use trellis_core::domain::Value;

/// Project values read into the `project` root, relative to the target dir.
pub const PROJECT_FILE: &str = ".trellis.toml";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Template settings.
    pub templates: TemplatesConfig,
    /// Output settings.
    pub output: OutputConfig,
    /// Free-form values exposed to templates as `global`.
    #[serde(default)]
    pub global: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplatesConfig {
    /// Directory holding one sub-directory per template.
    pub dir: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    pub no_color: bool,
    pub format: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            templates: TemplatesConfig {
                dir: Self::default_templates_dir(),
            },
            output: OutputConfig {
                no_color: false,
                format: "auto".into(),
            },
            global: BTreeMap::new(),
        }
    }
}

impl AppConfig {
    /// Load configuration: defaults, then the config file, then `TRELLIS__*`
    /// environment variables.
    ///
    /// `config_file` is the path given with `--config`; it must exist. The
    /// default location is optional.
    pub fn load(config_file: Option<&PathBuf>) -> anyhow::Result<Self> {
        let path = config_file.cloned().unwrap_or_else(Self::config_path);
        debug!(path = %path.display(), "Loading configuration");

        let defaults = Config::try_from(&Self::default())
            .context("Failed to build default configuration")?;

        let config = Config::builder()
            .add_source(defaults)
            .add_source(
                File::from(path.clone())
                    .format(FileFormat::Toml)
                    .required(config_file.is_some()),
            )
            .add_source(
                Environment::with_prefix("TRELLIS")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to read configuration from {}", path.display()))?;

        config
            .try_deserialize()
            .context("Invalid configuration values")
    }

    /// Path to the default configuration file.
    ///
    /// Uses `directories::ProjectDirs` for cross-platform correctness,
    /// falling back to `trellis.toml` in the current directory.
    pub fn config_path() -> PathBuf {
        directories::ProjectDirs::from("dev", "trellis", "trellis")
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("trellis.toml"))
    }

    fn default_templates_dir() -> PathBuf {
        directories::ProjectDirs::from("dev", "trellis", "trellis")
            .map(|d| d.data_dir().join("templates"))
            .unwrap_or_else(|| PathBuf::from("templates"))
    }

    /// The `global` table as an environment root.
    pub fn global_root(&self) -> Value {
        Value::from(serde_json::Value::Object(
            self.global
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        ))
    }

    /// Look up a dotted key such as `templates.dir` or `global.author`.
    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        let mut current = serde_json::to_value(self).ok()?;
        for segment in key.split('.') {
            current = current.get_mut(segment)?.take();
        }
        Some(current)
    }
}

/// Read `<dir>/.trellis.toml` as the `project` root.
///
/// A missing file is an empty table.
pub fn load_project_root(dir: &Path) -> anyhow::Result<Value> {
    let path = dir.join(PROJECT_FILE);
    if !path.is_file() {
        return Ok(Value::Map(BTreeMap::new()));
    }

    let text = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let json: serde_json::Value =
        toml::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))?;
    debug!(path = %path.display(), "Loaded project values");
    Ok(Value::from(json))
}
