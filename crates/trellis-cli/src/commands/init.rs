//! `trellis init`: create a default configuration or project file.

use std::path::{Path, PathBuf};

use crate::{
    cli::InitArgs,
    config::{AppConfig, PROJECT_FILE},
    error::{CliResult, IntoCli},
    output::OutputManager,
};

const PROJECT_TEMPLATE: &str = "\
# Values exposed to templates under `project`, e.g. ${project.group}.
# group = \"com.example\"
";

/// Create the user configuration, or `.trellis.toml` with `--project`.
pub fn execute(args: InitArgs, output: OutputManager) -> CliResult<()> {
    let (path, contents) = if args.project {
        (PathBuf::from(PROJECT_FILE), PROJECT_TEMPLATE.to_string())
    } else {
        let toml = toml::to_string_pretty(&AppConfig::default())
            .with_cli_context(|| "Failed to serialise default config")?;
        (AppConfig::config_path(), toml)
    };

    if path.exists() && !args.force {
        output.warning(&format!(
            "{} already exists (use --force to overwrite)",
            path.display(),
        ))?;
        return Ok(());
    }

    write_file(&path, &contents)?;
    output.success(&format!("Created {}", path.display()))?;
    Ok(())
}

fn write_file(path: &Path, contents: &str) -> CliResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_cli_context(|| format!("Failed to create directory '{}'", parent.display()))?;
    }
    std::fs::write(path, contents)
        .with_cli_context(|| format!("Failed to write '{}'", path.display()))
}
