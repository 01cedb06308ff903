//! CLI argument definitions using the clap derive API.
//!
//! This module is the *only* place that knows about argument names, aliases,
//! help text, and value enums.  No business logic lives here.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

pub mod global;
pub use global::{GlobalArgs, OutputFormat};

// ── Top-level CLI ─────────────────────────────────────────────────────────────

/// Main CLI entry-point.
#[derive(Debug, Parser)]
#[command(
    name    = "trellis",
    bin_name = "trellis",
    version  = env!("CARGO_PKG_VERSION"),
    author   = env!("CARGO_PKG_AUTHORS"),
    about    = "Composable project scaffolding from parameterised templates",
    long_about = "Trellis applies named templates to a directory, composing \
                  their dependencies, resolving typed parameters and \
                  rendering files.",
    after_help = "EXAMPLES:\n\
        \x20 trellis apply kotlin-lib --dir ./my-lib -p name=my-lib\n\
        \x20 trellis list --templates ./templates\n\
        \x20 trellis completions bash > /usr/share/bash-completion/completions/trellis",
    arg_required_else_help = true,
    subcommand_required    = true,
)]
pub struct Cli {
    /// Flags available on every subcommand.
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

// ── Subcommands ───────────────────────────────────────────────────────────────

/// All available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Apply a template to a directory.
    #[command(
        visible_alias = "a",
        about = "Apply a template",
        after_help = "EXAMPLES:\n\
            \x20 trellis apply kotlin-lib\n\
            \x20 trellis apply kotlin-lib --dir ./core -p name=core -p kind=lib\n\
            \x20 trellis apply gitignore --non-interactive --force"
    )]
    Apply(ApplyArgs),

    /// List available templates.
    #[command(
        visible_alias = "ls",
        about = "List available templates",
        after_help = "EXAMPLES:\n\
            \x20 trellis list\n\
            \x20 trellis list --format json\n\
            \x20 trellis list --templates ./templates"
    )]
    List(ListArgs),

    /// Initialise a configuration file.
    #[command(
        about = "Initialise configuration",
        after_help = "EXAMPLES:\n\
            \x20 trellis init            # user configuration\n\
            \x20 trellis init --project  # .trellis.toml in the current directory"
    )]
    Init(InitArgs),

    /// Generate shell completion scripts.
    #[command(
        about = "Generate shell completions",
        after_help = "EXAMPLES:\n\
            \x20 trellis completions bash > ~/.local/share/bash-completion/completions/trellis\n\
            \x20 trellis completions zsh  > ~/.zfunc/_trellis\n\
            \x20 trellis completions fish > ~/.config/fish/completions/trellis.fish"
    )]
    Completions(CompletionsArgs),

    /// Inspect the configuration.
    #[command(
        about = "Configuration management",
        subcommand,
        after_help = "EXAMPLES:\n\
            \x20 trellis config get templates.dir\n\
            \x20 trellis config list\n\
            \x20 trellis config path"
    )]
    Config(ConfigCommands),
}

// ── apply ─────────────────────────────────────────────────────────────────────

/// Arguments for `trellis apply`.
#[derive(Debug, Args)]
pub struct ApplyArgs {
    /// Name of the template directory.
    #[arg(value_name = "TEMPLATE", help = "Template to apply")]
    pub template: String,

    /// Directory the template is applied to.
    #[arg(
        short = 'd',
        long = "dir",
        value_name = "DIR",
        default_value = ".",
        help = "Target directory"
    )]
    pub dir: PathBuf,

    /// Override the configured templates directory.
    #[arg(
        short = 't',
        long = "templates",
        value_name = "DIR",
        env = "TRELLIS_TEMPLATES",
        help = "Directory containing templates"
    )]
    pub templates: Option<PathBuf>,

    /// Overwrite existing files without asking.
    #[arg(short = 'f', long = "force", help = "Overwrite existing files")]
    pub force: bool,

    /// Parameter values, bound before any prompting.
    #[arg(
        short = 'p',
        long = "param",
        value_name = "KEY=VALUE",
        value_parser = parse_key_value,
        help = "Set a template parameter (repeatable)"
    )]
    pub params: Vec<(String, String)>,

    /// Never prompt; fall back to defaults.
    ///
    /// Implied when stdin is not a terminal.
    #[arg(long = "non-interactive", help = "Do not prompt for input")]
    pub non_interactive: bool,
}

/// Parse `key=value`. The value may itself contain `=`.
fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("missing parameter name in '{s}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

// ── list ──────────────────────────────────────────────────────────────────────

/// Arguments for `trellis list`.
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Override the configured templates directory.
    #[arg(
        short = 't',
        long = "templates",
        value_name = "DIR",
        env = "TRELLIS_TEMPLATES",
        help = "Directory containing templates"
    )]
    pub templates: Option<PathBuf>,

    /// Output format.
    #[arg(
        long = "format",
        value_enum,
        default_value = "table",
        help = "Output format"
    )]
    pub format: ListFormat,
}

/// Output format for the `list` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ListFormat {
    /// Human-readable table.
    Table,
    /// One name per line.
    List,
    /// JSON array.
    Json,
}

// ── init ──────────────────────────────────────────────────────────────────────

/// Arguments for `trellis init`.
#[derive(Debug, Args)]
pub struct InitArgs {
    /// Create `.trellis.toml` (project values) in the current directory
    /// instead of the user configuration.
    #[arg(long = "project", help = "Create a project file in the current directory")]
    pub project: bool,

    /// Overwrite an existing file.
    #[arg(short = 'f', long = "force", help = "Overwrite existing configuration")]
    pub force: bool,
}

// ── completions ───────────────────────────────────────────────────────────────

/// Arguments for `trellis completions`.
#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell.
    #[arg(value_enum, help = "Shell to generate completions for")]
    pub shell: Shell,
}

/// Supported shells for completion generation.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

// ── config subcommands ────────────────────────────────────────────────────────

/// Subcommands for `trellis config`.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Print the value of a configuration key.
    Get {
        /// Dotted key path, e.g. `templates.dir`.
        key: String,
    },
    /// Print all configuration values.
    List,
    /// Print the path to the configuration file.
    Path,
}

// ── tests ─────────────────────────────────────────────────────────────────────
