//! Output management and formatting.
//!
//! Human output goes to stdout through [`OutputManager`]; diagnostics go to
//! stderr through tracing. JSON output bypasses styling entirely.

use std::io::{self, IsTerminal};

use clap::ValueEnum;
use console::Term;
use owo_colors::OwoColorize;
use serde::Serialize;

use trellis_core::application::{FileAction, ScaffoldReport};

use crate::cli::global::{GlobalArgs, OutputFormat};
use crate::config::AppConfig;

/// Manages CLI output based on configuration.
pub struct OutputManager {
    resolved_format: OutputFormat,
    quiet: bool,
    no_color: bool,
    term: Term,
}

impl OutputManager {
    /// Build an `OutputManager` from parsed CLI flags and loaded config.
    ///
    /// The flag wins over `output.format` from the configuration; `auto`
    /// resolves to Human on a TTY and Plain otherwise.
    pub fn new(args: &GlobalArgs, config: &AppConfig) -> Self {
        let requested = match args.output_format {
            OutputFormat::Auto => {
                <OutputFormat as ValueEnum>::from_str(&config.output.format, true)
                    .unwrap_or(OutputFormat::Auto)
            }
            explicit => explicit,
        };
        let resolved_format = match requested {
            OutputFormat::Auto if io::stdout().is_terminal() => OutputFormat::Human,
            OutputFormat::Auto => OutputFormat::Plain,
            explicit => explicit,
        };

        Self {
            resolved_format,
            quiet: args.quiet,
            no_color: args.no_color
                || config.output.no_color
                || resolved_format != OutputFormat::Human,
            term: Term::stdout(),
        }
    }

    /// Decorated text is dropped in quiet mode and when emitting JSON.
    fn silent(&self) -> bool {
        self.quiet || self.resolved_format == OutputFormat::Json
    }

    // ── Public write methods ───────────────────────────────────────────────

    /// Generic message; suppressed in quiet mode.
    pub fn print(&self, msg: &str) -> io::Result<()> {
        if self.silent() {
            return Ok(());
        }
        self.term.write_line(msg)
    }

    /// Success indicator: `✓ <msg>`.
    pub fn success(&self, msg: &str) -> io::Result<()> {
        if self.silent() {
            return Ok(());
        }
        let line = if self.no_color {
            format!("\u{2713} {msg}") // ✓
        } else {
            format!("{} {}", "\u{2713}".green().bold(), msg.green())
        };
        self.term.write_line(&line)
    }

    /// Warning indicator: `⚠ <msg>`.
    pub fn warning(&self, msg: &str) -> io::Result<()> {
        if self.silent() {
            return Ok(());
        }
        let line = if self.no_color {
            format!("\u{26a0} {msg}") // ⚠
        } else {
            format!("{} {}", "\u{26a0}".yellow().bold(), msg.yellow())
        };
        self.term.write_line(&line)
    }

    /// Informational indicator: `ℹ <msg>`.
    pub fn info(&self, msg: &str) -> io::Result<()> {
        if self.silent() {
            return Ok(());
        }
        let line = if self.no_color {
            format!("\u{2139} {msg}") // ℹ
        } else {
            format!("{} {}", "\u{2139}".blue().bold(), msg.blue())
        };
        self.term.write_line(&line)
    }

    /// Bold cyan header line.
    pub fn header(&self, text: &str) -> io::Result<()> {
        if self.silent() {
            return Ok(());
        }
        let line = if self.no_color {
            text.to_owned()
        } else {
            text.cyan().bold().to_string()
        };
        self.term.write_line(&line)
    }

    /// Serialize `value` as pretty JSON on stdout.
    ///
    /// Written even in quiet mode: the caller asked for the data.
    pub fn json<T: Serialize>(&self, value: &T) -> io::Result<()> {
        let text = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        self.term.write_line(&text)
    }

    /// One line per destination file, then a summary.
    pub fn report(&self, report: &ScaffoldReport) -> io::Result<()> {
        if self.resolved_format == OutputFormat::Json {
            return self.json(report);
        }
        if self.silent() {
            return Ok(());
        }

        for file in &report.files {
            let label = format!("{:>11}", action_label(&file.action));
            let path = file.destination.display().to_string();
            let line = match (&file.action, self.no_color) {
                (FileAction::Skipped(reason), true) => format!("{label} {path} ({reason})"),
                (FileAction::Skipped(reason), false) => format!(
                    "{} {} {}",
                    label.yellow(),
                    path,
                    format!("({reason})").dimmed()
                ),
                (_, true) => format!("{label} {path}"),
                (_, false) => format!("{} {}", label.green(), path),
            };
            self.term.write_line(&line)?;
        }

        let written = report.written().count();
        let skipped = report.skipped().count();
        let summary = format!(
            "{written} file(s) written, {skipped} skipped, {} template(s) applied",
            report.applied.len()
        );
        if skipped == 0 {
            self.success(&summary)
        } else {
            self.warning(&summary)
        }
    }
}

fn action_label(action: &FileAction) -> &'static str {
    match action {
        FileAction::Created => "created",
        FileAction::Overwritten => "overwritten",
        FileAction::Appended => "appended",
        FileAction::Skipped(_) => "skipped",
    }
}

// ── tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use trellis_core::application::{FileOutcome, SkipReason};

    use crate::config::AppConfig;

    fn manager_with(quiet: bool, no_color: bool, output_format: OutputFormat) -> OutputManager {
        let args = GlobalArgs {
            verbose: 0,
            quiet,
            no_color,
            config: None,
            output_format,
        };
        OutputManager::new(&args, &AppConfig::default())
    }

    fn make_manager(quiet: bool, no_color: bool) -> OutputManager {
        // Plain avoids TTY detection in tests.
        manager_with(quiet, no_color, OutputFormat::Plain)
    }

    fn sample_report() -> ScaffoldReport {
        ScaffoldReport {
            applied: vec![("gitignore".into(), PathBuf::from("out"))],
            files: vec![
                FileOutcome {
                    template: "gitignore".into(),
                    destination: PathBuf::from("out/.gitignore"),
                    action: FileAction::Created,
                },
                FileOutcome {
                    template: "gitignore".into(),
                    destination: PathBuf::from("out/README.md"),
                    action: FileAction::Skipped(SkipReason::AlreadyExists),
                },
            ],
        }
    }

    #[test]
    fn quiet_suppresses_print() {
        let out = make_manager(true, true);
        assert!(out.print("hello").is_ok());
    }

    #[test]
    fn report_renders_in_every_format() {
        let report = sample_report();
        assert!(make_manager(false, true).report(&report).is_ok());
        assert!(make_manager(false, false).report(&report).is_ok());
        assert!(
            manager_with(true, true, OutputFormat::Json)
                .report(&report)
                .is_ok()
        );
    }

    #[test]
    fn action_labels_drop_the_reason() {
        assert_eq!(
            action_label(&FileAction::Skipped(SkipReason::Declined)),
            "skipped"
        );
        assert_eq!(action_label(&FileAction::Appended), "appended");
    }

    #[test]
    fn no_color_flag_reported() {
        let colored = manager_with(false, false, OutputFormat::Human);
        let no_color = manager_with(false, true, OutputFormat::Human);
        assert!(!colored.no_color);
        assert!(no_color.no_color);
    }

    #[test]
    fn plain_output_is_never_colored() {
        assert!(make_manager(false, false).no_color);
    }

    #[test]
    fn configured_format_applies_when_flag_is_auto() {
        let mut config = AppConfig::default();
        config.output.format = "json".into();
        let args = GlobalArgs {
            verbose: 0,
            quiet: false,
            no_color: false,
            config: None,
            output_format: OutputFormat::Auto,
        };
        assert_eq!(
            OutputManager::new(&args, &config).resolved_format,
            OutputFormat::Json
        );
    }

    #[test]
    fn explicit_format_is_kept() {
        let out = make_manager(false, false);
        assert_eq!(out.resolved_format, OutputFormat::Plain);
    }
}
