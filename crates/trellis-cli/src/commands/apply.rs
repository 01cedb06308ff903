//! Implementation of the `trellis apply` command.
//!
//! Responsibility: wire the adapters into a `ScaffoldService`, turn CLI
//! arguments into an `ApplyRequest`, and display the report. No business
//! logic lives here.

use std::io::IsTerminal as _;

use tracing::{debug, info, instrument};

use trellis_adapters::{
    DirectoryTemplateRepository, HandlebarsRenderer, LocalFilesystem, NonInteractivePrompter,
};
use trellis_core::application::{ApplyRequest, Prompter, ScaffoldService};

use crate::{
    cli::ApplyArgs,
    config::{AppConfig, load_project_root},
    error::{CliError, CliResult},
    output::OutputManager,
};

/// Execute the `trellis apply` command.
///
/// 1. Pick the templates directory (flag, then configuration)
/// 2. Read the `project` root from the target directory
/// 3. Choose a prompter
/// 4. Apply the template and print the report
#[instrument(skip_all, fields(template = %args.template))]
pub fn execute(args: ApplyArgs, config: AppConfig, output: OutputManager) -> CliResult<()> {
    if args.dir.is_file() {
        return Err(CliError::InvalidInput {
            message: format!("--dir '{}' is a file, not a directory", args.dir.display()),
        });
    }

    let templates_dir = args
        .templates
        .clone()
        .unwrap_or_else(|| config.templates.dir.clone());
    let project = load_project_root(&args.dir)?;

    debug!(
        templates = %templates_dir.display(),
        dir = %args.dir.display(),
        params = args.params.len(),
        "Apply resolved"
    );

    let request = args.params.iter().fold(
        ApplyRequest::new(&args.template, &args.dir)
            .overwrite_existing(args.force)
            .project(project)
            .global(config.global_root()),
        |request, (key, value)| request.parameter(key, value),
    );

    let service = ScaffoldService::new(
        Box::new(DirectoryTemplateRepository::new(templates_dir)),
        Box::new(HandlebarsRenderer::new()),
        Box::new(LocalFilesystem::new()),
        select_prompter(args.non_interactive),
    );

    output.header(&format!(
        "Applying '{}' to {}",
        args.template,
        args.dir.display()
    ))?;

    let report = service.apply_template(request)?;

    info!(
        written = report.written().count(),
        skipped = report.skipped().count(),
        "Apply completed"
    );

    output.report(&report)?;
    Ok(())
}

/// A terminal prompter when someone can answer, otherwise one that never
/// asks.
fn select_prompter(non_interactive: bool) -> Box<dyn Prompter> {
    #[cfg(feature = "interactive")]
    if !non_interactive && std::io::stdin().is_terminal() {
        return Box::new(trellis_adapters::TerminalPrompter::new());
    }

    debug!(
        non_interactive,
        stdin_terminal = std::io::stdin().is_terminal(),
        "Prompting disabled"
    );
    Box::new(NonInteractivePrompter::new())
}
