//! Implementation of the `trellis list` command.

use trellis_adapters::DirectoryTemplateRepository;
use trellis_core::application::{TemplateInfo, TemplateService};

use crate::{
    cli::{ListArgs, ListFormat},
    config::AppConfig,
    error::CliResult,
    output::OutputManager,
};

pub fn execute(args: ListArgs, config: AppConfig, output: OutputManager) -> CliResult<()> {
    let templates_dir = args.templates.unwrap_or(config.templates.dir);
    let service = TemplateService::new(Box::new(DirectoryTemplateRepository::new(
        templates_dir.clone(),
    )));
    let templates = service.list()?;

    match args.format {
        ListFormat::Json => output.json(&templates)?,

        ListFormat::List => {
            for t in &templates {
                output.print(&t.name)?;
            }
        }

        ListFormat::Table => {
            if templates.is_empty() {
                output.info(&format!(
                    "No templates found in {}",
                    templates_dir.display()
                ))?;
                return Ok(());
            }
            output.header(&format!("Templates in {}:", templates_dir.display()))?;
            for t in &templates {
                output.print(&table_row(t))?;
            }
        }
    }

    Ok(())
}

fn table_row(info: &TemplateInfo) -> String {
    if let Some(error) = &info.error {
        return format!("  {:<20} (unloadable: {error})", info.name);
    }

    let mut row = format!(
        "  {:<20} {}",
        info.name,
        info.description.as_deref().unwrap_or("")
    );
    if !info.parameters.is_empty() {
        let params: Vec<String> = info
            .parameters
            .iter()
            .map(|p| {
                if p.required {
                    format!("{}*", p.id)
                } else {
                    p.id.clone()
                }
            })
            .collect();
        row.push_str(&format!(" [{}]", params.join(", ")));
    }
    if !info.dependencies.is_empty() {
        row.push_str(&format!(" -> {}", info.dependencies.join(", ")));
    }
    row
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_core::application::services::template_service::ParameterInfo;

    fn info(name: &str) -> TemplateInfo {
        TemplateInfo {
            name: name.into(),
            description: Some("Kotlin library".into()),
            parameters: vec![
                ParameterInfo {
                    id: "name".into(),
                    kind: "string".into(),
                    required: true,
                    default: None,
                },
                ParameterInfo {
                    id: "kind".into(),
                    kind: "enum".into(),
                    required: false,
                    default: Some("'lib'".into()),
                },
            ],
            dependencies: vec!["gitignore".into()],
            files: 3,
            error: None,
        }
    }

    #[test]
    fn row_marks_required_parameters_and_dependencies() {
        let row = table_row(&info("kotlin"));
        assert!(row.contains("kotlin"));
        assert!(row.contains("Kotlin library"));
        assert!(row.contains("[name*, kind]"));
        assert!(row.ends_with("-> gitignore"));
    }

    #[test]
    fn row_shows_load_errors() {
        let mut broken = info("broken");
        broken.error = Some("bad toml".into());
        assert!(table_row(&broken).contains("unloadable: bad toml"));
    }
}
