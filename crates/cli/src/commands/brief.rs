//! `foreman brief`: print the daily brief for a project.

use crate::OutputFormat;
use foreman_config::AppConfig;
use foreman_orchestrator::Orchestrator;

pub async fn run(config: &AppConfig, project_id: &str, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let notifier = foreman_notify::build_from_config(config)?;
    let mut orchestrator = Orchestrator::new(config, notifier);
    if let Some(store) = foreman_store::build_from_config(config) {
        orchestrator = orchestrator.with_store(store);
    }

    let brief = orchestrator.generate_daily_brief(project_id).await;
    match format {
        OutputFormat::Json => crate::commands::print_json(&brief)?,
        OutputFormat::Text => println!("{}", brief.full_text),
    }
    Ok(())
}
