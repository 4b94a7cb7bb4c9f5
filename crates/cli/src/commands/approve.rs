//! `foreman approve`: record a PM decision and run the approval cascade.

use foreman_config::AppConfig;
use foreman_orchestrator::Orchestrator;
use foreman_store::InMemoryBus;
use std::sync::Arc;

pub async fn run(
    config: &AppConfig,
    approval_id: &str,
    approved: bool,
    notes: &str,
    project: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let notifier = foreman_notify::build_from_config(config)?;
    let bus = Arc::new(InMemoryBus::new());
    let store = foreman_store::build_from_config(config);
    let mut orchestrator = Orchestrator::new(config, notifier)
        .with_bus(foreman_store::dedup_bus(config, bus.clone(), store.clone()));
    if let Some(store) = store {
        orchestrator = orchestrator.with_store(store);
    }

    let update = match project {
        Some(project) => {
            orchestrator
                .process_project_approval(project, approval_id, approved, notes)
                .await?
        }
        None => orchestrator.process_approval(approval_id, approved, notes).await?,
    };

    match update {
        Some(update) => {
            println!("Approved {} at {}", update.approval_id, update.processed_at.to_rfc3339());
            println!("Cascade messages published: {}", bus.published_count().await);
        }
        None => println!("Rejected {approval_id}; no cascade."),
    }
    Ok(())
}
