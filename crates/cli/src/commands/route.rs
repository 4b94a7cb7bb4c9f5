//! `foreman route`: run one agent event through the orchestrator.

use crate::OutputFormat;
use foreman_config::AppConfig;
use foreman_core::event::{AgentEvent, Severity, channels};
use foreman_orchestrator::Orchestrator;
use foreman_store::InMemoryBus;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

/// The fields an operator has to supply; the rest are filled in.
#[derive(Debug, Deserialize)]
struct EventInput {
    source_agent: String,
    event_type: String,
    #[serde(default = "default_severity")]
    severity: Severity,
    #[serde(default)]
    data: serde_json::Value,
    #[serde(default)]
    confidence: Option<f64>,
}

fn default_severity() -> Severity {
    Severity::Warning
}

impl EventInput {
    fn into_event(self) -> AgentEvent {
        let event = AgentEvent::new(self.source_agent, self.event_type, self.severity);
        let event = match self.data {
            serde_json::Value::Null => event,
            data => event.with_data(data),
        };
        match self.confidence {
            Some(confidence) => event.with_confidence(confidence),
            None => event,
        }
    }
}

fn read_input(path: &Path) -> std::io::Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        std::fs::read_to_string(path)
    }
}

pub async fn run(config: &AppConfig, input: &Path, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let raw = read_input(input).map_err(|e| format!("Failed to read {}: {e}", input.display()))?;
    let event = serde_json::from_str::<EventInput>(&raw)
        .map_err(|e| format!("Invalid event JSON: {e}"))?
        .into_event();

    let notifier = foreman_notify::build_from_config(config)?;
    let bus = Arc::new(InMemoryBus::new());
    let store = foreman_store::build_from_config(config);
    let mut orchestrator = Orchestrator::new(config, notifier)
        .with_bus(foreman_store::dedup_bus(config, bus.clone(), store.clone()));
    if let Some(store) = store {
        orchestrator = orchestrator.with_store(store);
    }

    let matched = orchestrator.rules().evaluate(&event, orchestrator.limits()).matched;
    let triggers = orchestrator.handle_event(&event).await;
    let escalations: Vec<serde_json::Value> = bus
        .history(channels::ESCALATION)
        .await
        .into_iter()
        .map(|m| m.payload)
        .collect();

    match format {
        OutputFormat::Json => crate::commands::print_json(&serde_json::json!({
            "event_id": event.event_id,
            "matched_rules": matched,
            "triggers": triggers,
            "escalations": escalations,
        }))?,
        OutputFormat::Text => {
            println!("Event: {}.{} ({})", event.source_agent, event.event_type, event.severity);
            if matched.is_empty() {
                println!("\n  No routing rule matched.");
                return Ok(());
            }
            println!("Rules: {}", matched.join(", "));
            println!("\nTriggers ({}):", triggers.len());
            for t in &triggers {
                println!("  [P{}] {} -> {}", t.priority, t.target_agent, t.target_action);
            }
            if escalations.is_empty() {
                println!("\nEscalation: none");
            } else {
                for e in &escalations {
                    println!("\nEscalation: {}", e["message"].as_str().unwrap_or_default());
                }
            }
        }
    }
    Ok(())
}
