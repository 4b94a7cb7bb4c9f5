//! Publishes an assistant's findings to the rest of the fleet.

use chrono::Utc;
use foreman_core::bus::{MessageBus, publish_json};
use foreman_core::error::Result;
use foreman_core::event::{AgentEvent, Severity, channels};
use foreman_store::SharedMemory;
use std::sync::Arc;
use tracing::{debug, info};

/// Sends [`AgentEvent`]s on the bus and keeps the agent's status current in
/// shared memory. Either side may be absent, in which case that half is
/// skipped.
#[derive(Clone)]
pub struct EventPublisher {
    agent: String,
    bus: Option<Arc<dyn MessageBus>>,
    memory: Option<SharedMemory>,
}

impl EventPublisher {
    pub fn new(agent: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            bus: None,
            memory: None,
        }
    }

    pub fn with_bus(mut self, bus: Arc<dyn MessageBus>) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn with_memory(mut self, memory: SharedMemory) -> Self {
        self.memory = Some(memory);
        self
    }

    pub fn agent(&self) -> &str {
        &self.agent
    }

    /// Start an event attributed to this agent.
    pub fn event(&self, event_type: impl Into<String>, severity: Severity) -> AgentEvent {
        AgentEvent::new(self.agent.clone(), event_type, severity)
    }

    /// Record that the agent has started a run.
    pub async fn mark_running(&self) -> Result<()> {
        if let Some(memory) = &self.memory {
            memory.set_agent_status(&self.agent, "running").await?;
        }
        Ok(())
    }

    /// Publish `event` on `channel:agent_events`, and on `channel:escalation`
    /// too when it is critical. Then mark the agent completed.
    pub async fn publish(&self, event: &AgentEvent) -> Result<()> {
        if let Some(bus) = &self.bus {
            publish_json(bus.as_ref(), channels::AGENT_EVENTS, event).await?;
            if event.severity == Severity::Critical {
                publish_json(bus.as_ref(), channels::ESCALATION, event).await?;
            }
            info!(
                source = %event.source_agent,
                event_type = %event.event_type,
                severity = %event.severity,
                "Published agent event"
            );
        } else {
            debug!(event_type = %event.event_type, "No bus attached, event not published");
        }

        if let Some(memory) = &self.memory {
            memory.set_agent_status(&self.agent, "completed").await?;
            memory.set_agent_last_run(&self.agent, Utc::now()).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use foreman_store::{InMemoryBus, InMemoryStore};

    fn publisher() -> (EventPublisher, Arc<InMemoryBus>, SharedMemory) {
        let bus = Arc::new(InMemoryBus::new());
        let memory = SharedMemory::new(Arc::new(InMemoryStore::new()));
        let publisher = EventPublisher::new("risk_forecaster")
            .with_bus(bus.clone())
            .with_memory(memory.clone());
        (publisher, bus, memory)
    }

    #[tokio::test]
    async fn warning_goes_to_agent_events_only() {
        let (publisher, bus, memory) = publisher();
        let event = publisher
            .event("risk_forecast", Severity::Warning)
            .with_data(serde_json::json!({"risks": [{"id": "R-3"}]}));
        publisher.publish(&event).await.unwrap();

        let events = bus.history(channels::AGENT_EVENTS).await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].payload["event_type"], "risk_forecast");
        assert_eq!(events[0].payload["source_agent"], "risk_forecaster");
        assert!(bus.history(channels::ESCALATION).await.is_empty());

        assert_eq!(
            memory.agent_status("risk_forecaster").await.unwrap().as_deref(),
            Some("completed")
        );
        assert!(memory.agent_last_run("risk_forecaster").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn critical_is_also_escalated() {
        let (publisher, bus, _) = publisher();
        let event = publisher.event("safety_critical", Severity::Critical);
        publisher.publish(&event).await.unwrap();

        assert_eq!(bus.history(channels::AGENT_EVENTS).await.len(), 1);
        let escalations = bus.history(channels::ESCALATION).await;
        assert_eq!(escalations.len(), 1);
        assert_eq!(escalations[0].payload["severity"], "critical");
    }

    #[tokio::test]
    async fn running_then_completed() {
        let (publisher, _, memory) = publisher();
        publisher.mark_running().await.unwrap();
        assert_eq!(
            memory.agent_status("risk_forecaster").await.unwrap().as_deref(),
            Some("running")
        );
        publisher
            .publish(&publisher.event("risk_forecast", Severity::Info))
            .await
            .unwrap();
        assert_eq!(
            memory.agent_status("risk_forecaster").await.unwrap().as_deref(),
            Some("completed")
        );
    }

    #[tokio::test]
    async fn detached_publisher_is_a_no_op() {
        let publisher = EventPublisher::new("compliance");
        publisher
            .publish(&publisher.event("critical_deviation", Severity::Critical))
            .await
            .unwrap();
    }
}
