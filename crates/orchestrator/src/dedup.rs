//! Alert fingerprints.
//!
//! Two events carry the same alert when they share source, type and payload.
//! The event id and timestamp are excluded.

use foreman_core::event::AgentEvent;
use foreman_core::fingerprint::fingerprint;

/// Hex SHA-256 over the canonical JSON of `{source, type, data}`.
pub fn dedup_key(event: &AgentEvent) -> String {
    fingerprint(&serde_json::json!({
        "source": event.source_agent,
        "type": event.event_type,
        "data": event.data,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use foreman_core::event::Severity;
    use serde_json::json;

    #[test]
    fn ignores_id_timestamp_and_key_order() {
        let a = AgentEvent::new("supply_chain", "critical_delay", Severity::Critical)
            .with_data(json!({"impact_dollars": 300000, "po": "PO-17"}));
        let b = AgentEvent::new("supply_chain", "critical_delay", Severity::Warning)
            .with_data(json!({"po": "PO-17", "impact_dollars": 300000}));
        assert_ne!(a.event_id, b.event_id);
        assert_eq!(dedup_key(&a), dedup_key(&b));
        assert_eq!(dedup_key(&a).len(), 64);
    }

    #[test]
    fn differs_on_payload_source_or_type() {
        let base = AgentEvent::new("supply_chain", "critical_delay", Severity::Critical)
            .with_data(json!({"po": "PO-17"}));
        let other_payload = AgentEvent::new("supply_chain", "critical_delay", Severity::Critical)
            .with_data(json!({"po": "PO-18"}));
        let other_type = AgentEvent::new("supply_chain", "late_delivery", Severity::Critical)
            .with_data(json!({"po": "PO-17"}));
        let other_source = AgentEvent::new("financial", "critical_delay", Severity::Critical)
            .with_data(json!({"po": "PO-17"}));

        let key = dedup_key(&base);
        assert_ne!(key, dedup_key(&other_payload));
        assert_ne!(key, dedup_key(&other_type));
        assert_ne!(key, dedup_key(&other_source));
    }
}
