//! The fleet coordinator.
//!
//! Not an assistant: no model is involved. Events come in, the rule table
//! decides who reacts next, and the most serious events page the project
//! manager by SMS at most once per dedup window.

use crate::brief::{self, DailyBriefOutput};
use crate::dedup::dedup_key;
use crate::rules::{RuleLimits, RuleSet};
use chrono::Utc;
use foreman_config::{AppConfig, EscalationConfig};
use foreman_core::bus::{BusMessage, MessageBus, publish_json};
use foreman_core::error::Result;
use foreman_core::event::{
    AgentEvent, ApprovalUpdate, CrossAgentTrigger, EscalationEvent, Severity, channels,
};
use foreman_core::notify::{Notification, NotificationPriority, Notifier, truncate_chars};
use foreman_core::store::SharedStore;
use foreman_store::{SharedMemory, keys};
use futures::StreamExt;
use futures::stream::BoxStream;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

pub struct Orchestrator {
    rules: RuleSet,
    limits: RuleLimits,
    escalation: EscalationConfig,
    notifier: Arc<dyn Notifier>,
    memory: Option<SharedMemory>,
    bus: Option<Arc<dyn MessageBus>>,
}

impl Orchestrator {
    /// An orchestrator with the default rule table and no store or bus.
    pub fn new(config: &AppConfig, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            rules: RuleSet::default_rules(),
            limits: RuleLimits::from_config(config),
            escalation: config.escalation.clone(),
            notifier,
            memory: None,
            bus: None,
        }
    }

    pub fn with_store(mut self, store: Arc<dyn SharedStore>) -> Self {
        self.memory = Some(SharedMemory::new(store));
        self
    }

    pub fn with_bus(mut self, bus: Arc<dyn MessageBus>) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn with_rules(mut self, rules: RuleSet) -> Self {
        self.rules = rules;
        self
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn limits(&self) -> &RuleLimits {
        &self.limits
    }

    pub fn memory(&self) -> Option<&SharedMemory> {
        self.memory.as_ref()
    }

    /// Route one event. Returns the follow-up triggers, most urgent first;
    /// equal priorities keep table order.
    ///
    /// Escalation happens as a side effect. A failed page is logged and does
    /// not affect the returned triggers.
    pub async fn handle_event(&self, event: &AgentEvent) -> Vec<CrossAgentTrigger> {
        let outcome = self.rules.evaluate(event, &self.limits);

        if outcome.matched.is_empty() {
            debug!(
                source = %event.source_agent,
                event_type = %event.event_type,
                "No routing rule matched"
            );
        }

        if outcome.escalate {
            match self.escalate(event).await {
                Ok(Some(_)) => {}
                Ok(None) => debug!(event_type = %event.event_type, "Escalation suppressed as duplicate"),
                Err(e) => error!(
                    source = %event.source_agent,
                    event_type = %event.event_type,
                    error = %e,
                    "Escalation failed"
                ),
            }
        }

        let mut triggers = outcome.triggers;
        triggers.sort_by_key(|t| t.priority);

        for trigger in &triggers {
            info!(
                source = %trigger.source_agent,
                event_type = %trigger.source_event_type,
                target = %trigger.target_agent,
                action = %trigger.target_action,
                priority = trigger.priority,
                "Cross-agent trigger"
            );
        }
        triggers
    }

    /// Does this event warrant paging a human?
    pub fn check_escalation(&self, event: &AgentEvent) -> bool {
        event.flag("safety_critical") || event.number("impact_dollars") > self.escalation.impact_threshold
    }

    /// Has an identical alert already gone out within the dedup window?
    ///
    /// The first caller claims the alert and gets `false`. Without a store
    /// nothing is ever a duplicate; a store failure also answers `false`.
    pub async fn check_dedup(&self, event: &AgentEvent) -> bool {
        let Some(memory) = &self.memory else {
            return false;
        };
        let hash = dedup_key(event);
        match memory.claim_dedup(&hash, self.escalation.dedup_ttl()).await {
            Ok(claimed) => !claimed,
            Err(e) => {
                warn!(error = %e, "Dedup check failed, treating alert as new");
                false
            }
        }
    }

    /// Page the project manager about `event`.
    ///
    /// Returns `None` when an identical alert was already sent in the dedup
    /// window. If the notifier fails, the dedup claim is released so a later
    /// attempt can page.
    pub async fn escalate(&self, event: &AgentEvent) -> Result<Option<EscalationEvent>> {
        if self.check_dedup(event).await {
            info!(
                source = %event.source_agent,
                event_type = %event.event_type,
                "Duplicate alert within dedup window, not paging"
            );
            return Ok(None);
        }

        let message = self.escalation_message(event);
        let notification = Notification::sms(self.escalation.pm_phone_number.clone(), message.clone())
            .with_priority(NotificationPriority::Critical);

        if let Err(e) = self.notifier.send(&notification).await {
            self.release_dedup(event).await;
            return Err(e.into());
        }

        let escalation = EscalationEvent {
            event_id: uuid::Uuid::new_v4().to_string(),
            trigger_agent: event.source_agent.clone(),
            trigger_type: event.event_type.clone(),
            severity: Severity::Critical,
            impact_dollars: event.number("impact_dollars"),
            safety_critical: event.flag("safety_critical"),
            message,
            sms_sent: true,
            timestamp: Utc::now(),
        };

        warn!(
            source = %event.source_agent,
            event_type = %event.event_type,
            impact_dollars = escalation.impact_dollars,
            "Escalated to project manager"
        );

        if let Some(bus) = &self.bus {
            // The page already went out; a lost audit record is not worth failing over.
            if let Err(e) = publish_json(bus.as_ref(), channels::ESCALATION, &escalation).await {
                warn!(error = %e, "Could not publish escalation record");
            }
        }
        Ok(Some(escalation))
    }

    fn escalation_message(&self, event: &AgentEvent) -> String {
        let mut message = format!("[CRITICAL] {}: {}", event.source_agent, event.event_type);
        if let Some(description) = event.text("description").filter(|d| !d.is_empty()) {
            message.push_str(" - ");
            message.push_str(description);
        }
        truncate_chars(&message, self.escalation.sms_max_len).to_string()
    }

    async fn release_dedup(&self, event: &AgentEvent) {
        if let Some(memory) = &self.memory {
            let key = keys::dedup(&dedup_key(event));
            if let Err(e) = memory.store().delete(&key).await {
                warn!(error = %e, "Could not release dedup claim");
            }
        }
    }

    /// Record a PM decision. Approvals are announced on
    /// `channel:approval_updates`; rejections go nowhere.
    pub async fn process_approval(
        &self,
        approval_id: &str,
        approved: bool,
        notes: &str,
    ) -> Result<Option<ApprovalUpdate>> {
        if !approved {
            info!(approval_id, "Approval rejected, no cascade");
            return Ok(None);
        }

        let update = ApprovalUpdate {
            approval_id: approval_id.to_string(),
            approved,
            notes: notes.to_string(),
            processed_at: Utc::now(),
        };
        if let Some(bus) = &self.bus {
            publish_json(bus.as_ref(), channels::APPROVAL_UPDATES, &update).await?;
        }
        info!(approval_id, "Approval cascaded");
        Ok(Some(update))
    }

    /// Like [`process_approval`](Self::process_approval), and also clears
    /// the id from the project's pending set whichever way it was decided.
    pub async fn process_project_approval(
        &self,
        project_id: &str,
        approval_id: &str,
        approved: bool,
        notes: &str,
    ) -> Result<Option<ApprovalUpdate>> {
        if let Some(memory) = &self.memory {
            match memory.remove_pending_approval(project_id, approval_id).await {
                Ok(true) => debug!(project = %project_id, approval_id, "Pending approval cleared"),
                Ok(false) => warn!(project = %project_id, approval_id, "Approval was not pending"),
                Err(e) => warn!(project = %project_id, error = %e, "Could not update pending approvals"),
            }
        }
        self.process_approval(approval_id, approved, notes).await
    }

    /// Assemble today's brief for `project_id`.
    pub async fn generate_daily_brief(&self, project_id: &str) -> DailyBriefOutput {
        brief::generate_daily_brief(self.memory.as_ref(), project_id, Utc::now().date_naive()).await
    }

    /// Consume `channel:agent_events` from `bus` and forward every resulting
    /// trigger to `sink`. Returns when the bus closes or the sink is dropped.
    pub async fn listen(&self, bus: &dyn MessageBus, sink: mpsc::Sender<CrossAgentTrigger>) -> Result<()> {
        let stream = bus.subscribe(channels::AGENT_EVENTS).await?;
        info!(bus = bus.name(), "Orchestrator listening for agent events");
        self.route_stream(stream, sink).await;
        Ok(())
    }

    /// Route every event on an already-subscribed stream.
    pub async fn route_stream(
        &self,
        mut stream: BoxStream<'static, BusMessage>,
        sink: mpsc::Sender<CrossAgentTrigger>,
    ) {
        while let Some(message) = stream.next().await {
            let event: AgentEvent = match serde_json::from_value(message.payload) {
                Ok(event) => event,
                Err(e) => {
                    warn!(channel = %message.channel, error = %e, "Skipping malformed agent event");
                    continue;
                }
            };
            for trigger in self.handle_event(&event).await {
                if sink.send(trigger).await.is_err() {
                    debug!("Trigger sink closed, orchestrator stopping");
                    return;
                }
            }
        }
        debug!("Agent event stream ended");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use foreman_core::error::{NotifyError, StoreError};
    use foreman_core::notify::Receipt;
    use foreman_store::{InMemoryBus, InMemoryStore};
    use serde_json::json;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<Notification>>,
        fail: bool,
    }

    impl RecordingNotifier {
        fn sent(&self) -> Vec<Notification> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        fn name(&self) -> &str {
            "recording"
        }

        async fn send(&self, notification: &Notification) -> std::result::Result<Receipt, NotifyError> {
            if self.fail {
                return Err(NotifyError::DeliveryFailed {
                    recipient: notification.recipient.clone(),
                    reason: "carrier down".into(),
                });
            }
            self.sent.lock().unwrap().push(notification.clone());
            Ok(Receipt {
                id: format!("SM{}", self.sent.lock().unwrap().len()),
                status: "queued".into(),
                sent_at: Utc::now(),
            })
        }
    }

    /// Every call fails as if the backend were down.
    struct DownStore;

    #[async_trait]
    impl SharedStore for DownStore {
        fn name(&self) -> &str {
            "down"
        }

        async fn get(&self, _: &str) -> std::result::Result<Option<String>, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }

        async fn set(&self, _: &str, _: &str, _: Option<Duration>) -> std::result::Result<(), StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }

        async fn set_if_absent(
            &self,
            _: &str,
            _: &str,
            _: Option<Duration>,
        ) -> std::result::Result<bool, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }

        async fn delete(&self, _: &str) -> std::result::Result<bool, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }

        async fn zadd(&self, _: &str, _: &str, _: f64) -> std::result::Result<(), StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }

        async fn zrevrange(&self, _: &str, _: usize) -> std::result::Result<Vec<(String, f64)>, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }

        async fn sadd(&self, _: &str, _: &str) -> std::result::Result<bool, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }

        async fn srem(&self, _: &str, _: &str) -> std::result::Result<bool, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }

        async fn smembers(&self, _: &str) -> std::result::Result<Vec<String>, StoreError> {
            Err(StoreError::Unavailable("connection refused".into()))
        }
    }

    fn config() -> AppConfig {
        let mut config = AppConfig::default();
        config.escalation.pm_phone_number = "+15550001111".into();
        config
    }

    fn event(source: &str, event_type: &str, data: serde_json::Value) -> AgentEvent {
        AgentEvent::new(source, event_type, Severity::Critical).with_data(data)
    }

    struct Fixture {
        orchestrator: Orchestrator,
        notifier: Arc<RecordingNotifier>,
        bus: Arc<InMemoryBus>,
    }

    fn fixture() -> Fixture {
        let notifier = Arc::new(RecordingNotifier::default());
        let bus = Arc::new(InMemoryBus::new());
        let orchestrator = Orchestrator::new(&config(), notifier.clone())
            .with_store(Arc::new(InMemoryStore::new()))
            .with_bus(bus.clone());
        Fixture {
            orchestrator,
            notifier,
            bus,
        }
    }

    #[tokio::test]
    async fn stop_work_pages_once_and_halts_site() {
        let f = fixture();
        let triggers = f
            .orchestrator
            .handle_event(&event(
                "safety_compliance",
                "stop_work_recommended",
                json!({"description": "Scaffold collapse risk on L7"}),
            ))
            .await;

        let routed: Vec<(&str, &str, u8)> = triggers
            .iter()
            .map(|t| (t.target_agent.as_str(), t.target_action.as_str(), t.priority))
            .collect();
        assert_eq!(
            routed,
            vec![
                ("site_logistics", "halt_operations", 1),
                ("critical_path", "reoptimize", 1)
            ]
        );

        let sent = f.notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipient, "+15550001111");
        assert_eq!(sent[0].priority, NotificationPriority::Critical);
        assert_eq!(
            sent[0].message,
            "[CRITICAL] safety_compliance: stop_work_recommended - Scaffold collapse risk on L7"
        );

        let records = f.bus.history(channels::ESCALATION).await;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].payload["sms_sent"], true);
        assert_eq!(records[0].payload["trigger_type"], "stop_work_recommended");
    }

    #[tokio::test]
    async fn repeated_alert_is_deduplicated() {
        let f = fixture();
        let alert = json!({"description": "Scaffold collapse risk on L7"});
        f.orchestrator
            .handle_event(&event("safety_compliance", "stop_work_recommended", alert.clone()))
            .await;
        let second = f
            .orchestrator
            .handle_event(&event("safety_compliance", "stop_work_recommended", alert))
            .await;

        // Routing still happens, paging does not.
        assert_eq!(second.len(), 2);
        assert_eq!(f.notifier.sent().len(), 1);
    }

    #[tokio::test]
    async fn triggers_sorted_by_priority_stably() {
        let f = fixture();
        let triggers = f
            .orchestrator
            .handle_event(&event("site_logistics", "crane_conflict", json!({})))
            .await;
        assert_eq!(triggers[0].target_agent, "safety_compliance");
        assert_eq!(triggers[0].priority, 2);
        assert_eq!(triggers[1].target_agent, "critical_path");

        let heat = f
            .orchestrator
            .handle_event(&event("risk_forecaster", "heat_index_exceeded", json!({})))
            .await;
        let order: Vec<&str> = heat.iter().map(|t| t.target_agent.as_str()).collect();
        assert_eq!(order, vec!["safety_compliance", "workforce", "site_logistics"]);
    }

    #[tokio::test]
    async fn small_budget_variance_routes_nowhere() {
        let f = fixture();
        let triggers = f
            .orchestrator
            .handle_event(&event("financial", "budget_variance", json!({"variance_pct": 5})))
            .await;
        assert!(triggers.is_empty());
        assert!(f.notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn unknown_event_is_not_an_error() {
        let f = fixture();
        let triggers = f
            .orchestrator
            .handle_event(&event("financial", "invoice_paid", json!({})))
            .await;
        assert!(triggers.is_empty());
    }

    #[tokio::test]
    async fn critical_delay_pages_only_above_threshold() {
        let f = fixture();
        let small = f
            .orchestrator
            .handle_event(&event("supply_chain", "critical_delay", json!({"impact_dollars": 120000})))
            .await;
        assert_eq!(small.len(), 1);
        assert!(f.notifier.sent().is_empty());

        f.orchestrator
            .handle_event(&event("supply_chain", "critical_delay", json!({"impact_dollars": 400000})))
            .await;
        assert_eq!(f.notifier.sent().len(), 1);
        let records = f.bus.history(channels::ESCALATION).await;
        assert_eq!(records[0].payload["impact_dollars"], 400000.0);
    }

    #[test]
    fn escalation_threshold_is_strict() {
        let orchestrator = Orchestrator::new(&config(), Arc::new(RecordingNotifier::default()));
        let threshold = config().escalation.impact_threshold;

        let below = event("supply_chain", "critical_delay", json!({"impact_dollars": threshold - 1.0}));
        let at = event("supply_chain", "critical_delay", json!({"impact_dollars": threshold}));
        let above = event("supply_chain", "critical_delay", json!({"impact_dollars": threshold + 1.0}));
        let safety = event("risk_forecaster", "safety_critical", json!({"safety_critical": true}));
        let cheap_safety = event(
            "risk_forecaster",
            "safety_critical",
            json!({"safety_critical": true, "impact_dollars": 10}),
        );

        assert!(!orchestrator.check_escalation(&below));
        assert!(!orchestrator.check_escalation(&at));
        assert!(orchestrator.check_escalation(&above));
        assert!(orchestrator.check_escalation(&safety));
        assert!(orchestrator.check_escalation(&cheap_safety));
        assert!(!orchestrator.check_escalation(&event("compliance", "ok", json!({}))));
    }

    #[tokio::test]
    async fn dedup_first_new_then_duplicate() {
        let f = fixture();
        let alert = event("risk_forecaster", "safety_critical", json!({"zone": "B2"}));
        assert!(!f.orchestrator.check_dedup(&alert).await);
        assert!(f.orchestrator.check_dedup(&alert).await);

        let other = event("risk_forecaster", "safety_critical", json!({"zone": "B3"}));
        assert!(!f.orchestrator.check_dedup(&other).await);
    }

    #[tokio::test(start_paused = true)]
    async fn dedup_window_expires() {
        let f = fixture();
        let alert = event("risk_forecaster", "safety_critical", json!({"zone": "B2"}));
        assert!(!f.orchestrator.check_dedup(&alert).await);
        tokio::time::advance(Duration::from_secs(14_400 + 1)).await;
        assert!(!f.orchestrator.check_dedup(&alert).await);
    }

    #[tokio::test]
    async fn without_store_nothing_is_duplicate() {
        let notifier = Arc::new(RecordingNotifier::default());
        let orchestrator = Orchestrator::new(&config(), notifier.clone());
        let alert = event("safety_compliance", "stop_work_recommended", json!({}));
        assert!(!orchestrator.check_dedup(&alert).await);
        assert!(!orchestrator.check_dedup(&alert).await);

        orchestrator.handle_event(&alert).await;
        orchestrator.handle_event(&alert).await;
        assert_eq!(notifier.sent().len(), 2);
    }

    #[tokio::test]
    async fn store_failure_fails_open() {
        let notifier = Arc::new(RecordingNotifier::default());
        let orchestrator = Orchestrator::new(&config(), notifier.clone()).with_store(Arc::new(DownStore));
        let alert = event("safety_compliance", "stop_work_recommended", json!({}));
        assert!(!orchestrator.check_dedup(&alert).await);

        let escalation = orchestrator.escalate(&alert).await.unwrap();
        assert!(escalation.is_some());
        assert_eq!(notifier.sent().len(), 1);
    }

    #[tokio::test]
    async fn notifier_failure_publishes_nothing_and_releases_claim() {
        let bus = Arc::new(InMemoryBus::new());
        let orchestrator = Orchestrator::new(
            &config(),
            Arc::new(RecordingNotifier {
                fail: true,
                ..Default::default()
            }),
        )
        .with_store(Arc::new(InMemoryStore::new()))
        .with_bus(bus.clone());

        let alert = event("safety_compliance", "stop_work_recommended", json!({}));
        let err = orchestrator.escalate(&alert).await.unwrap_err();
        assert!(matches!(err, foreman_core::Error::Notify(_)));
        assert!(bus.history(channels::ESCALATION).await.is_empty());

        // The claim was released, so the alert is still new.
        assert!(!orchestrator.check_dedup(&alert).await);

        // handle_event swallows the failure and still routes.
        let other = event("safety_compliance", "stop_work_recommended", json!({"zone": "C"}));
        assert_eq!(orchestrator.handle_event(&other).await.len(), 2);
    }

    #[tokio::test]
    async fn escalation_message_is_truncated() {
        let f = fixture();
        let long = "é".repeat(300);
        let record = f
            .orchestrator
            .escalate(&event("risk_forecaster", "safety_critical", json!({"description": long})))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.message.chars().count(), 160);
        assert!(record.message.starts_with("[CRITICAL] risk_forecaster: safety_critical - é"));
        assert_eq!(f.notifier.sent()[0].message, record.message);
    }

    #[tokio::test]
    async fn empty_description_is_omitted() {
        let f = fixture();
        let record = f
            .orchestrator
            .escalate(&event("risk_forecaster", "safety_critical", json!({"description": ""})))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.message, "[CRITICAL] risk_forecaster: safety_critical");
    }

    #[tokio::test]
    async fn approval_cascade() {
        let f = fixture();
        let update = f
            .orchestrator
            .process_approval("APR-7", true, "Go ahead with the resequence")
            .await
            .unwrap()
            .unwrap();
        assert!(update.approved);

        let published = f.bus.history(channels::APPROVAL_UPDATES).await;
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].payload["approval_id"], "APR-7");
        assert_eq!(published[0].payload["notes"], "Go ahead with the resequence");
    }

    #[tokio::test]
    async fn rejection_publishes_nothing() {
        let f = fixture();
        let update = f.orchestrator.process_approval("APR-8", false, "No").await.unwrap();
        assert!(update.is_none());
        assert!(f.bus.history(channels::APPROVAL_UPDATES).await.is_empty());
    }

    #[tokio::test]
    async fn approval_without_bus_still_returns_update() {
        let orchestrator = Orchestrator::new(&config(), Arc::new(RecordingNotifier::default()));
        let update = orchestrator.process_approval("APR-9", true, "").await.unwrap();
        assert!(update.is_some());
    }

    #[tokio::test]
    async fn project_approval_clears_pending() {
        let f = fixture();
        let memory = f.orchestrator.memory().unwrap();
        memory.add_pending_approval("tower-a", "APR-1").await.unwrap();
        memory.add_pending_approval("tower-a", "APR-2").await.unwrap();

        f.orchestrator
            .process_project_approval("tower-a", "APR-1", false, "Too costly")
            .await
            .unwrap();
        assert_eq!(memory.pending_approvals("tower-a").await.unwrap(), vec!["APR-2"]);
    }

    #[tokio::test]
    async fn brief_survives_store_outage() {
        let orchestrator = Orchestrator::new(&config(), Arc::new(RecordingNotifier::default()))
            .with_store(Arc::new(DownStore));
        let brief = orchestrator.generate_daily_brief("tower-a").await;
        assert_eq!(brief.top_threats.len(), 3);
        assert!(brief.quality_gaps.len() <= 2);
        assert_eq!(brief.top_threats[0].title, "Placeholder threat 1");
    }

    #[tokio::test]
    async fn route_stream_forwards_triggers_and_skips_garbage() {
        let orchestrator = Orchestrator::new(&config(), Arc::new(RecordingNotifier::default()));
        let bus = Arc::new(InMemoryBus::new());
        let stream = bus.subscribe(channels::AGENT_EVENTS).await.unwrap();

        let crane = event("site_logistics", "crane_conflict", json!({"crane": "TC-01"}));
        bus.publish(channels::AGENT_EVENTS, json!({"not": "an event"})).await.unwrap();
        publish_json(bus.as_ref(), channels::AGENT_EVENTS, &crane).await.unwrap();
        drop(bus);

        let (tx, mut rx) = mpsc::channel(16);
        orchestrator.route_stream(stream, tx).await;

        let mut received = Vec::new();
        while let Some(trigger) = rx.recv().await {
            received.push(trigger);
        }
        assert_eq!(received.len(), 2);
        assert_eq!(received[0].target_action, "crane_safety_check");
        assert_eq!(received[1].data["crane"], "TC-01");
    }
}
