//! The routing table.
//!
//! Each [`Rule`] matches one `(source_agent, event_type)` pair, optionally
//! guarded by a numeric payload field, and yields follow-up triggers for
//! other assistants plus an escalation decision. Every matching rule fires.

use foreman_config::AppConfig;
use foreman_core::event::{AgentEvent, CrossAgentTrigger};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Limits a rule can compare against, resolved from configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuleLimits {
    /// Dollar impact above which an event pages the PM
    pub impact_threshold: f64,
    /// Budget variance percentage above which finance reacts
    pub budget_variance_pct: f64,
}

impl RuleLimits {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            impact_threshold: config.escalation.impact_threshold,
            budget_variance_pct: config.thresholds.budget_variance_pct,
        }
    }
}

impl Default for RuleLimits {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Threshold {
    Fixed(f64),
    EscalationImpact,
    BudgetVariancePct,
}

impl Threshold {
    pub fn resolve(&self, limits: &RuleLimits) -> f64 {
        match self {
            Threshold::Fixed(v) => *v,
            Threshold::EscalationImpact => limits.impact_threshold,
            Threshold::BudgetVariancePct => limits.budget_variance_pct,
        }
    }
}

impl fmt::Display for Threshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Threshold::Fixed(v) => write!(f, "{v}"),
            Threshold::EscalationImpact => f.write_str("escalation.impact_threshold"),
            Threshold::BudgetVariancePct => f.write_str("thresholds.budget_variance_pct"),
        }
    }
}

/// When a rule applies. Missing or non-numeric fields read as 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Guard {
    Always,
    FieldAbove { field: String, threshold: Threshold },
}

impl Guard {
    pub fn field_above(field: &str, threshold: Threshold) -> Self {
        Guard::FieldAbove {
            field: field.to_string(),
            threshold,
        }
    }

    pub fn admits(&self, event: &AgentEvent, limits: &RuleLimits) -> bool {
        match self {
            Guard::Always => true,
            Guard::FieldAbove { field, threshold } => event.number(field) > threshold.resolve(limits),
        }
    }
}

impl fmt::Display for Guard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Guard::Always => f.write_str("always"),
            Guard::FieldAbove { field, threshold } => write!(f, "{field} > {threshold}"),
        }
    }
}

/// Whether a matching rule pages the project manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EscalationPolicy {
    Never,
    Always,
    WhenAbove { field: String, threshold: Threshold },
}

impl EscalationPolicy {
    pub fn requires(&self, event: &AgentEvent, limits: &RuleLimits) -> bool {
        match self {
            EscalationPolicy::Never => false,
            EscalationPolicy::Always => true,
            EscalationPolicy::WhenAbove { field, threshold } => {
                event.number(field) > threshold.resolve(limits)
            }
        }
    }
}

impl fmt::Display for EscalationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EscalationPolicy::Never => f.write_str("never"),
            EscalationPolicy::Always => f.write_str("always"),
            EscalationPolicy::WhenAbove { field, threshold } => {
                write!(f, "when {field} > {threshold}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerSpec {
    pub target_agent: String,
    pub target_action: String,
    /// 1 is most urgent.
    pub priority: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub name: String,
    pub source_agent: String,
    pub event_type: String,
    pub guard: Guard,
    pub triggers: Vec<TriggerSpec>,
    pub escalation: EscalationPolicy,
}

impl Rule {
    pub fn new(source_agent: &str, event_type: &str) -> Self {
        Self {
            name: format!("{source_agent}.{event_type}"),
            source_agent: source_agent.to_string(),
            event_type: event_type.to_string(),
            guard: Guard::Always,
            triggers: Vec::new(),
            escalation: EscalationPolicy::Never,
        }
    }

    pub fn guard(mut self, guard: Guard) -> Self {
        self.guard = guard;
        self
    }

    pub fn trigger(mut self, target_agent: &str, target_action: &str, priority: u8) -> Self {
        self.triggers.push(TriggerSpec {
            target_agent: target_agent.to_string(),
            target_action: target_action.to_string(),
            priority,
        });
        self
    }

    pub fn escalate(mut self, policy: EscalationPolicy) -> Self {
        self.escalation = policy;
        self
    }

    pub fn matches(&self, event: &AgentEvent, limits: &RuleLimits) -> bool {
        self.source_agent == event.source_agent
            && self.event_type == event.event_type
            && self.guard.admits(event, limits)
    }
}

/// What the table decided for one event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleOutcome {
    /// In table order; callers sort by priority.
    pub triggers: Vec<CrossAgentTrigger>,
    pub escalate: bool,
    /// Names of the rules that fired.
    pub matched: Vec<String>,
}

/// An ordered rule table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleSet {
    pub rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// The fleet's routing table.
    pub fn default_rules() -> Self {
        use EscalationPolicy as Esc;

        Self::new(vec![
            Rule::new("supply_chain", "critical_delay")
                .trigger("critical_path", "reoptimize", 2)
                .escalate(Esc::WhenAbove {
                    field: "impact_dollars".into(),
                    threshold: Threshold::EscalationImpact,
                }),
            Rule::new("risk_forecaster", "safety_critical")
                .trigger("compliance", "focused_check", 1)
                .escalate(Esc::Always),
            Rule::new("compliance", "critical_deviation").trigger("risk_forecaster", "reassess", 3),
            Rule::new("document_intelligence", "contradiction_detected")
                .trigger("compliance", "focused_check", 3),
            Rule::new("financial", "budget_variance")
                .guard(Guard::field_above("variance_pct", Threshold::BudgetVariancePct))
                .trigger("critical_path", "reoptimize", 3)
                .trigger("supply_chain", "cost_reduction_scan", 3),
            Rule::new("workforce", "labor_shortage_detected")
                .trigger("critical_path", "reoptimize", 3)
                .trigger("site_logistics", "headcount_update", 4),
            Rule::new("commissioning_turnover", "prerequisite_blocked")
                .trigger("critical_path", "reoptimize", 3)
                .trigger("supply_chain", "expedite_check", 4),
            Rule::new("environmental_sustainability", "permit_violation_risk")
                .trigger("compliance", "focused_check", 2)
                .trigger("risk_forecaster", "reassess", 3),
            Rule::new("site_logistics", "crane_conflict")
                .trigger("critical_path", "reoptimize", 3)
                .trigger("safety_compliance", "crane_safety_check", 2),
            Rule::new("safety_compliance", "stop_work_recommended")
                .trigger("site_logistics", "halt_operations", 1)
                .trigger("critical_path", "reoptimize", 1)
                .escalate(Esc::Always),
            Rule::new("safety_compliance", "contractor_high_risk")
                .trigger("supply_chain", "contractor_review", 2)
                .trigger("risk_forecaster", "reassess", 3),
            Rule::new("safety_compliance", "exposure_threshold_exceeded")
                .trigger("environmental_sustainability", "exposure_response", 2)
                .trigger("workforce", "affected_workers", 2),
            Rule::new("safety_compliance", "training_expired")
                .trigger("workforce", "certification_alert", 3)
                .trigger("site_logistics", "access_restriction", 3),
            Rule::new("risk_forecaster", "heat_index_exceeded")
                .trigger("safety_compliance", "heat_illness_check", 2)
                .trigger("workforce", "schedule_adjustment", 3)
                .trigger("site_logistics", "schedule_adjustment", 3),
        ])
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Run `event` through every rule. Pure: no I/O, no side effects.
    pub fn evaluate(&self, event: &AgentEvent, limits: &RuleLimits) -> RuleOutcome {
        let mut outcome = RuleOutcome::default();
        for rule in self.rules.iter().filter(|r| r.matches(event, limits)) {
            outcome.matched.push(rule.name.clone());
            outcome.escalate |= rule.escalation.requires(event, limits);
            outcome.triggers.extend(rule.triggers.iter().map(|spec| CrossAgentTrigger {
                source_agent: event.source_agent.clone(),
                source_event_type: event.event_type.clone(),
                target_agent: spec.target_agent.clone(),
                target_action: spec.target_action.clone(),
                data: event.data.clone(),
                priority: spec.priority,
            }));
        }
        outcome
    }
}
