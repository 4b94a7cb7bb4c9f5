//! Deterministic coordination for the Foreman fleet.
//!
//! The [`Orchestrator`] turns [`AgentEvent`](foreman_core::AgentEvent)s into
//! [`CrossAgentTrigger`](foreman_core::CrossAgentTrigger)s using an ordered
//! [`RuleSet`], pages the project manager for the most serious events, runs
//! the approval cascade and assembles the daily brief.

pub mod brief;
pub mod dedup;
pub mod orchestrator;
pub mod rules;

pub use brief::{AccelerationOpportunity, DailyBriefOutput, QualityGap, ThreatSummary};
pub use dedup::dedup_key;
pub use orchestrator::Orchestrator;
pub use rules::{EscalationPolicy, Guard, Rule, RuleLimits, RuleOutcome, RuleSet, Threshold, TriggerSpec};
