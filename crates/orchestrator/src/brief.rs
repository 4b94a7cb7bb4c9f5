//! The morning brief: three threats, two quality gaps, one acceleration.
//!
//! Built from whatever the fleet has left in shared memory. A missing or
//! failing store never fails the brief; the affected sections fall back to
//! placeholders.

use chrono::{DateTime, NaiveDate, Utc};
use foreman_store::SharedMemory;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use tracing::{info, warn};

const THREAT_COUNT: usize = 3;
const GAP_COUNT: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreatSummary {
    pub rank: usize,
    pub title: String,
    pub agent_source: String,
    pub impact: String,
    pub confidence: f64,
    pub action_required: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityGap {
    #[serde(default)]
    pub rank: usize,
    pub title: String,
    #[serde(default = "default_gap_source")]
    pub agent_source: String,
    #[serde(default = "default_gap_severity")]
    pub severity: String,
    #[serde(default = "default_gap_location")]
    pub location: String,
}

fn default_gap_source() -> String {
    "quality_assurance".into()
}

fn default_gap_severity() -> String {
    "medium".into()
}

fn default_gap_location() -> String {
    "TBD".into()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccelerationOpportunity {
    pub title: String,
    #[serde(default = "default_acceleration_source")]
    pub agent_source: String,
    #[serde(default, alias = "days_saved")]
    pub potential_savings_days: u32,
    #[serde(default)]
    pub cost: f64,
    #[serde(default)]
    pub description: String,
}

fn default_acceleration_source() -> String {
    "critical_path".into()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyBriefOutput {
    pub brief_date: NaiveDate,
    pub generated_at: DateTime<Utc>,
    /// Always exactly three.
    pub top_threats: Vec<ThreatSummary>,
    /// At most two.
    pub quality_gaps: Vec<QualityGap>,
    pub acceleration: Option<AccelerationOpportunity>,
    pub full_text: String,
}

/// Assemble the brief for `project_id` dated `date`.
pub async fn generate_daily_brief(
    memory: Option<&SharedMemory>,
    project_id: &str,
    date: NaiveDate,
) -> DailyBriefOutput {
    let top_threats = collect_threats(memory, project_id).await;
    let quality_gaps = collect_quality_gaps(memory, project_id).await;
    let acceleration = Some(find_acceleration(memory, project_id).await);
    let full_text = render(date, &top_threats, &quality_gaps, acceleration.as_ref());

    info!(project = %project_id, date = %date, "Daily brief generated");

    DailyBriefOutput {
        brief_date: date,
        generated_at: Utc::now(),
        top_threats,
        quality_gaps,
        acceleration,
        full_text,
    }
}

async fn collect_threats(memory: Option<&SharedMemory>, project_id: &str) -> Vec<ThreatSummary> {
    let Some(memory) = memory else {
        return placeholder_threats();
    };
    let risks = match memory.top_risks(project_id, THREAT_COUNT).await {
        Ok(risks) => risks,
        Err(e) => {
            warn!(project = %project_id, error = %e, "Could not read active risks");
            return placeholder_threats();
        }
    };

    let mut threats: Vec<ThreatSummary> = risks
        .into_iter()
        .enumerate()
        .map(|(i, (risk_id, score))| ThreatSummary {
            rank: i + 1,
            title: format!("Risk {risk_id}"),
            agent_source: "risk_forecaster".into(),
            impact: format!("Score: {score:.1}"),
            confidence: 0.8,
            action_required: "Review and mitigate".into(),
        })
        .collect();

    while threats.len() < THREAT_COUNT {
        threats.push(ThreatSummary {
            rank: threats.len() + 1,
            title: "No additional threats identified".into(),
            agent_source: "orchestrator".into(),
            impact: "None".into(),
            confidence: 1.0,
            action_required: "None".into(),
        });
    }
    threats
}

fn placeholder_threats() -> Vec<ThreatSummary> {
    (1..=THREAT_COUNT)
        .map(|rank| ThreatSummary {
            rank,
            title: format!("Placeholder threat {rank}"),
            agent_source: "orchestrator".into(),
            impact: "Unknown".into(),
            confidence: 0.5,
            action_required: "Awaiting agent data".into(),
        })
        .collect()
}

async fn collect_quality_gaps(memory: Option<&SharedMemory>, project_id: &str) -> Vec<QualityGap> {
    let Some(memory) = memory else {
        return placeholder_gaps();
    };
    let stored = match memory.top_quality_gaps(project_id, GAP_COUNT).await {
        Ok(stored) => stored,
        Err(e) => {
            warn!(project = %project_id, error = %e, "Could not read quality gaps");
            return placeholder_gaps();
        }
    };

    let gaps: Vec<QualityGap> = stored
        .into_iter()
        .filter_map(|raw| serde_json::from_value::<QualityGap>(raw).ok())
        .take(GAP_COUNT)
        .enumerate()
        .map(|(i, gap)| QualityGap { rank: i + 1, ..gap })
        .collect();

    if gaps.is_empty() { placeholder_gaps() } else { gaps }
}

fn placeholder_gaps() -> Vec<QualityGap> {
    (1..=GAP_COUNT)
        .map(|rank| QualityGap {
            rank,
            title: format!("Placeholder gap {rank}"),
            agent_source: "orchestrator".into(),
            severity: "medium".into(),
            location: "TBD".into(),
        })
        .collect()
}

async fn find_acceleration(memory: Option<&SharedMemory>, project_id: &str) -> AccelerationOpportunity {
    let stored = match memory {
        Some(memory) => memory.acceleration(project_id).await.unwrap_or_else(|e| {
            warn!(project = %project_id, error = %e, "Could not read acceleration opportunity");
            None
        }),
        None => None,
    };
    stored
        .and_then(|raw| serde_json::from_value(raw).ok())
        .unwrap_or_else(placeholder_acceleration)
}

fn placeholder_acceleration() -> AccelerationOpportunity {
    AccelerationOpportunity {
        title: "No acceleration identified".into(),
        agent_source: "orchestrator".into(),
        potential_savings_days: 0,
        cost: 0.0,
        description: "Awaiting agent data".into(),
    }
}

/// Plain-text rendering suitable for SMS-to-email or a terminal.
pub fn render(
    date: NaiveDate,
    threats: &[ThreatSummary],
    gaps: &[QualityGap],
    acceleration: Option<&AccelerationOpportunity>,
) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Daily Brief - {}", date.format("%Y-%m-%d"));
    let _ = writeln!(out, "{}", "=".repeat(40));
    out.push('\n');

    out.push_str("TOP 3 THREATS:\n");
    for t in threats {
        let _ = writeln!(out, "  {}. {} ({}) - Impact: {}", t.rank, t.title, t.agent_source, t.impact);
    }
    out.push('\n');

    out.push_str("QUALITY GAPS:\n");
    for g in gaps {
        let _ = writeln!(out, "  {}. {} - Severity: {} @ {}", g.rank, g.title, g.severity, g.location);
    }
    out.push('\n');

    if let Some(a) = acceleration {
        out.push_str("ACCELERATION OPPORTUNITY:\n");
        let _ = writeln!(
            out,
            "  {} - {} days @ ${}",
            a.title,
            a.potential_savings_days,
            thousands(a.cost)
        );
    }

    out.trim_end().to_string()
}

/// Whole dollars with comma separators: 1234567.8 -> "1,234,568".
fn thousands(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{}", rounded.abs() as u64);
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if rounded < 0.0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}
