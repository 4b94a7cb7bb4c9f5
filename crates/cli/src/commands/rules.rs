//! `foreman rules`: show the routing table.

use crate::OutputFormat;
use foreman_config::AppConfig;
use foreman_orchestrator::{RuleLimits, RuleSet};

pub fn run(config: &AppConfig, format: OutputFormat) -> Result<(), Box<dyn std::error::Error>> {
    let rules = RuleSet::default_rules();
    if let OutputFormat::Json = format {
        return crate::commands::print_json(&rules);
    }

    let limits = RuleLimits::from_config(config);
    println!("Routing rules ({}):\n", rules.len());
    for (i, rule) in rules.rules.iter().enumerate() {
        println!("  {:>2}. {}", i + 1, rule.name);
        println!("      when:     {}", rule.guard);
        for t in &rule.triggers {
            println!("      trigger:  [P{}] {} -> {}", t.priority, t.target_agent, t.target_action);
        }
        println!("      escalate: {}", rule.escalation);
    }
    println!();
    println!("  escalation.impact_threshold   = {}", limits.impact_threshold);
    println!("  thresholds.budget_variance_pct = {}", limits.budget_variance_pct);
    Ok(())
}
