//! `foreman status`: show configuration status.

use foreman_config::{AppConfig, NotifierKind, StoreBackend};
use std::path::Path;

pub fn run(config: &AppConfig, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("Foreman Status");
    println!("==============\n");

    println!("  Version:      {}", env!("CARGO_PKG_VERSION"));
    println!("  Model:        {}", config.model);
    println!("  Max tokens:   {}", config.max_tokens);
    println!("  API key:      {}", if config.has_api_key() { "configured" } else { "missing" });
    println!("  Max turns:    {}", config.agent.max_turns);
    match config.agent.deadline() {
        Some(deadline) => println!("  Deadline:     {}s", deadline.as_secs()),
        None => println!("  Deadline:     none"),
    }
    let notifier = match config.notifier.kind {
        NotifierKind::Log => "log",
        NotifierKind::Twilio => "twilio",
    };
    let store = store_label(&config.store.backend);
    println!("  Notifier:     {notifier}");
    println!("  Store:        {store}");
    let phone = if config.escalation.pm_phone_number.is_empty() {
        "not set"
    } else {
        config.escalation.pm_phone_number.as_str()
    };
    println!("  PM phone:     {phone}");
    println!("  Escalate at:  ${}", config.escalation.impact_threshold);
    println!("  Dedup window: {}s", config.escalation.dedup_ttl_secs);

    let config_path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"));
    if config_path.exists() {
        println!("\n  Config file: {}", config_path.display());
    } else {
        println!("\n  No config file at {}, using defaults", config_path.display());
    }
    Ok(())
}

fn store_label(backend: &StoreBackend) -> &'static str {
    match backend {
        StoreBackend::Memory => "memory (per process, empty at start of each command)",
        StoreBackend::None => "none",
    }
}
