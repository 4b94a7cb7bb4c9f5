//! `foreman chat`: interactive or single-message chat with one assistant.

use foreman_agent::Assistant;
use foreman_config::AppConfig;
use foreman_store::SharedMemory;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

const DEFAULT_PERSONA: &str = "You are a construction project assistant. Answer concisely. \
Use the available tools for arithmetic, the current time, the project's active risks, \
and for paging people when something is urgent.";

pub async fn run(
    config: &AppConfig,
    message: Option<String>,
    name: String,
    persona: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    // Check for API key early and give a clear error
    if !config.has_api_key() {
        eprintln!();
        eprintln!("  ERROR: No API key configured!");
        eprintln!();
        eprintln!("  Set one of these environment variables:");
        eprintln!("    ANTHROPIC_API_KEY=sk-ant-...");
        eprintln!("    FOREMAN_API_KEY=sk-ant-...");
        eprintln!();
        eprintln!("  Or add it to your config file:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
        return Err("No API key found. See above for setup instructions.".into());
    }

    let provider = foreman_providers::build_from_config(config)?;
    let notifier = foreman_notify::build_from_config(config)?;
    let memory = foreman_store::build_from_config(config).map(SharedMemory::new);
    let tools = Arc::new(foreman_tools::default_registry(notifier, memory));

    let persona = persona.unwrap_or_else(|| DEFAULT_PERSONA.to_string());
    let mut assistant = Assistant::from_config(name, persona, config, provider, tools);

    if let Some(msg) = message {
        // Single message mode
        eprint!("  Thinking...");
        let outcome = assistant.chat_with_log(msg).await;
        eprint!("\r              \r");
        let outcome = outcome?;
        for entry in &outcome.tool_log {
            eprintln!("  [tool] {} -> {}", entry.tool, first_line(&entry.result));
        }
        println!("{}", outcome.text);
        return Ok(());
    }

    // Interactive mode
    println!();
    println!("  Foreman - interactive chat");
    println!();
    println!("  Assistant: {}", assistant.name());
    println!("  Model:     {}", config.model);
    println!("  Tools:     {}", assistant.tool_count());
    println!();
    println!("  Type your message and press Enter.");
    println!("  Type '/reset' to start over, 'exit' or Ctrl+D to quit.");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    prompt()?;

    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        match input {
            "" => {}
            "exit" | "quit" => break,
            "/reset" => {
                assistant.reset();
                println!("  (conversation cleared)");
            }
            _ => {
                eprint!("  ...");
                let result = assistant.chat_with_log(input).await;
                eprint!("\r     \r");
                match result {
                    Ok(outcome) => {
                        for entry in &outcome.tool_log {
                            println!("  [tool] {} -> {}", entry.tool, first_line(&entry.result));
                        }
                        println!();
                        for line in outcome.text.lines() {
                            println!("  {} > {line}", assistant.name());
                        }
                        println!();
                    }
                    Err(e) => {
                        eprintln!("  [Error] {e}");
                        println!();
                    }
                }
            }
        }
        prompt()?;
    }

    println!();
    println!("  Goodbye!");
    println!();
    Ok(())
}

fn prompt() -> std::io::Result<()> {
    print!("  You > ");
    std::io::stdout().flush()
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default()
}
