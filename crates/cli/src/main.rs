//! Foreman CLI: the main entry point.
//!
//! Commands:
//! - `chat`: Talk to an assistant (interactive or single message)
//! - `route`: Run an agent event through the orchestrator
//! - `brief`: Print the daily brief for a project
//! - `rules`: Show the routing table
//! - `approve`: Approve or reject a pending action
//! - `status`: Show configuration status

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "foreman",
    about = "Foreman - construction project assistants and their coordinator",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit log lines as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Config file (defaults to ~/.foreman/config.toml)
    #[arg(short, long, global = true, env = "FOREMAN_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with an assistant
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// Assistant name, used in logs and agent status
        #[arg(short, long, default_value = "assistant")]
        name: String,

        /// Persona / system prompt
        #[arg(short, long)]
        persona: Option<String>,
    },

    /// Route an agent event (JSON file, or `-` for stdin) through the orchestrator
    Route {
        /// Path to the event JSON
        input: PathBuf,

        #[arg(short, long, value_enum, default_value_t)]
        format: OutputFormat,
    },

    /// Print the daily brief for a project
    ///
    /// The memory store lives only for this invocation, so risks and quality
    /// gaps recorded by other processes are not visible and the brief shows
    /// placeholders.
    Brief {
        project_id: String,

        #[arg(short, long, value_enum, default_value_t)]
        format: OutputFormat,
    },

    /// Show the routing table
    Rules {
        #[arg(short, long, value_enum, default_value_t)]
        format: OutputFormat,
    },

    /// Approve or reject a pending action
    ///
    /// With the memory store, `--project` starts from an empty pending set and
    /// reports the approval as not pending.
    Approve {
        approval_id: String,

        /// Reject instead of approving
        #[arg(long)]
        reject: bool,

        #[arg(short, long, default_value = "")]
        notes: String,

        /// Project whose pending set holds the approval
        #[arg(short, long)]
        project: Option<String>,
    },

    /// Show configuration status
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false);
    if cli.json {
        builder.json().init();
    } else {
        builder.init();
    }

    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Chat { message, name, persona } => {
            commands::chat::run(&config, message, name, persona).await?
        }
        Commands::Route { input, format } => commands::route::run(&config, &input, format).await?,
        Commands::Brief { project_id, format } => commands::brief::run(&config, &project_id, format).await?,
        Commands::Rules { format } => commands::rules::run(&config, format)?,
        Commands::Approve {
            approval_id,
            reject,
            notes,
            project,
        } => commands::approve::run(&config, &approval_id, !reject, &notes, project.as_deref()).await?,
        Commands::Status => commands::status::run(&config, cli.config.as_deref())?,
    }

    Ok(())
}
