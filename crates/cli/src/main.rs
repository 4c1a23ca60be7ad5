use anyhow::Result;
use clap::{Parser, Subcommand};
use cli::commands::{show_analytics, ChatCommand, DocsCommand, HistoryCommand, VectorDbCommand};
use cli::Runtime;
use common::{init_structured_logging, AppConfig, LoggingConfig};
use console::style;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sv-assistant")]
#[command(about = "SportzVillage role-based operations assistant")]
#[command(version)]
struct Cli {
    /// TOML configuration file (defaults to ./sv-assistant.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Chat(ChatCommand),
    History(HistoryCommand),
    /// Show usage analytics over all logged interactions
    Analytics,
    #[command(name = "vectordb")]
    VectorDb(VectorDbCommand),
    Docs(DocsCommand),
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("{} {:#}", style("Error:").red().bold(), e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load(cli.config.as_deref())?;
    init_structured_logging(LoggingConfig::from_settings(
        config.logging.debug_mode,
        cli.json_logs || config.logging.json,
    ))?;

    let runtime = Runtime::open(config).await?;
    match cli.command {
        Commands::Chat(cmd) => cmd.execute(runtime).await,
        Commands::History(cmd) => cmd.execute(runtime).await,
        Commands::Analytics => show_analytics(runtime).await,
        Commands::VectorDb(cmd) => cmd.execute(runtime).await,
        Commands::Docs(cmd) => cmd.execute(runtime).await,
    }
}
