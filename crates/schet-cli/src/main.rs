//! CLI application for Russian invoice ingestion.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{batch, config, process, rules};

/// Russian invoice ingestion - rasterize, OCR and extract structured fields
#[derive(Parser)]
#[command(name = "schet")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to pipeline config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Path to a rule-set file (default: built-in Russian rules)
    #[arg(short, long, global = true)]
    rules: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process a single invoice file
    Process(process::ProcessArgs),

    /// Process multiple invoice files
    Batch(batch::BatchArgs),

    /// Manage extraction rules
    Rules(rules::RulesArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Process(args) => {
            process::run(args, cli.config.as_deref(), cli.rules.as_deref()).await
        }
        Commands::Batch(args) => {
            batch::run(args, cli.config.as_deref(), cli.rules.as_deref()).await
        }
        Commands::Rules(args) => rules::run(args).await,
        Commands::Config(args) => config::run(args, cli.config.as_deref()).await,
    }
}
