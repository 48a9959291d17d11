//! `invport`: load invoices from CSV, TXT, XLSX/XLS and JSON files and
//! report what was grouped, what failed and what needs attention.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{batch, config, detect, import};

/// Turn spreadsheet and text exports into grouped, validated invoices
#[derive(Parser)]
#[command(name = "invport")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log more (-v info, -vv debug, -vvv trace); logs go to stderr
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Config file to use instead of the per-user one
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import one file and print or save the invoices found
    Import(import::ImportArgs),

    /// Import every file matching a glob into an output directory
    Batch(batch::BatchArgs),

    /// Report file type, encoding, delimiter, sheets and layout
    Detect(detect::DetectArgs),

    /// Show, create or edit the config file
    Config(config::ConfigArgs),
}

fn log_level(verbose: u8) -> Level {
    match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Logs share stderr with progress output; stdout carries only results.
fn init_logging(verbose: u8) -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level(verbose))
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Import(args) => import::run(args, config_path).await,
        Commands::Batch(args) => batch::run(args, config_path).await,
        Commands::Detect(args) => detect::run(args, config_path).await,
        Commands::Config(args) => config::run(args, config_path).await,
    }
}
