use std::path::PathBuf;

use clap::{Parser, Subcommand};
use peakhour_core::Config;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "peakhour", version, about = "Daily peak-hour analysis of power readings")]
struct Cli {
    /// Config file, defaults to ~/.config/peakhour/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full analysis and write tables and charts
    Analyze(commands::analyze::AnalyzeArgs),
    /// Print a single table or chart
    Report {
        #[command(subcommand)]
        action: commands::report::ReportAction,
    },
    /// Import a readings CSV into the database
    Import(commands::import::ImportArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let path = match cli.config {
        Some(path) => path,
        None => Config::path()?,
    };
    let config = match &cli.command {
        // init must work even when the existing file is broken
        Commands::Config {
            action: commands::config::ConfigAction::Init { .. },
        } => Config::default(),
        _ => Config::load_from(&path)?,
    };

    match cli.command {
        Commands::Analyze(args) => commands::analyze::run(args, &config),
        Commands::Report { action } => commands::report::run(action, &config),
        Commands::Import(args) => commands::import::run(args, &config),
        Commands::Config { action } => commands::config::run(action, config, &path),
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("error: {e}");
        let code = if e.downcast_ref::<commands::NoData>().is_some() {
            2
        } else {
            1
        };
        std::process::exit(code);
    }
}
