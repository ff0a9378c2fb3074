//! Text Log Control - CLI over the per-day error log

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "textlogctl")]
#[command(about = "Append, inspect and export structured error logs", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Config file (default: ./textlog.toml, then ~/.config/textlog/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log folder, overrides the config file
    #[arg(long, global = true)]
    folder: Option<PathBuf>,

    /// Mirror records into this SQLite database
    #[arg(long, global = true, conflicts_with = "no_db")]
    db: Option<PathBuf>,

    /// Do not use the error table even if configured
    #[arg(long, global = true)]
    no_db: bool,

    /// Show debug diagnostics on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log one error record
    Log {
        #[arg(long)]
        trace_id: String,

        #[arg(long)]
        name: String,

        #[arg(long)]
        text: String,

        /// Timestamp as "YYYY/MM/DD HH:MM"
        #[arg(long)]
        date: String,

        #[arg(long)]
        user: Option<String>,

        /// DEBUG, INFO, WARNING, ERROR, CRITICAL (any tag is accepted)
        #[arg(long, default_value = textlog_common::record::DEFAULT_LEVEL)]
        level: String,
    },

    /// Print every entry at a level
    Print { level: String },

    /// Append every entry at a level to a file
    Export { level: String, destination: PathBuf },

    /// List trace ids in today's log file
    Ids,

    /// Delete all log files (and table rows)
    Clear,

    /// Log a sample record and print the ERROR level
    Demo,
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = commands::resolve_config(&cli)?;

    match cli.command {
        Commands::Log {
            trace_id,
            name,
            text,
            date,
            user,
            level,
        } => commands::log(&config, &trace_id, &name, &text, &date, user.as_deref(), &level),
        Commands::Print { level } => commands::print(&config, &level),
        Commands::Export { level, destination } => commands::export(&config, &level, &destination),
        Commands::Ids => commands::ids(&config),
        Commands::Clear => commands::clear(&config),
        Commands::Demo => commands::demo(&config),
    }
}
