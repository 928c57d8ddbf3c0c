use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

use commands::run::RunArgs;

#[derive(Parser)]
#[command(name = "outreach")]
#[command(author, version, about, long_about = None)]
#[command(
    about = "A CLI tool for sending connection requests from a real browser session",
    long_about = "Outreach drives a local Chrome instance through a list of profile pages, \
                  sending connection or message requests with optional personalized notes, \
                  under a persisted daily limit and randomized pacing."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Work through a target list in the browser
    Run(RunArgs),

    /// Show today's quota usage
    Quota {
        /// Path to the quota store CSV
        #[arg(long, default_value = "quota.csv", env = "OUTREACH_QUOTA_STORE")]
        quota_store: PathBuf,

        /// Daily action limit
        #[arg(long, default_value_t = 40, env = "OUTREACH_DAILY_LIMIT")]
        limit: u32,
    },

    /// Validate a target CSV without opening a browser
    Targets {
        /// Path to the target CSV file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Column holding profile URLs
        #[arg(long, default_value = "profile")]
        url_column: String,

        /// Column holding names for personalization
        #[arg(long)]
        name_column: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    // Execute the command
    match cli.command {
        Commands::Run(args) => commands::run::execute(args),
        Commands::Quota { quota_store, limit } => commands::quota::execute(&quota_store, limit),
        Commands::Targets {
            file,
            url_column,
            name_column,
        } => commands::targets::execute(&file, &url_column, name_column.as_deref()),
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new(
            "outreach=debug,outreach_core=debug,outreach_engine=debug,outreach_browser=debug",
        )
    } else {
        EnvFilter::new("outreach=info,outreach_engine=info,outreach_browser=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}
