//! riskmon - transaction risk monitoring against a policy endpoint
//!
//! # WARNING
//! - `custody quarantine` moves real funds. Use `--dry-run` first.
//! - A verdict is advisory; nothing here blocks a transaction on chain.

use std::path::PathBuf;

use anyhow::Result;
use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use tracing::error;

use risk_monitor::cli::commands;
use risk_monitor::config::Config;

/// Transaction risk monitor
#[derive(Parser)]
#[command(name = "riskmon")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "riskmon.toml")]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate inbound transactions of an address from the last N hours
    Monitor {
        /// Address to scan
        address: String,

        /// How far back to look, in hours
        lookback_hours: u32,
    },

    /// Evaluate a single policy event from a JSON file
    Check {
        /// Path to the event JSON
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Custody wallet management
    Custody {
        #[command(subcommand)]
        action: CustodyAction,
    },

    /// Show current configuration (secrets masked)
    Config,
}

#[derive(Subcommand)]
enum CustodyAction {
    /// Create a vault account with an asset wallet and print its deposit address
    Provision {
        /// Vault account name
        name: String,

        /// Asset to add
        #[arg(long, default_value = "ETH")]
        asset: String,

        /// Hide the vault in the provider console
        #[arg(long)]
        hidden: bool,
    },

    /// Create deposit_front and quarantine addresses for recent deposit addresses
    RouteAddresses {
        /// How far back to look, in hours
        #[arg(long, default_value = "24")]
        lookback_hours: u32,
    },

    /// Move the available balance from the deposit address to quarantine
    Quarantine {
        /// Vault account ID
        vault: String,

        /// Asset to move
        #[arg(long, default_value = "ETH")]
        asset: String,

        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,

        /// Report the transfer without executing it
        #[arg(long)]
        dry_run: bool,
    },
}

/// Usage errors exit 1; help and version still exit 0
fn usage_exit_code(e: &clap::Error) -> i32 {
    match e.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => 1,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("risk_monitor=info".parse()?),
        )
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            std::process::exit(usage_exit_code(&e));
        }
    };

    let config = match Config::load(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Monitor {
            address,
            lookback_hours,
        } => commands::monitor(&config, &address, lookback_hours).await,
        Commands::Check { file } => commands::check(&config, &file).await,
        Commands::Custody { action } => match action {
            CustodyAction::Provision {
                name,
                asset,
                hidden,
            } => commands::custody_provision(&config, &name, &asset, hidden).await,
            CustodyAction::RouteAddresses { lookback_hours } => {
                commands::custody_route_addresses(&config, lookback_hours).await
            }
            CustodyAction::Quarantine {
                vault,
                asset,
                force,
                dry_run,
            } => commands::custody_quarantine(&config, &vault, &asset, force, dry_run).await,
        },
        Commands::Config => commands::show_config(&config),
    };

    if let Err(e) = result {
        error!("Command failed: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
