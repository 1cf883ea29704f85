//! CLI command implementations

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use dialoguer::Confirm;
use tracing::{info, warn};

use crate::config::Config;
use crate::custody::{
    create_routing_addresses, execute_move, plan_move, provision_deposit_wallet,
    recent_deposit_addresses, FireblocksClient, MovePlan, DEPOSIT_TAG, QUARANTINE_TAG,
};
use crate::explorer::ExplorerClient;
use crate::firewall::{parse_policy_event, RiskEvaluationClient};
use crate::monitor::AddressMonitor;

/// Evaluate recent inbound transactions of an address
pub async fn monitor(config: &Config, address: &str, lookback_hours: u32) -> Result<()> {
    let explorer = ExplorerClient::new(&config.explorer)?;
    let firewall = RiskEvaluationClient::new(&config.firewall)?;
    let monitor = AddressMonitor::new(explorer, firewall, config.explorer.network.clone());

    let report = monitor
        .scan(address, lookback_hours)
        .await
        .with_context(|| format!("Failed to scan {}", address))?;

    println!("\n=== RISK SCAN: {} ===\n", report.address);
    println!("Since: {}", report.cutoff.to_rfc3339());
    println!("Transactions found: {}", report.found());

    if report.outcomes.is_empty() {
        println!("No inbound transactions in the last {} hours.", lookback_hours);
        return Ok(());
    }

    println!();
    println!("{:<68} {}", "TX HASH", "RESULT");
    println!("{}", "-".repeat(100));
    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(verdict) => println!("{:<68} {}", outcome.hash, verdict),
            Err(e) => println!("{:<68} ERROR: {}", outcome.hash, e),
        }
    }

    println!("\nSummary:");
    for (action, count) in report.action_counts() {
        println!("  {}: {}", action, count);
    }
    if report.failed() > 0 {
        println!("  errors: {}", report.failed());
    }

    let flagged = report.needs_attention().count();
    if flagged > 0 {
        warn!("{} transaction(s) need attention", flagged);
    }

    Ok(())
}

/// Evaluate a single policy event read from a JSON file
pub async fn check(config: &Config, file: &Path) -> Result<()> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("Cannot read {}", file.display()))?;
    let descriptor = parse_policy_event(&raw)?;
    info!("Evaluating {}", descriptor.label());

    let client = RiskEvaluationClient::new(&config.firewall)?;
    let verdict = client.evaluate(&descriptor).await?;

    println!("Event kind: {}", descriptor.mode());
    println!("Action: {}", verdict.action());
    println!("Event ID: {}", verdict.event_id());
    Ok(())
}

/// Create a vault account with one asset wallet
pub async fn custody_provision(
    config: &Config,
    name: &str,
    asset: &str,
    hidden: bool,
) -> Result<()> {
    let custody = FireblocksClient::new(&config.custody)?;
    let wallet = provision_deposit_wallet(&custody, name, asset, hidden).await?;

    println!("\n=== VAULT CREATED ===");
    println!("Vault ID: {}", wallet.vault.id);
    println!("Name: {}", wallet.vault.name);
    match &wallet.deposit_address {
        Some(address) => println!("{} deposit address: {}", wallet.asset_id, address),
        None => println!(
            "{} deposit address: pending (re-check the vault shortly)",
            wallet.asset_id
        ),
    }
    Ok(())
}

/// Create routing addresses for deposit addresses created recently
pub async fn custody_route_addresses(config: &Config, lookback_hours: u32) -> Result<()> {
    let custody = FireblocksClient::new(&config.custody)?;
    let cutoff = Utc::now() - Duration::hours(i64::from(lookback_hours));

    let deposits = recent_deposit_addresses(&custody, cutoff).await?;
    if deposits.is_empty() {
        warn!("No deposit addresses created in the last {} hours", lookback_hours);
        return Ok(());
    }
    info!("Found {} recent deposit address(es)", deposits.len());

    let created = create_routing_addresses(&custody, &deposits).await?;

    println!("\n=== ROUTING ADDRESSES ===\n");
    for routing in &created {
        println!(
            "Vault {} / {}: {}",
            routing.deposit.vault_account_id, routing.deposit.asset_id, routing.deposit.address
        );
        println!("  deposit_front: {}", routing.deposit_front);
        println!("  quarantine:    {}", routing.quarantine);
    }
    Ok(())
}

/// Move the full available balance from the deposit address to quarantine
pub async fn custody_quarantine(
    config: &Config,
    vault: &str,
    asset: &str,
    force: bool,
    dry_run: bool,
) -> Result<()> {
    let custody = FireblocksClient::new(&config.custody)?;

    let transfer = match plan_move(&custody, vault, asset, DEPOSIT_TAG, QUARANTINE_TAG).await? {
        MovePlan::Ready(transfer) => transfer,
        MovePlan::MissingAddress {
            source,
            destination,
        } => {
            warn!(
                "Nothing moved: {} address {}, {} address {}",
                DEPOSIT_TAG,
                source.as_deref().unwrap_or("missing"),
                QUARANTINE_TAG,
                destination.as_deref().unwrap_or("missing")
            );
            return Ok(());
        }
        MovePlan::NoFunds { available } => {
            warn!("Nothing moved: available {} balance is {}", asset, available);
            return Ok(());
        }
    };

    if dry_run {
        println!("\n=== DRY RUN ===");
        println!("Would move {} {}", transfer.amount, transfer.asset_id);
        println!("From: {}", transfer.source_address);
        println!("To: {}", transfer.destination_address);
        return Ok(());
    }

    if !force {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Move {} {} from {} to {}? This cannot be undone.",
                transfer.amount, transfer.asset_id, transfer.source_address, transfer.destination_address
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            info!("Quarantine transfer cancelled by user");
            return Ok(());
        }
    }

    let receipt = execute_move(&custody, &transfer).await?;

    println!("\n=== TRANSFER SUBMITTED ===");
    println!("Amount: {} {}", transfer.amount, transfer.asset_id);
    println!("To: {}", transfer.destination_address);
    println!("TX ID: {}", receipt.id);
    println!("Status: {}", receipt.status);
    Ok(())
}

/// Show current configuration (secrets masked)
pub fn show_config(config: &Config) -> Result<()> {
    println!("{}", config.masked_display());
    Ok(())
}
