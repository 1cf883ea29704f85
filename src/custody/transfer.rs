//! Moving funds between tagged addresses of one vault
//!
//! A move is planned first (resolve both addresses, read the available
//! balance) and executed separately so the caller can confirm in between.

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::error::Result;

use super::types::{InternalTransfer, TransferReceipt};
use super::CustodyProvider;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MovePlan {
    /// Ready to submit
    Ready(InternalTransfer),
    /// One or both tagged addresses do not exist
    MissingAddress {
        source: Option<String>,
        destination: Option<String>,
    },
    /// Nothing available to move
    NoFunds { available: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    Transferred {
        transfer: InternalTransfer,
        receipt: TransferReceipt,
    },
    MissingAddress {
        source: Option<String>,
        destination: Option<String>,
    },
    NoFunds {
        available: String,
    },
}

/// Address in the vault's asset wallet labelled `tag`
pub async fn find_address_by_tag(
    provider: &dyn CustodyProvider,
    vault_id: &str,
    asset_id: &str,
    tag: &str,
) -> Result<Option<String>> {
    let addresses = provider.get_deposit_addresses(vault_id, asset_id).await?;
    Ok(addresses
        .into_iter()
        .find(|a| a.has_tag(tag))
        .map(|a| a.address))
}

/// Resolve addresses and balance for moving the full available balance
pub async fn plan_move(
    provider: &dyn CustodyProvider,
    vault_id: &str,
    asset_id: &str,
    source_tag: &str,
    destination_tag: &str,
) -> Result<MovePlan> {
    let source = find_address_by_tag(provider, vault_id, asset_id, source_tag).await?;
    let destination = find_address_by_tag(provider, vault_id, asset_id, destination_tag).await?;

    let (source_address, destination_address) = match (source, destination) {
        (Some(s), Some(d)) => (s, d),
        (source, destination) => {
            warn!(
                "Missing address: {}={:?}, {}={:?}",
                source_tag, source, destination_tag, destination
            );
            return Ok(MovePlan::MissingAddress {
                source,
                destination,
            });
        }
    };

    let balance = provider.get_asset_balance(vault_id, asset_id).await?;
    let available = balance.available_amount()?;
    if available <= Decimal::ZERO {
        warn!("No available {} funds to transfer in vault {}", asset_id, vault_id);
        return Ok(MovePlan::NoFunds {
            available: balance.available,
        });
    }

    Ok(MovePlan::Ready(InternalTransfer {
        vault_id: vault_id.to_string(),
        asset_id: asset_id.to_string(),
        source_address,
        destination_address,
        amount: balance.available.trim().to_string(),
        note: format!(
            "Auto-transfer to {} on {}",
            destination_tag,
            Utc::now().to_rfc3339()
        ),
    }))
}

/// Submit a planned transfer
pub async fn execute_move(
    provider: &dyn CustodyProvider,
    transfer: &InternalTransfer,
) -> Result<TransferReceipt> {
    let receipt = provider.create_transaction(transfer).await?;
    info!(
        "Transfer initiated. TX ID: {}, Status: {} ({} {} {} -> {})",
        receipt.id,
        receipt.status,
        transfer.amount,
        transfer.asset_id,
        transfer.source_address,
        transfer.destination_address
    );
    Ok(receipt)
}

/// Plan and execute in one step
pub async fn move_funds(
    provider: &dyn CustodyProvider,
    vault_id: &str,
    asset_id: &str,
    source_tag: &str,
    destination_tag: &str,
) -> Result<MoveOutcome> {
    match plan_move(provider, vault_id, asset_id, source_tag, destination_tag).await? {
        MovePlan::Ready(transfer) => {
            let receipt = execute_move(provider, &transfer).await?;
            Ok(MoveOutcome::Transferred { transfer, receipt })
        }
        MovePlan::MissingAddress {
            source,
            destination,
        } => Ok(MoveOutcome::MissingAddress {
            source,
            destination,
        }),
        MovePlan::NoFunds { available } => Ok(MoveOutcome::NoFunds { available }),
    }
}
