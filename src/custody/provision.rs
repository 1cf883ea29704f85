//! Deposit wallet provisioning

use tracing::{info, warn};

use crate::error::{Error, Result};

use super::types::VaultAccount;
use super::CustodyProvider;

/// A freshly created vault with one asset wallet
#[derive(Debug, Clone)]
pub struct ProvisionedWallet {
    pub vault: VaultAccount,
    pub asset_id: String,
    /// `None` while the provider is still activating the wallet
    pub deposit_address: Option<String>,
}

/// Create a vault account, add an asset wallet to it, and fetch its deposit address.
///
/// Account-based chains use a single address per wallet, so the first one is returned.
pub async fn provision_deposit_wallet(
    provider: &dyn CustodyProvider,
    vault_name: &str,
    asset_id: &str,
    hidden_on_ui: bool,
) -> Result<ProvisionedWallet> {
    if vault_name.trim().is_empty() {
        return Err(Error::Custody("vault name must not be empty".to_string()));
    }

    let vault = provider
        .create_vault_account(vault_name, hidden_on_ui)
        .await?;
    info!("Vault account created: id={} name={}", vault.id, vault.name);

    let wallet = provider.create_vault_asset(&vault.id, asset_id).await?;
    info!("{} wallet added to vault account {}", asset_id, vault.id);

    let addresses = provider.get_deposit_addresses(&vault.id, asset_id).await?;
    let deposit_address = addresses
        .first()
        .map(|a| a.address.clone())
        .or(wallet.address);

    match &deposit_address {
        Some(address) => info!("{} deposit address: {}", asset_id, address),
        None => warn!(
            "No deposit address found for vault {} - wallet creation may still be processing",
            vault.id
        ),
    }

    Ok(ProvisionedWallet {
        vault,
        asset_id: asset_id.to_string(),
        deposit_address,
    })
}
