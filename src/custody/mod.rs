//! Custodial wallet provider integration
//!
//! The provider itself is external; this module defines the operations we
//! need from it and the small fund-routing workflows built on top:
//!
//! ```text
//! provision_deposit_wallet   create vault → add asset wallet → deposit address
//! create_routing_addresses   recent deposit address → "deposit_front" + "quarantine"
//! move_funds                 "deposit" address → "quarantine" address (full balance)
//! ```

pub mod fireblocks;
pub mod provision;
pub mod routing;
pub mod transfer;
pub mod types;

#[cfg(test)]
pub(crate) mod fake;

use async_trait::async_trait;

use crate::error::Result;

pub use fireblocks::FireblocksClient;
pub use provision::{provision_deposit_wallet, ProvisionedWallet};
pub use routing::{
    create_routing_addresses, recent_deposit_addresses, DepositRef, RoutingAddresses,
};
pub use transfer::{execute_move, find_address_by_tag, move_funds, plan_move, MoveOutcome, MovePlan};
pub use types::{
    AssetBalance, AssetWallet, DepositAddress, InternalTransfer, TransferReceipt, VaultAccount,
    VaultAsset,
};

/// Address purpose labels used for fund routing
pub const DEPOSIT_TAG: &str = "deposit";
pub const DEPOSIT_FRONT_TAG: &str = "deposit_front";
pub const QUARANTINE_TAG: &str = "quarantine";

/// Operations consumed from the custodial provider
#[async_trait]
pub trait CustodyProvider: Send + Sync {
    async fn list_vault_accounts(&self) -> Result<Vec<VaultAccount>>;

    async fn get_vault_account(&self, vault_id: &str) -> Result<VaultAccount>;

    async fn create_vault_account(&self, name: &str, hidden_on_ui: bool) -> Result<VaultAccount>;

    /// Add an asset wallet (e.g. "ETH") to a vault account
    async fn create_vault_asset(&self, vault_id: &str, asset_id: &str) -> Result<AssetWallet>;

    async fn get_deposit_addresses(
        &self,
        vault_id: &str,
        asset_id: &str,
    ) -> Result<Vec<DepositAddress>>;

    /// Generate a new deposit address labelled with `description`
    async fn generate_address(
        &self,
        vault_id: &str,
        asset_id: &str,
        description: &str,
    ) -> Result<DepositAddress>;

    async fn get_asset_balance(&self, vault_id: &str, asset_id: &str) -> Result<AssetBalance>;

    async fn create_transaction(&self, transfer: &InternalTransfer) -> Result<TransferReceipt>;
}
