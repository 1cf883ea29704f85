//! In-memory custody provider for workflow tests

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::{Error, Result};

use super::types::{
    AssetBalance, AssetWallet, DepositAddress, InternalTransfer, TransferReceipt, VaultAccount,
    VaultAsset,
};
use super::CustodyProvider;

#[derive(Default)]
struct State {
    vaults: Vec<VaultAccount>,
    addresses: HashMap<(String, String), Vec<DepositAddress>>,
    balances: HashMap<(String, String), String>,
    transfers: Vec<InternalTransfer>,
    next_id: u64,
}

#[derive(Default)]
pub struct FakeCustody {
    state: Mutex<State>,
}

fn key(vault_id: &str, asset_id: &str) -> (String, String) {
    (vault_id.to_string(), asset_id.to_string())
}

impl FakeCustody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_vault(&self, id: &str, assets: &[&str]) {
        let mut state = self.state.lock().unwrap();
        state.vaults.push(VaultAccount {
            id: id.to_string(),
            name: format!("vault-{}", id),
            hidden_on_ui: false,
            assets: assets
                .iter()
                .map(|a| VaultAsset {
                    id: a.to_string(),
                    total: None,
                    available: None,
                })
                .collect(),
        });
    }

    pub fn add_address(
        &self,
        vault_id: &str,
        asset_id: &str,
        address: &str,
        description: Option<&str>,
        created_at: Option<DateTime<Utc>>,
    ) {
        let mut state = self.state.lock().unwrap();
        state
            .addresses
            .entry(key(vault_id, asset_id))
            .or_default()
            .push(DepositAddress {
                asset_id: Some(asset_id.to_string()),
                address: address.to_string(),
                description: description.map(str::to_string),
                tag: None,
                address_type: Some("Permanent".to_string()),
                created_at,
            });
    }

    pub fn set_available(&self, vault_id: &str, asset_id: &str, available: &str) {
        let mut state = self.state.lock().unwrap();
        state
            .balances
            .insert(key(vault_id, asset_id), available.to_string());
    }

    pub fn transfers(&self) -> Vec<InternalTransfer> {
        self.state.lock().unwrap().transfers.clone()
    }

    pub fn addresses(&self, vault_id: &str, asset_id: &str) -> Vec<DepositAddress> {
        self.state
            .lock()
            .unwrap()
            .addresses
            .get(&key(vault_id, asset_id))
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl CustodyProvider for FakeCustody {
    async fn list_vault_accounts(&self) -> Result<Vec<VaultAccount>> {
        Ok(self.state.lock().unwrap().vaults.clone())
    }

    async fn get_vault_account(&self, vault_id: &str) -> Result<VaultAccount> {
        self.state
            .lock()
            .unwrap()
            .vaults
            .iter()
            .find(|v| v.id == vault_id)
            .cloned()
            .ok_or_else(|| Error::CustodyStatus {
                status: 404,
                body: format!("vault {} not found", vault_id),
            })
    }

    async fn create_vault_account(&self, name: &str, hidden_on_ui: bool) -> Result<VaultAccount> {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let vault = VaultAccount {
            id: state.next_id.to_string(),
            name: name.to_string(),
            hidden_on_ui,
            assets: Vec::new(),
        };
        state.vaults.push(vault.clone());
        Ok(vault)
    }

    async fn create_vault_asset(&self, vault_id: &str, asset_id: &str) -> Result<AssetWallet> {
        let mut state = self.state.lock().unwrap();
        let vault = state
            .vaults
            .iter_mut()
            .find(|v| v.id == vault_id)
            .ok_or_else(|| Error::Custody(format!("vault {} not found", vault_id)))?;
        vault.assets.push(VaultAsset {
            id: asset_id.to_string(),
            total: Some("0".to_string()),
            available: Some("0".to_string()),
        });
        Ok(AssetWallet {
            id: Some(asset_id.to_string()),
            address: None,
            status: Some("WAITING_FOR_APPROVAL".to_string()),
        })
    }

    async fn get_deposit_addresses(
        &self,
        vault_id: &str,
        asset_id: &str,
    ) -> Result<Vec<DepositAddress>> {
        Ok(self.addresses(vault_id, asset_id))
    }

    async fn generate_address(
        &self,
        vault_id: &str,
        asset_id: &str,
        description: &str,
    ) -> Result<DepositAddress> {
        let address = {
            let mut state = self.state.lock().unwrap();
            state.next_id += 1;
            format!("0x{:040x}", state.next_id)
        };
        self.add_address(vault_id, asset_id, &address, Some(description), Some(Utc::now()));
        Ok(self
            .addresses(vault_id, asset_id)
            .into_iter()
            .find(|a| a.address == address)
            .expect("address just inserted"))
    }

    async fn get_asset_balance(&self, vault_id: &str, asset_id: &str) -> Result<AssetBalance> {
        let state = self.state.lock().unwrap();
        let available = state
            .balances
            .get(&key(vault_id, asset_id))
            .cloned()
            .unwrap_or_else(|| "0".to_string());
        Ok(AssetBalance {
            id: asset_id.to_string(),
            total: available.clone(),
            available,
        })
    }

    async fn create_transaction(&self, transfer: &InternalTransfer) -> Result<TransferReceipt> {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        state.transfers.push(transfer.clone());
        Ok(TransferReceipt {
            id: format!("tx-{}", state.next_id),
            status: "SUBMITTED".to_string(),
        })
    }
}
