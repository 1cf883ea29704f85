//! Custody provider data types
//!
//! Field names follow the provider's REST payloads (camelCase). Amounts stay
//! as decimal strings, exactly as the provider reports them.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Logical grouping of addresses/assets under one owner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaultAccount {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "hiddenOnUI")]
    pub hidden_on_ui: bool,
    #[serde(default)]
    pub assets: Vec<VaultAsset>,
}

/// Asset wallet inside a vault account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaultAsset {
    pub id: String,
    #[serde(default)]
    pub total: Option<String>,
    #[serde(default)]
    pub available: Option<String>,
}

/// Response to creating an asset wallet in a vault
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetWallet {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Deposit address of an asset wallet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepositAddress {
    #[serde(default)]
    pub asset_id: Option<String>,
    pub address: String,
    /// Label set when the address was generated
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default, rename = "type")]
    pub address_type: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl DepositAddress {
    /// Tagged addresses carry their purpose in `description`; `tag` is accepted too
    pub fn has_tag(&self, label: &str) -> bool {
        self.description.as_deref() == Some(label) || self.tag.as_deref() == Some(label)
    }
}

/// Balance of one asset wallet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetBalance {
    pub id: String,
    #[serde(default)]
    pub total: String,
    #[serde(default)]
    pub available: String,
}

impl AssetBalance {
    pub fn available_amount(&self) -> Result<Decimal> {
        parse_amount("available", &self.available)
    }
}

fn parse_amount(field: &str, raw: &str) -> Result<Decimal> {
    if raw.trim().is_empty() {
        return Ok(Decimal::ZERO);
    }
    Decimal::from_str(raw.trim())
        .map_err(|e| Error::Custody(format!("{} balance {:?} is not a number: {}", field, raw, e)))
}

/// Transfer between two addresses of the same vault account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InternalTransfer {
    pub vault_id: String,
    pub asset_id: String,
    pub source_address: String,
    pub destination_address: String,
    /// Decimal string in whole asset units
    pub amount: String,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReceipt {
    pub id: String,
    #[serde(default)]
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deposit_address_tag_match() {
        let addr: DepositAddress = serde_json::from_str(
            r#"{"assetId":"ETH","address":"0xq","description":"quarantine","tag":"","type":"Permanent"}"#,
        )
        .unwrap();
        assert!(addr.has_tag("quarantine"));
        assert!(!addr.has_tag("deposit"));
        assert!(addr.created_at.is_none());

        let tagged: DepositAddress =
            serde_json::from_str(r#"{"address":"0xd","tag":"deposit"}"#).unwrap();
        assert!(tagged.has_tag("deposit"));
    }

    #[test]
    fn test_created_at_parses() {
        let addr: DepositAddress = serde_json::from_str(
            r#"{"address":"0xd","createdAt":"2025-02-20T11:38:19.718Z"}"#,
        )
        .unwrap();
        assert_eq!(addr.created_at.unwrap().timestamp(), 1_740_051_499);
    }

    #[test]
    fn test_available_amount() {
        let balance = AssetBalance {
            id: "ETH".to_string(),
            total: "1.5".to_string(),
            available: "0.25".to_string(),
        };
        assert_eq!(balance.available_amount().unwrap(), Decimal::new(25, 2));

        let empty = AssetBalance {
            available: String::new(),
            ..balance.clone()
        };
        assert_eq!(empty.available_amount().unwrap(), Decimal::ZERO);

        let bad = AssetBalance {
            available: "lots".to_string(),
            ..balance
        };
        assert!(bad.available_amount().is_err());
    }

    #[test]
    fn test_vault_account_parses_provider_shape() {
        let vault: VaultAccount = serde_json::from_str(
            r#"{"id":"7","name":"My ETH Vault","hiddenOnUI":false,
                "assets":[{"id":"ETH","total":"0","available":"0","pending":"0"}]}"#,
        )
        .unwrap();
        assert_eq!(vault.assets[0].id, "ETH");
        assert!(!vault.hidden_on_ui);
    }
}
