//! Routing addresses for new deposits
//!
//! Every deposit address created within the lookback window gets two
//! companions in the same vault/asset: a "deposit_front" address that is
//! handed out to depositors and a "quarantine" address that funds are moved
//! to when a deposit is flagged.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::error::Result;

use super::{CustodyProvider, DEPOSIT_FRONT_TAG, QUARANTINE_TAG};

/// A deposit address and where it lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepositRef {
    pub vault_account_id: String,
    pub asset_id: String,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingAddresses {
    pub deposit: DepositRef,
    pub deposit_front: String,
    pub quarantine: String,
}

/// Deposit addresses created at or after `cutoff`.
///
/// Addresses without a creation time are skipped, as are routing addresses
/// created by an earlier run.
pub async fn recent_deposit_addresses(
    provider: &dyn CustodyProvider,
    cutoff: DateTime<Utc>,
) -> Result<Vec<DepositRef>> {
    let mut recent = Vec::new();

    for account in provider.list_vault_accounts().await? {
        for asset in &account.assets {
            let addresses = provider
                .get_deposit_addresses(&account.id, &asset.id)
                .await?;

            for address in addresses {
                if address.has_tag(DEPOSIT_FRONT_TAG) || address.has_tag(QUARANTINE_TAG) {
                    continue;
                }
                match address.created_at {
                    Some(created) if created >= cutoff => recent.push(DepositRef {
                        vault_account_id: account.id.clone(),
                        asset_id: asset.id.clone(),
                        address: address.address,
                    }),
                    Some(_) => {}
                    None => debug!(
                        "Skipping {} in vault {}: no creation time",
                        address.address, account.id
                    ),
                }
            }
        }
    }

    Ok(recent)
}

/// Generate "deposit_front" and "quarantine" addresses for each deposit
pub async fn create_routing_addresses(
    provider: &dyn CustodyProvider,
    deposits: &[DepositRef],
) -> Result<Vec<RoutingAddresses>> {
    let mut created = Vec::with_capacity(deposits.len());

    for deposit in deposits {
        let front = provider
            .generate_address(&deposit.vault_account_id, &deposit.asset_id, DEPOSIT_FRONT_TAG)
            .await?;
        info!(
            "Created {} address {} for vault {} asset {}",
            DEPOSIT_FRONT_TAG, front.address, deposit.vault_account_id, deposit.asset_id
        );

        let quarantine = provider
            .generate_address(&deposit.vault_account_id, &deposit.asset_id, QUARANTINE_TAG)
            .await?;
        info!(
            "Created {} address {} for vault {} asset {}",
            QUARANTINE_TAG, quarantine.address, deposit.vault_account_id, deposit.asset_id
        );

        created.push(RoutingAddresses {
            deposit: deposit.clone(),
            deposit_front: front.address,
            quarantine: quarantine.address,
        });
    }

    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::custody::fake::FakeCustody;
    use chrono::Duration;

    #[tokio::test]
    async fn test_recent_addresses_respect_cutoff() {
        let custody = FakeCustody::new();
        let now = Utc::now();
        custody.add_vault("1", &["ETH", "USDC"]);
        custody.add_vault("2", &["ETH"]);
        custody.add_address("1", "ETH", "0xnew", None, Some(now - Duration::hours(2)));
        custody.add_address("1", "ETH", "0xold", None, Some(now - Duration::hours(48)));
        custody.add_address("1", "USDC", "0xundated", None, None);
        custody.add_address("2", "ETH", "0xfresh", None, Some(now));
        custody.add_address("2", "ETH", "0xq", Some(QUARANTINE_TAG), Some(now));

        let recent = recent_deposit_addresses(&custody, now - Duration::hours(24))
            .await
            .unwrap();
        let found: Vec<&str> = recent.iter().map(|d| d.address.as_str()).collect();
        assert_eq!(found, vec!["0xnew", "0xfresh"]);
        assert_eq!(recent[1].vault_account_id, "2");
        assert_eq!(recent[0].asset_id, "ETH");
    }

    #[tokio::test]
    async fn test_creates_both_routing_addresses() {
        let custody = FakeCustody::new();
        custody.add_vault("1", &["ETH"]);
        let deposits = vec![DepositRef {
            vault_account_id: "1".to_string(),
            asset_id: "ETH".to_string(),
            address: "0xdep".to_string(),
        }];

        let created = create_routing_addresses(&custody, &deposits).await.unwrap();
        assert_eq!(created.len(), 1);
        assert_ne!(created[0].deposit_front, created[0].quarantine);

        let stored = custody.addresses("1", "ETH");
        assert!(stored
            .iter()
            .any(|a| a.address == created[0].deposit_front && a.has_tag(DEPOSIT_FRONT_TAG)));
        assert!(stored
            .iter()
            .any(|a| a.address == created[0].quarantine && a.has_tag(QUARANTINE_TAG)));
    }

    #[tokio::test]
    async fn test_second_pass_ignores_routing_addresses() {
        let custody = FakeCustody::new();
        let now = Utc::now();
        custody.add_vault("1", &["ETH"]);
        custody.add_address("1", "ETH", "0xdep", None, Some(now));

        let cutoff = now - Duration::hours(1);
        let first = recent_deposit_addresses(&custody, cutoff).await.unwrap();
        create_routing_addresses(&custody, &first).await.unwrap();

        let second = recent_deposit_addresses(&custody, cutoff).await.unwrap();
        assert_eq!(second, first);
    }
}
