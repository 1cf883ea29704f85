//! Address monitor
//!
//! Scans an address's recent inbound transactions on the block explorer and
//! submits each one for broadcast-time risk evaluation, one at a time.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::explorer::{ExplorerClient, ExplorerTx};
use crate::firewall::{Action, EvaluationVerdict, RiskEvaluationClient, TransactionDescriptor};

/// Outcome for one scanned transaction
#[derive(Debug)]
pub struct TxOutcome {
    pub hash: String,
    pub result: std::result::Result<EvaluationVerdict, Error>,
}

/// Result of one monitor pass
#[derive(Debug)]
pub struct ScanReport {
    pub address: String,
    pub cutoff: DateTime<Utc>,
    pub outcomes: Vec<TxOutcome>,
}

impl ScanReport {
    pub fn found(&self) -> usize {
        self.outcomes.len()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_err()).count()
    }

    /// Verdict counts keyed by action name
    pub fn action_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for outcome in &self.outcomes {
            if let Ok(verdict) = &outcome.result {
                *counts.entry(verdict.action().as_str()).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Transactions whose verdict needs someone to look at them
    pub fn needs_attention(&self) -> impl Iterator<Item = &TxOutcome> {
        self.outcomes.iter().filter(|o| match &o.result {
            Ok(verdict) => verdict.action() == Action::Deny || verdict.action().requires_follow_up(),
            Err(_) => true,
        })
    }
}

/// Ties the explorer and the policy client together
pub struct AddressMonitor {
    explorer: ExplorerClient,
    firewall: RiskEvaluationClient,
    network: String,
}

impl AddressMonitor {
    pub fn new(explorer: ExplorerClient, firewall: RiskEvaluationClient, network: String) -> Self {
        Self {
            explorer,
            firewall,
            network,
        }
    }

    /// Evaluate every transaction sent to `address` in the last `lookback_hours`.
    ///
    /// A transaction that cannot be converted or evaluated is recorded in the
    /// report and the scan moves on. Explorer failures abort the scan.
    pub async fn scan(&self, address: &str, lookback_hours: u32) -> Result<ScanReport> {
        let cutoff = Utc::now() - Duration::hours(i64::from(lookback_hours));
        info!(
            "Scanning {} for the last {} hours (since {})",
            address, lookback_hours, cutoff
        );

        let transactions = self.explorer.recent_inbound(address, cutoff).await?;
        info!("Found {} transactions to {}", transactions.len(), address);

        let mut outcomes = Vec::with_capacity(transactions.len());
        for tx in &transactions {
            outcomes.push(self.evaluate_one(tx).await);
        }

        Ok(ScanReport {
            address: address.to_string(),
            cutoff,
            outcomes,
        })
    }

    async fn evaluate_one(&self, tx: &ExplorerTx) -> TxOutcome {
        let result = match tx.to_descriptor(&self.network) {
            Ok(descriptor) => self.submit(&descriptor).await,
            Err(e) => Err(e),
        };

        if let Err(e) = &result {
            warn!("Failed to evaluate {}: {}", tx.hash, e);
        }

        TxOutcome {
            hash: tx.hash.clone(),
            result,
        }
    }

    async fn submit(&self, descriptor: &TransactionDescriptor) -> Result<EvaluationVerdict> {
        self.firewall.evaluate(descriptor).await
    }
}
