//! Transaction descriptors submitted for policy evaluation
//!
//! A descriptor is either an already-broadcast transaction (signed, with an
//! on-chain timestamp) or a pre-broadcast draft. Each variant checks its own
//! required fields when constructed and is immutable afterwards.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::error::{EventContext, Error, Result};

use super::quantity::{
    normalize_recovery_id, validate_decimal, validate_hex_data, validate_hex_word, Quantity,
};

/// Which stage of a transaction's life the evaluation covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EvaluationMode {
    /// Signed and sent to the network
    Broadcasted,
    /// Draft checked before signing
    Prebroadcast,
}

impl EvaluationMode {
    /// Event kind tag used on the wire
    pub fn kind(&self) -> &'static str {
        match self {
            EvaluationMode::Broadcasted => "transaction:broadcasted",
            EvaluationMode::Prebroadcast => "transaction:prebroadcast",
        }
    }

    pub fn from_kind(kind: &str) -> Option<Self> {
        match kind {
            "transaction:broadcasted" => Some(EvaluationMode::Broadcasted),
            "transaction:prebroadcast" => Some(EvaluationMode::Prebroadcast),
            _ => None,
        }
    }
}

impl fmt::Display for EvaluationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind())
    }
}

/// Fields shared by both descriptor variants
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxFields {
    /// Network identifier, e.g. "eth"
    pub network: String,
    pub from: String,
    pub to: String,
    pub nonce: u64,
    /// Base-10 amount in the smallest unit
    pub value: String,
    /// Call data, `0x`-prefixed
    pub input: String,
}

impl TxFields {
    fn validate(&self) -> Result<()> {
        require_non_empty("network", &self.network)?;
        require_non_empty("from", &self.from)?;
        require_non_empty("to", &self.to)?;
        validate_decimal("value", &self.value)?;
        validate_hex_data("data", &self.input)?;
        Ok(())
    }
}

fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Validation(format!("{} is required", field)));
    }
    Ok(())
}

/// Fee fields for the transaction's fee model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeeModel {
    Legacy {
        gas_limit: Quantity,
        gas_price: Quantity,
    },
    /// EIP-1559 dynamic fee
    Dynamic {
        gas_limit: Quantity,
        max_fee_per_gas: Quantity,
        max_priority_fee_per_gas: Quantity,
    },
}

impl FeeModel {
    pub fn legacy(gas_limit: impl Into<Quantity>, gas_price: impl Into<Quantity>) -> Self {
        FeeModel::Legacy {
            gas_limit: gas_limit.into(),
            gas_price: gas_price.into(),
        }
    }

    pub fn dynamic(
        gas_limit: impl Into<Quantity>,
        max_fee_per_gas: impl Into<Quantity>,
        max_priority_fee_per_gas: impl Into<Quantity>,
    ) -> Self {
        FeeModel::Dynamic {
            gas_limit: gas_limit.into(),
            max_fee_per_gas: max_fee_per_gas.into(),
            max_priority_fee_per_gas: max_priority_fee_per_gas.into(),
        }
    }

    pub fn gas_limit(&self) -> Quantity {
        match self {
            FeeModel::Legacy { gas_limit, .. } | FeeModel::Dynamic { gas_limit, .. } => *gas_limit,
        }
    }
}

/// ECDSA signature components of a broadcast transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    r: String,
    s: String,
    y_parity_or_v: String,
}

impl Signature {
    /// `v` may be decimal (as explorers report it) or hex; it is stored as hex.
    pub fn new(r: &str, s: &str, y_parity_or_v: &str) -> Result<Self> {
        validate_hex_word("r", r)?;
        validate_hex_word("s", s)?;
        let v = normalize_recovery_id(y_parity_or_v)?;
        Ok(Self {
            r: r.to_string(),
            s: s.to_string(),
            y_parity_or_v: v,
        })
    }

    pub fn r(&self) -> &str {
        &self.r
    }

    pub fn s(&self) -> &str {
        &self.s
    }

    pub fn y_parity_or_v(&self) -> &str {
        &self.y_parity_or_v
    }
}

/// A signed transaction already sent to the network
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastedTx {
    fields: TxFields,
    fee: FeeModel,
    signature: Signature,
    timestamp: DateTime<Utc>,
    hash: Option<String>,
}

impl BroadcastedTx {
    pub fn new(
        fields: TxFields,
        fee: FeeModel,
        signature: Signature,
        timestamp: DateTime<Utc>,
    ) -> Result<Self> {
        fields.validate()?;
        Ok(Self {
            fields,
            fee,
            signature,
            timestamp,
            hash: None,
        })
    }

    /// Attach the transaction hash, used only to label errors and reports
    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = Some(hash.into());
        self
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// A draft transaction checked before signing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrebroadcastTx {
    fields: TxFields,
    fee: FeeModel,
    hash: Option<String>,
}

impl PrebroadcastTx {
    pub fn new(fields: TxFields, fee: FeeModel) -> Result<Self> {
        fields.validate()?;
        Ok(Self {
            fields,
            fee,
            hash: None,
        })
    }

    pub fn with_hash(mut self, hash: impl Into<String>) -> Self {
        self.hash = Some(hash.into());
        self
    }
}

/// Transaction submitted for risk evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionDescriptor {
    Broadcasted(BroadcastedTx),
    Prebroadcast(PrebroadcastTx),
}

impl TransactionDescriptor {
    pub fn mode(&self) -> EvaluationMode {
        match self {
            TransactionDescriptor::Broadcasted(_) => EvaluationMode::Broadcasted,
            TransactionDescriptor::Prebroadcast(_) => EvaluationMode::Prebroadcast,
        }
    }

    pub fn fields(&self) -> &TxFields {
        match self {
            TransactionDescriptor::Broadcasted(tx) => &tx.fields,
            TransactionDescriptor::Prebroadcast(tx) => &tx.fields,
        }
    }

    pub fn fee(&self) -> &FeeModel {
        match self {
            TransactionDescriptor::Broadcasted(tx) => &tx.fee,
            TransactionDescriptor::Prebroadcast(tx) => &tx.fee,
        }
    }

    pub fn tx_hash(&self) -> Option<&str> {
        match self {
            TransactionDescriptor::Broadcasted(tx) => tx.hash.as_deref(),
            TransactionDescriptor::Prebroadcast(tx) => tx.hash.as_deref(),
        }
    }

    pub fn context(&self) -> EventContext {
        EventContext::new(self.mode(), self.tx_hash().map(str::to_string))
    }

    /// Hash if known, otherwise a short from → to label for log lines
    pub fn label(&self) -> String {
        match self.tx_hash() {
            Some(hash) => hash.to_string(),
            None => format!("{} -> {} #{}", self.fields().from, self.fields().to, self.fields().nonce),
        }
    }
}

impl From<BroadcastedTx> for TransactionDescriptor {
    fn from(tx: BroadcastedTx) -> Self {
        TransactionDescriptor::Broadcasted(tx)
    }
}

impl From<PrebroadcastTx> for TransactionDescriptor {
    fn from(tx: PrebroadcastTx) -> Self {
        TransactionDescriptor::Prebroadcast(tx)
    }
}

/// Convert an on-chain unix timestamp (seconds) to UTC
pub fn timestamp_from_unix(seconds: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(seconds, 0)
        .ok_or_else(|| Error::Validation(format!("timestamp out of range: {}", seconds)))
}
