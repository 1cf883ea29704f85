//! JSON bodies exchanged with the policy-evaluation endpoint
//!
//! Request:
//!
//! ```text
//! { "kind": "transaction:broadcasted", "datetime": "2025-02-20T11:38:19.000Z",
//!   "data": { "network", "from", "to", "nonce", "value", "data" | "input",
//!             "gasLimit", "gasPrice" | "maxFeePerGas" + "maxPriorityFeePerGas",
//!             "r", "s", "yParityOrV" } }
//! ```
//!
//! Broadcasted events carry call data under `data`, drafts under `input`.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

use super::descriptor::{
    BroadcastedTx, EvaluationMode, FeeModel, PrebroadcastTx, Signature, TransactionDescriptor,
    TxFields,
};
use super::quantity::Quantity;
use super::verdict::{Action, EvaluationVerdict};

/// Request body for `POST /policy/event`
#[derive(Debug, Serialize)]
pub struct PolicyEvent<'a> {
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datetime: Option<String>,
    pub data: EventData<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventData<'a> {
    pub network: &'a str,
    pub from: &'a str,
    pub to: &'a str,
    pub nonce: u64,
    pub value: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<&'a str>,
    pub gas_limit: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_fee_per_gas: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_priority_fee_per_gas: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub s: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_parity_or_v: Option<&'a str>,
}

impl<'a> PolicyEvent<'a> {
    pub fn from_descriptor(descriptor: &'a TransactionDescriptor) -> Self {
        let fields = descriptor.fields();
        let mode = descriptor.mode();

        let (gas_price, max_fee_per_gas, max_priority_fee_per_gas) = match descriptor.fee() {
            FeeModel::Legacy { gas_price, .. } => (Some(gas_price.to_hex()), None, None),
            FeeModel::Dynamic {
                max_fee_per_gas,
                max_priority_fee_per_gas,
                ..
            } => (
                None,
                Some(max_fee_per_gas.to_decimal()),
                Some(max_priority_fee_per_gas.to_decimal()),
            ),
        };

        let (datetime, signature) = match descriptor {
            TransactionDescriptor::Broadcasted(tx) => {
                (Some(format_datetime(tx.timestamp())), Some(tx.signature()))
            }
            TransactionDescriptor::Prebroadcast(_) => (None, None),
        };

        let (data, input) = match mode {
            EvaluationMode::Broadcasted => (Some(fields.input.as_str()), None),
            EvaluationMode::Prebroadcast => (None, Some(fields.input.as_str())),
        };

        Self {
            kind: mode.kind(),
            datetime,
            data: EventData {
                network: &fields.network,
                from: &fields.from,
                to: &fields.to,
                nonce: fields.nonce,
                value: &fields.value,
                data,
                input,
                gas_limit: descriptor.fee().gas_limit().to_hex(),
                gas_price,
                max_fee_per_gas,
                max_priority_fee_per_gas,
                r: signature.map(Signature::r),
                s: signature.map(Signature::s),
                y_parity_or_v: signature.map(Signature::y_parity_or_v),
            },
        }
    }
}

/// ISO-8601 UTC with millisecond precision and a `Z` suffix
pub fn format_datetime(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Response body. Both fields are optional on purpose: a missing action maps
/// to `Unknown`, a missing event id to the `N/A` sentinel.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyResponse {
    #[serde(default)]
    pub action_to_take: Option<Value>,
    #[serde(default)]
    pub event_id: Option<Value>,
}

impl PolicyResponse {
    /// Parse a response body, which must be a JSON object
    pub fn from_body(body: &str) -> std::result::Result<Self, String> {
        let value: Value = serde_json::from_str(body)
            .map_err(|e| format!("response is not valid JSON: {}", e))?;
        if !value.is_object() {
            return Err(format!("response is not a JSON object: {}", value));
        }
        serde_json::from_value(value).map_err(|e| format!("unexpected response shape: {}", e))
    }

    pub fn into_verdict(self) -> EvaluationVerdict {
        let action = Action::from_wire(self.action_to_take.as_ref().and_then(Value::as_str));
        if matches!(self.action_to_take, Some(ref v) if !v.is_string() && !v.is_null()) {
            tracing::warn!("actionToTake is not a string: {:?}", self.action_to_take);
        }

        let event_id = match self.event_id {
            None | Some(Value::Null) => None,
            Some(Value::String(id)) => Some(id),
            Some(other) => Some(other.to_string()),
        };

        EvaluationVerdict::new(event_id, action)
    }
}

/// A policy event as written by hand or exported from another pipeline.
///
/// Same shape as the request body, but every field is optional so that a
/// missing field is reported as a validation error naming the field.
#[derive(Debug, Clone, Deserialize)]
pub struct RawPolicyEvent {
    pub kind: String,
    #[serde(default)]
    pub datetime: Option<String>,
    /// Not sent on the wire; labels errors and reports
    #[serde(default)]
    pub hash: Option<String>,
    pub data: RawEventData,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEventData {
    #[serde(default)]
    pub network: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub nonce: Option<u64>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default, alias = "input")]
    pub data: Option<String>,
    #[serde(default)]
    pub gas_limit: Option<String>,
    #[serde(default)]
    pub gas_price: Option<String>,
    #[serde(default)]
    pub max_fee_per_gas: Option<String>,
    #[serde(default)]
    pub max_priority_fee_per_gas: Option<String>,
    #[serde(default)]
    pub r: Option<String>,
    #[serde(default)]
    pub s: Option<String>,
    #[serde(default)]
    pub y_parity_or_v: Option<String>,
}

fn required<'a>(field: &str, value: &'a Option<String>) -> Result<&'a str> {
    value
        .as_deref()
        .ok_or_else(|| Error::Validation(format!("{} is required", field)))
}

impl RawEventData {
    fn fields(&self) -> Result<TxFields> {
        Ok(TxFields {
            network: required("network", &self.network)?.to_string(),
            from: required("from", &self.from)?.to_string(),
            to: required("to", &self.to)?.to_string(),
            nonce: self
                .nonce
                .ok_or_else(|| Error::Validation("nonce is required".to_string()))?,
            value: required("value", &self.value)?.to_string(),
            input: self.data.clone().unwrap_or_else(|| "0x".to_string()),
        })
    }

    fn fee(&self) -> Result<FeeModel> {
        let gas_limit = Quantity::parse(required("gasLimit", &self.gas_limit)?)?;

        if let Some(gas_price) = &self.gas_price {
            return Ok(FeeModel::legacy(gas_limit, Quantity::parse(gas_price)?));
        }

        match (&self.max_fee_per_gas, &self.max_priority_fee_per_gas) {
            (Some(max_fee), Some(priority)) => Ok(FeeModel::dynamic(
                gas_limit,
                Quantity::parse(max_fee)?,
                Quantity::parse(priority)?,
            )),
            _ => Err(Error::Validation(
                "fee fields required: gasPrice, or maxFeePerGas and maxPriorityFeePerGas"
                    .to_string(),
            )),
        }
    }

    fn has_signature(&self) -> bool {
        self.r.is_some() || self.s.is_some() || self.y_parity_or_v.is_some()
    }
}

impl TryFrom<RawPolicyEvent> for TransactionDescriptor {
    type Error = Error;

    fn try_from(raw: RawPolicyEvent) -> Result<Self> {
        let mode = EvaluationMode::from_kind(&raw.kind)
            .ok_or_else(|| Error::Validation(format!("unknown event kind: {:?}", raw.kind)))?;

        let fields = raw.data.fields()?;
        let fee = raw.data.fee()?;

        let descriptor: TransactionDescriptor = match mode {
            EvaluationMode::Broadcasted => {
                let signature = Signature::new(
                    required("r", &raw.data.r)?,
                    required("s", &raw.data.s)?,
                    required("yParityOrV", &raw.data.y_parity_or_v)?,
                )?;
                let datetime = required("datetime", &raw.datetime)?;
                let timestamp = DateTime::parse_from_rfc3339(datetime)
                    .map_err(|e| {
                        Error::Validation(format!("datetime {:?} is not ISO-8601: {}", datetime, e))
                    })?
                    .with_timezone(&Utc);
                let tx = BroadcastedTx::new(fields, fee, signature, timestamp)?;
                match raw.hash {
                    Some(hash) => tx.with_hash(hash).into(),
                    None => tx.into(),
                }
            }
            EvaluationMode::Prebroadcast => {
                if raw.data.has_signature() {
                    return Err(Error::Validation(
                        "prebroadcast events must not carry signature fields".to_string(),
                    ));
                }
                let tx = PrebroadcastTx::new(fields, fee)?;
                match raw.hash {
                    Some(hash) => tx.with_hash(hash).into(),
                    None => tx.into(),
                }
            }
        };

        Ok(descriptor)
    }
}

/// Parse a hand-written policy event into a validated descriptor
pub fn parse_policy_event(json: &str) -> Result<TransactionDescriptor> {
    let raw: RawPolicyEvent = serde_json::from_str(json)
        .map_err(|e| Error::Validation(format!("malformed policy event: {}", e)))?;
    TransactionDescriptor::try_from(raw)
}
