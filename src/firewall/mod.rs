//! Transaction risk evaluation
//!
//! Builds policy events from transaction descriptors, submits them to the
//! policy-evaluation endpoint, and maps the response to a verdict.
//!
//! ```text
//! TransactionDescriptor → PolicyEvent (JSON) → POST → PolicyResponse → EvaluationVerdict
//! ```

pub mod client;
pub mod descriptor;
pub mod quantity;
pub mod verdict;
pub mod wire;

pub use client::RiskEvaluationClient;
pub use descriptor::{
    timestamp_from_unix, BroadcastedTx, EvaluationMode, FeeModel, PrebroadcastTx, Signature,
    TransactionDescriptor, TxFields,
};
pub use quantity::Quantity;
pub use verdict::{Action, EvaluationVerdict, MISSING_EVENT_ID};
pub use wire::parse_policy_event;
