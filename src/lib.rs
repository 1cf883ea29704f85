//! Transaction risk monitoring library
//!
//! Submits transaction descriptors to a policy endpoint for a risk verdict,
//! scans addresses for recent inbound transactions, and routes funds between
//! tagged custody addresses.

pub mod cli;
pub mod config;
pub mod custody;
pub mod error;
pub mod explorer;
pub mod firewall;
pub mod monitor;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
