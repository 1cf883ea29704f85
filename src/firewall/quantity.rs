//! Integer quantities and hex-string checks for the policy wire format
//!
//! The policy API wants gas fields as `0x`-prefixed lowercase hex. Callers
//! hand us whatever they got from an explorer or a draft: decimal strings,
//! upper-case hex, or plain integers.

use std::fmt;
use std::str::FromStr;

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{Error, Result};

lazy_static! {
    static ref HEX_DATA: Regex = Regex::new(r"^0[xX][0-9a-fA-F]*$").unwrap();
    static ref HEX_WORD: Regex = Regex::new(r"^0[xX][0-9a-fA-F]+$").unwrap();
    static ref DECIMAL: Regex = Regex::new(r"^[0-9]+$").unwrap();
}

/// Non-negative integer quantity (gas, fees, wei)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Quantity(u128);

impl Quantity {
    /// Parse either a `0x` hex string or a base-10 string
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if let Some(digits) = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        {
            if digits.is_empty() {
                return Err(Error::Validation(format!(
                    "hex quantity has no digits: {:?}",
                    raw
                )));
            }
            return u128::from_str_radix(digits, 16)
                .map(Self)
                .map_err(|e| Error::Validation(format!("invalid hex quantity {:?}: {}", raw, e)));
        }

        if !DECIMAL.is_match(trimmed) {
            return Err(Error::Validation(format!(
                "quantity must be a non-negative integer, got {:?}",
                raw
            )));
        }
        trimmed
            .parse::<u128>()
            .map(Self)
            .map_err(|e| Error::Validation(format!("invalid quantity {:?}: {}", raw, e)))
    }

    /// `0x`-prefixed lowercase hex, no leading zeros (`0x0` for zero)
    pub fn to_hex(self) -> String {
        format!("{:#x}", self.0)
    }

    pub fn to_decimal(self) -> String {
        self.0.to_string()
    }
}

impl From<u64> for Quantity {
    fn from(value: u64) -> Self {
        Self(u128::from(value))
    }
}

impl From<u128> for Quantity {
    fn from(value: u128) -> Self {
        Self(value)
    }
}

impl FromStr for Quantity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Call data: `0x` followed by zero or more hex digits
pub fn validate_hex_data(field: &str, value: &str) -> Result<()> {
    if HEX_DATA.is_match(value) {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "{} must be a 0x-prefixed hex string, got {:?}",
            field, value
        )))
    }
}

/// Signature component: `0x` followed by at least one hex digit
pub fn validate_hex_word(field: &str, value: &str) -> Result<()> {
    if HEX_WORD.is_match(value) {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "{} must be a non-empty 0x-prefixed hex value, got {:?}",
            field, value
        )))
    }
}

/// Base-10 amount in the chain's smallest unit
pub fn validate_decimal(field: &str, value: &str) -> Result<()> {
    if DECIMAL.is_match(value) {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "{} must be a base-10 integer string, got {:?}",
            field, value
        )))
    }
}

/// Re-encode a recovery id (`v` or `yParity`) as hex.
///
/// Explorers report `v` in decimal (`27`, `28`, `37`...); hex input is kept.
pub fn normalize_recovery_id(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.starts_with("0x") || trimmed.starts_with("0X") {
        validate_hex_word("yParityOrV", trimmed)?;
        return Ok(trimmed.to_ascii_lowercase());
    }
    Quantity::parse(trimmed).map(Quantity::to_hex)
}
