//! Oracle report models
//!
//! A `Report` is the decoded result of one `getDataBefore` call against
//! TheVoid oracle contract.

use alloy::primitives::{U256, utils::format_units};
use alloy::sol_types::SolValue;
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

use crate::error::OracleError;

/// Fixed-point scale of numeric oracle values (18 decimals, like wei to ether)
pub const VALUE_DECIMALS: u8 = 18;

/// 32-byte identifier of an oracle data feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueryId([u8; 32]);

impl QueryId {
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl FromStr for QueryId {
    type Err = OracleError;

    /// Parses 64 hex digits, with or without a `0x` prefix
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let hex_part = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if hex_part.is_empty() {
            return Err(OracleError::Config("Query ID is empty".to_string()));
        }

        let bytes = hex::decode(hex_part)
            .map_err(|e| OracleError::Config(format!("Invalid query ID hex: {}", e)))?;

        let bytes: [u8; 32] = bytes.try_into().map_err(|b: Vec<u8>| {
            OracleError::Config(format!("Query ID must be 32 bytes, got {}", b.len()))
        })?;

        Ok(Self(bytes))
    }
}

impl fmt::Display for QueryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// Result of a single query-before-timestamp call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub query_id: QueryId,
    /// Whether any report exists before `requested_before`
    pub found: bool,
    /// Raw reported payload, empty when not found
    pub value: Vec<u8>,
    /// The report's own timestamp (unix seconds)
    pub retrieved_at: u64,
    /// Timestamp the query was issued with (unix seconds)
    pub requested_before: u64,
    /// Value as an 18-decimal fixed-point number, only for 32-byte values
    pub decoded_numeric: Option<ScaledValue>,
}

impl Report {
    pub fn new(
        query_id: QueryId,
        requested_before: u64,
        found: bool,
        value: Vec<u8>,
        retrieved_at: u64,
    ) -> Self {
        let decoded_numeric = decode_numeric(&value);
        Self {
            query_id,
            found,
            value,
            retrieved_at,
            requested_before,
            decoded_numeric,
        }
    }

    /// Lowercase hex of the payload, without `0x`
    pub fn value_hex(&self) -> String {
        hex::encode(&self.value)
    }

    /// Payload decoded as an ABI `string`, as shouts are encoded
    pub fn decoded_text(&self) -> Option<String> {
        if self.value.is_empty() {
            return None;
        }
        String::abi_decode(&self.value, true).ok()
    }
}

/// A uint256 read as a fixed-point number with `VALUE_DECIMALS` decimals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScaledValue(U256);

impl ScaledValue {
    #[cfg(test)]
    fn raw(&self) -> U256 {
        self.0
    }

    /// The value as a `Decimal`, when it fits
    pub fn to_decimal(&self) -> Option<Decimal> {
        Decimal::from_str(&self.to_string()).ok()
    }
}

impl fmt::Display for ScaledValue {
    /// Exact decimal rendering without trailing zeros, e.g. `1` or `1.5`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let formatted = format_units(self.0, VALUE_DECIMALS).map_err(|_| fmt::Error)?;
        let trimmed = if formatted.contains('.') {
            formatted.trim_end_matches('0').trim_end_matches('.')
        } else {
            formatted.as_str()
        };
        f.write_str(trimmed)
    }
}

/// Interpret a 32-byte value as a big-endian uint256 scaled by 10^-18.
///
/// Returns `None` for any other length.
pub fn decode_numeric(value: &[u8]) -> Option<ScaledValue> {
    if value.len() != 32 {
        return None;
    }
    Some(ScaledValue(U256::from_be_slice(value)))
}
