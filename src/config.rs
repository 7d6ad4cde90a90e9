//! Environment-driven configuration
//!
//! Values are read from the process environment; `main` loads a `.env`
//! file through dotenvy first, so either source works.

use alloy::primitives::Address;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::OracleError;
use crate::models::report::QueryId;
use crate::services::report_collector::CollectPolicy;

/// Environment variable for the Sepolia RPC URL
pub const ENV_RPC_URL: &str = "SEPOLIA_RPC_URL";

/// Environment variable for the 32-byte query identifier (hex)
pub const ENV_QUERY_ID: &str = "QUERY_ID";

/// Environment variable for TheVoid contract address
pub const ENV_CONTRACT_ADDR: &str = "THE_VOID_CONTRACT_ADDR";

/// Environment variable for the delay between oracle calls
pub const ENV_THROTTLE_MS: &str = "ORACLE_THROTTLE_MS";

/// Environment variable bounding how many reports one run may collect
pub const ENV_MAX_REPORTS: &str = "ORACLE_MAX_REPORTS";

/// TheVoidUnsafe deployment on Sepolia
pub const DEFAULT_CONTRACT_ADDR: &str = "0xCF6b75b6f2784BFBE2282010C638d0E9197cAbd7";

/// Default delay between oracle calls in milliseconds
pub const DEFAULT_THROTTLE_MS: u64 = 100;

#[derive(Debug, Clone)]
pub struct OracleConfig {
    pub rpc_url: String,
    pub query_id: QueryId,
    pub contract_address: Address,
    pub throttle: Duration,
    /// `None` means collect until the oracle runs out of reports
    pub max_reports: Option<usize>,
}

impl OracleConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self, OracleError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, OracleError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let rpc_url = non_empty(ENV_RPC_URL).ok_or_else(|| {
            OracleError::Config(format!(
                "{} not found in environment variables or .env file",
                ENV_RPC_URL
            ))
        })?;

        let query_id_raw = non_empty(ENV_QUERY_ID).ok_or_else(|| {
            OracleError::Config(format!(
                "{} not found in environment variables or .env file",
                ENV_QUERY_ID
            ))
        })?;
        let query_id = QueryId::from_str(&query_id_raw)?;

        let contract_raw =
            non_empty(ENV_CONTRACT_ADDR).unwrap_or_else(|| DEFAULT_CONTRACT_ADDR.to_string());
        let contract_address = Address::from_str(contract_raw.trim()).map_err(|e| {
            OracleError::Config(format!("Invalid {}: {}", ENV_CONTRACT_ADDR, e))
        })?;

        let throttle_ms = match non_empty(ENV_THROTTLE_MS) {
            Some(raw) => raw.trim().parse::<u64>().map_err(|e| {
                OracleError::Config(format!("Invalid {} '{}': {}", ENV_THROTTLE_MS, raw, e))
            })?,
            None => DEFAULT_THROTTLE_MS,
        };

        let max_reports = match non_empty(ENV_MAX_REPORTS) {
            Some(raw) => Some(raw.trim().parse::<usize>().map_err(|e| {
                OracleError::Config(format!("Invalid {} '{}': {}", ENV_MAX_REPORTS, raw, e))
            })?),
            None => None,
        };

        Ok(Self {
            rpc_url: rpc_url.trim().to_string(),
            query_id,
            contract_address,
            throttle: Duration::from_millis(throttle_ms),
            max_reports,
        })
    }

    pub fn collect_policy(&self) -> CollectPolicy {
        CollectPolicy {
            throttle: self.throttle,
            max_reports: self.max_reports,
        }
    }
}
