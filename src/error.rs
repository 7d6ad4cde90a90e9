//! Error types for the oracle collector

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OracleError {
    /// Missing or malformed configuration; raised before any network activity
    #[error("Configuration error: {0}")]
    Config(String),

    /// RPC endpoint unreachable or transport failure
    #[error("Provider error: {0}")]
    Provider(String),

    /// The oracle call itself failed (revert, undecodable return data)
    #[error("Contract call error: {0}")]
    ContractCall(String),

    #[error("Output error: {0}")]
    Output(String),
}
