//! TheVoid oracle RPC client
//!
//! Connects to an Ethereum JSON-RPC endpoint and calls the read-only
//! `getDataBefore` view on TheVoid contract.

use alloy::{
    primitives::{Address, FixedBytes, U256},
    providers::{Provider, ProviderBuilder, RootProvider},
    sol,
    transports::{
        RpcError,
        http::{Client, Http},
    },
};
use async_trait::async_trait;
use tracing::{debug, error, info};

use crate::error::OracleError;
use crate::models::report::{QueryId, Report};

// TheVoid contract interface, read side only
sol! {
    #[sol(rpc)]
    interface ITheVoid {
        function getDataBefore(bytes32 _queryId, uint256 _timestamp)
            external
            view
            returns (bool _ifRetrieve, bytes memory _value, uint256 _timestampRetrieved);
    }
}

/// Source of oracle reports.
///
/// Returns the most recent report for `query_id` strictly before
/// `before`. A report with `found == false` means there is none.
#[async_trait]
pub trait OracleSource: Send + Sync {
    async fn query_before(&self, query_id: &QueryId, before: u64) -> Result<Report, OracleError>;
}

pub struct VoidOracleService {
    provider: RootProvider<Http<Client>>,
    contract_address: Address,
    chain_id: u64,
}

impl VoidOracleService {
    /// Create a new service and probe the endpoint once.
    ///
    /// # Errors
    ///
    /// `Config` if the URL does not parse, `Provider` if the endpoint does
    /// not answer `eth_chainId`.
    pub async fn new(rpc_url: &str, contract_address: Address) -> Result<Self, OracleError> {
        let provider = ProviderBuilder::new().on_http(
            rpc_url
                .parse()
                .map_err(|e| OracleError::Config(format!("Invalid RPC URL: {}", e)))?,
        );

        let chain_id = provider.get_chain_id().await.map_err(|e| {
            error!(error = %e, "Failed to connect to RPC endpoint");
            OracleError::Provider(format!("Could not connect to RPC endpoint: {}", e))
        })?;

        info!(
            chain_id = chain_id,
            contract = %contract_address,
            "Connected to oracle RPC endpoint"
        );

        Ok(Self {
            provider,
            contract_address,
            chain_id,
        })
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn contract_address(&self) -> Address {
        self.contract_address
    }
}

#[async_trait]
impl OracleSource for VoidOracleService {
    async fn query_before(&self, query_id: &QueryId, before: u64) -> Result<Report, OracleError> {
        let contract = ITheVoid::new(self.contract_address, &self.provider);

        let result = contract
            .getDataBefore(FixedBytes::from(*query_id.as_bytes()), U256::from(before))
            .call()
            .await
            .map_err(classify_call_error)?;

        let retrieved_at = u64::try_from(result._timestampRetrieved).map_err(|_| {
            OracleError::ContractCall(format!(
                "Retrieved timestamp out of range: {}",
                result._timestampRetrieved
            ))
        })?;

        debug!(
            query_id = %query_id,
            before = before,
            found = result._ifRetrieve,
            retrieved_at = retrieved_at,
            value_len = result._value.len(),
            "getDataBefore returned"
        );

        Ok(Report::new(
            *query_id,
            before,
            result._ifRetrieve,
            result._value.to_vec(),
            retrieved_at,
        ))
    }
}

/// JSON-RPC error responses (reverts) are contract failures; anything else
/// on the transport is a connectivity failure.
fn classify_call_error(err: alloy::contract::Error) -> OracleError {
    match err {
        alloy::contract::Error::TransportError(RpcError::ErrorResp(payload)) => {
            OracleError::ContractCall(format!("getDataBefore reverted: {}", payload))
        }
        alloy::contract::Error::TransportError(e) => {
            OracleError::Provider(format!("getDataBefore transport failure: {}", e))
        }
        other => OracleError::ContractCall(format!("getDataBefore failed: {}", other)),
    }
}
