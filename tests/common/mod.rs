use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use void_oracle::{OracleError, OracleSource, QueryId, Report};

pub const QUERY_HEX: &str = "0x744fe0d0f4e1d68948bbc1b5a818a89684134653f357e2098a9e3db868a2cf89";

pub fn query_id() -> QueryId {
    QUERY_HEX.parse().expect("valid query id")
}

/// 32-byte big-endian encoding of `v`
pub fn uint256(v: u128) -> Vec<u8> {
    let mut out = vec![0u8; 16];
    out.extend_from_slice(&v.to_be_bytes());
    out
}

/// Deterministic oracle backed by an in-memory list of (timestamp, value)
pub struct HistoryOracle {
    history: Vec<(u64, Vec<u8>)>,
    calls: Mutex<Vec<u64>>,
}

impl HistoryOracle {
    pub fn new(mut history: Vec<(u64, Vec<u8>)>) -> Self {
        history.sort_by_key(|(ts, _)| *ts);
        Self {
            history,
            calls: Mutex::new(Vec::new()),
        }
    }

    #[allow(dead_code)]
    pub fn calls(&self) -> Vec<u64> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl OracleSource for HistoryOracle {
    async fn query_before(&self, query_id: &QueryId, before: u64) -> Result<Report, OracleError> {
        self.calls.lock().unwrap().push(before);

        let latest = self.history.iter().rev().find(|(ts, _)| *ts < before);
        Ok(match latest {
            Some((ts, value)) => Report::new(*query_id, before, true, value.clone(), *ts),
            None => Report::new(*query_id, before, false, Vec::new(), 0),
        })
    }
}

/// Scripted response for one call
#[allow(dead_code)]
pub enum Step {
    Found(u64, Vec<u8>),
    NotFound,
    Fail(OracleError),
    /// Never answers within a test's horizon
    Hang,
}

/// Oracle that replays a fixed script, one step per call
#[allow(dead_code)]
pub struct ScriptedOracle {
    steps: Mutex<VecDeque<Step>>,
    calls: Mutex<Vec<u64>>,
    cancel_after: Option<(usize, CancellationToken)>,
}

#[allow(dead_code)]
impl ScriptedOracle {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            calls: Mutex::new(Vec::new()),
            cancel_after: None,
        }
    }

    /// Cancel `token` once `n` calls have been answered
    pub fn cancel_after(mut self, n: usize, token: CancellationToken) -> Self {
        self.cancel_after = Some((n, token));
        self
    }

    pub fn calls(&self) -> Vec<u64> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl OracleSource for ScriptedOracle {
    async fn query_before(&self, query_id: &QueryId, before: u64) -> Result<Report, OracleError> {
        let call_count = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(before);
            calls.len()
        };

        let step = self.steps.lock().unwrap().pop_front().unwrap_or(Step::NotFound);

        if let Some((n, token)) = &self.cancel_after {
            if call_count >= *n {
                token.cancel();
            }
        }

        match step {
            Step::Found(ts, value) => Ok(Report::new(*query_id, before, true, value, ts)),
            Step::NotFound => Ok(Report::new(*query_id, before, false, Vec::new(), 0)),
            Step::Fail(e) => Err(e),
            Step::Hang => {
                tokio::time::sleep(Duration::from_secs(86_400)).await;
                Ok(Report::new(*query_id, before, false, Vec::new(), 0))
            }
        }
    }
}
