//! Backward report collection
//!
//! Walks an oracle's report history from a starting timestamp toward the
//! past: each call asks for the latest report strictly before the cursor,
//! and the next cursor is that report's timestamp minus one second.
//! Collection ends when the oracle reports no earlier data, a call fails,
//! the caller cancels, or the optional report limit is reached.

use chrono::Utc;
use futures_util::stream::{self, Stream};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::DEFAULT_THROTTLE_MS;
use crate::models::report::{QueryId, Report};
use crate::services::void_oracle::OracleSource;

/// Pacing and bounds for one collection run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectPolicy {
    /// Pause between consecutive oracle calls
    pub throttle: Duration,
    /// Stop after this many reports; `None` relies on the oracle running dry
    pub max_reports: Option<usize>,
}

impl Default for CollectPolicy {
    fn default() -> Self {
        Self {
            throttle: Duration::from_millis(DEFAULT_THROTTLE_MS),
            max_reports: None,
        }
    }
}

/// Why a collection run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The oracle has no report before the cursor
    Exhausted,
    /// Cancelled by the caller (e.g. Ctrl+C)
    Cancelled,
    /// `max_reports` reached
    LimitReached,
    /// An oracle call failed
    QueryFailed,
    /// The oracle returned a report not strictly before the cursor
    CursorStalled,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            StopReason::Exhausted => "exhausted",
            StopReason::Cancelled => "cancelled",
            StopReason::LimitReached => "limit_reached",
            StopReason::QueryFailed => "query_failed",
            StopReason::CursorStalled => "cursor_stalled",
        }
    }
}

/// Reports gathered by one run, newest first
#[derive(Debug, Clone)]
pub struct Collection {
    pub reports: Vec<Report>,
    pub stop: StopReason,
}

/// Lazily pages through reports, one oracle call per `next_report`
pub struct ReportPager<'a, S: ?Sized> {
    source: &'a S,
    query_id: QueryId,
    cursor: u64,
    policy: CollectPolicy,
    cancel: CancellationToken,
    yielded: usize,
    calls: usize,
    stop: Option<StopReason>,
}

impl<'a, S: OracleSource + ?Sized> ReportPager<'a, S> {
    pub fn new(
        source: &'a S,
        query_id: QueryId,
        start: u64,
        policy: CollectPolicy,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            source,
            query_id,
            cursor: start,
            policy,
            cancel,
            yielded: 0,
            calls: 0,
            stop: None,
        }
    }

    /// Timestamp the next call will query before
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Set once the pager has finished
    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop
    }

    /// Fetch the next report, or `None` once collection has ended
    pub async fn next_report(&mut self) -> Option<Report> {
        if self.stop.is_some() {
            return None;
        }

        if let Some(max) = self.policy.max_reports {
            if self.yielded >= max {
                warn!(max_reports = max, "Report limit reached, stopping collection");
                return self.finish(StopReason::LimitReached);
            }
        }

        let cancel = self.cancel.clone();
        if cancel.is_cancelled() {
            return self.finish(StopReason::Cancelled);
        }

        if self.calls > 0 && !self.policy.throttle.is_zero() {
            tokio::select! {
                _ = cancel.cancelled() => return self.finish(StopReason::Cancelled),
                _ = tokio::time::sleep(self.policy.throttle) => {}
            }
        }

        self.calls += 1;
        let source = self.source;
        let query_id = self.query_id;
        let cursor = self.cursor;

        let result = tokio::select! {
            _ = cancel.cancelled() => return self.finish(StopReason::Cancelled),
            result = source.query_before(&query_id, cursor) => result,
        };

        let report = match result {
            Ok(report) => report,
            Err(e) => {
                error!(cursor = cursor, error = %e, "Oracle query failed, stopping collection");
                return self.finish(StopReason::QueryFailed);
            }
        };

        if !report.found {
            info!(cursor = cursor, "No more data found");
            return self.finish(StopReason::Exhausted);
        }

        if report.retrieved_at >= cursor {
            warn!(
                cursor = cursor,
                retrieved_at = report.retrieved_at,
                "Oracle returned a report that is not before the cursor, stopping collection"
            );
            return self.finish(StopReason::CursorStalled);
        }

        self.yielded += 1;
        info!(
            n = self.yielded,
            retrieved_at = report.retrieved_at,
            value = ?report.decoded_numeric.map(|v| v.to_string()),
            "Found report"
        );

        match report.retrieved_at.checked_sub(1) {
            Some(next) => self.cursor = next,
            None => {
                debug!("Reached timestamp zero, nothing earlier can exist");
                self.stop = Some(StopReason::Exhausted);
            }
        }

        Some(report)
    }

    /// Turn the pager into a stream of reports
    pub fn into_stream(self) -> impl Stream<Item = Report> + 'a {
        stream::unfold(self, |mut pager| async move {
            let report = pager.next_report().await?;
            Some((report, pager))
        })
    }

    fn finish(&mut self, reason: StopReason) -> Option<Report> {
        self.stop = Some(reason);
        None
    }
}

/// Drives a pager to completion against one oracle source
pub struct ReportCollector<S> {
    source: S,
    policy: CollectPolicy,
}

impl<S: OracleSource> ReportCollector<S> {
    pub fn new(source: S, policy: CollectPolicy) -> Self {
        Self { source, policy }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn policy(&self) -> CollectPolicy {
        self.policy
    }

    /// Pager over `query_id` starting at `start`
    pub fn pager(
        &self,
        query_id: QueryId,
        start: u64,
        cancel: CancellationToken,
    ) -> ReportPager<'_, S> {
        ReportPager::new(&self.source, query_id, start, self.policy, cancel)
    }

    /// Collect every report before `start` (default: now), newest first.
    ///
    /// Cancellation and query failures end the run early; the reports
    /// gathered up to that point are returned either way.
    pub async fn collect(
        &self,
        query_id: QueryId,
        start: Option<u64>,
        cancel: CancellationToken,
    ) -> Collection {
        let start = start.unwrap_or_else(now_unix);
        info!(query_id = %query_id, start = start, "Starting collection");

        let mut pager = self.pager(query_id, start, cancel);
        let mut reports = Vec::new();
        while let Some(report) = pager.next_report().await {
            reports.push(report);
        }

        let stop = pager.stop_reason().unwrap_or(StopReason::Exhausted);
        match stop {
            StopReason::Cancelled => info!(count = reports.len(), "Stopped by user"),
            _ => info!(count = reports.len(), stop = stop.as_str(), "Collection finished"),
        }

        Collection { reports, stop }
    }
}

fn now_unix() -> u64 {
    u64::try_from(Utc::now().timestamp()).unwrap_or_default()
}
