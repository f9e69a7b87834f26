//! Background execution of analysis requests
//!
//! `submit` records a processing entry, spawns one task per request and
//! returns immediately. The task is the only writer of its entry's outcome.
//! Every failure of the run, panics included, is caught at the task boundary
//! and stored as the request's error text.

use crate::clock::{Clock, SystemClock};
use crate::config::ServerConfig;
use crate::store::{BoundedStore, Outcome, RequestEntry, StoreError};
use agent_analyst::AnalysisRunner;
use agent_workflow::{CancellationHandle, CancellationSignal};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, Notify};
use tracing::{Instrument, error, info, info_span, warn};
use uuid::Uuid;

/// Prefix of every stored failure message
pub const RUN_ERROR_PREFIX: &str = "An error occurred during the agent run";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrackerError {
    #[error("Missing required fields: symbol and company_name")]
    MissingFields,

    #[error("Request ID not found")]
    NotFound,

    #[error("Request {0} has already finished")]
    AlreadyFinished(String),

    #[error("Too many analyses in progress; try again later")]
    AtCapacity,

    #[error("{0}")]
    Internal(String),
}

impl From<StoreError> for TrackerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::AtCapacity(_) => TrackerError::AtCapacity,
            StoreError::NotFound(_) => TrackerError::NotFound,
            StoreError::AlreadyFinished(id) => TrackerError::AlreadyFinished(id),
            StoreError::DuplicateId(_) => TrackerError::Internal(err.to_string()),
        }
    }
}

/// Tracks analysis requests and runs them off the request path
pub struct RequestTracker {
    shared: Arc<Shared>,
}

/// State shared with the per-request tasks
struct Shared {
    store: BoundedStore,
    runner: Arc<dyn AnalysisRunner>,
    deadline: Option<Duration>,
    in_flight: Mutex<HashMap<String, CancellationHandle>>,
    idle: Notify,
}

impl RequestTracker {
    pub fn new(
        runner: Arc<dyn AnalysisRunner>,
        store: BoundedStore,
        deadline: Option<Duration>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                store,
                runner,
                deadline,
                in_flight: Mutex::new(HashMap::new()),
                idle: Notify::new(),
            }),
        }
    }

    /// Tracker backed by the real clock, sized from `config`
    pub fn from_config(runner: Arc<dyn AnalysisRunner>, config: &ServerConfig) -> Self {
        Self::with_clock(runner, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        runner: Arc<dyn AnalysisRunner>,
        config: &ServerConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let store = BoundedStore::new(config.capacity, config.result_ttl, clock);
        Self::new(runner, store, config.request_deadline)
    }

    /// Start an analysis and return its processing entry
    ///
    /// Blank fields count as missing. The symbol is upper-cased.
    pub async fn submit(&self, symbol: &str, company_name: &str) -> Result<RequestEntry, TrackerError> {
        let symbol = symbol.trim().to_uppercase();
        let company_name = company_name.trim().to_string();
        if symbol.is_empty() || company_name.is_empty() {
            return Err(TrackerError::MissingFields);
        }

        let id = Uuid::new_v4().to_string();
        let entry = RequestEntry::processing(&id, &symbol, &company_name);
        self.shared.store.insert(entry.clone()).await?;

        let handle = CancellationHandle::new();
        let signal = handle.signal();
        self.shared.in_flight.lock().await.insert(id.clone(), handle);

        let span = info_span!("analysis", request_id = %id, %symbol);
        tokio::spawn(
            Arc::clone(&self.shared)
                .run_request(id, symbol, company_name, signal)
                .instrument(span),
        );

        info!(request_id = %entry.id, symbol = %entry.symbol, "Analysis submitted");
        Ok(entry)
    }

    /// Current state of a request
    pub async fn poll(&self, id: &str) -> Result<RequestEntry, TrackerError> {
        self.shared.store.get(id).await.ok_or(TrackerError::NotFound)
    }

    /// Ask a processing request to stop
    ///
    /// The request finishes as `error` once its task notices.
    pub async fn cancel(&self, id: &str) -> Result<RequestEntry, TrackerError> {
        let entry = self.poll(id).await?;
        if entry.status().is_terminal() {
            return Err(TrackerError::AlreadyFinished(entry.id));
        }

        if let Some(handle) = self.shared.in_flight.lock().await.get(id) {
            handle.cancel();
            info!(request_id = %id, "Cancellation requested");
        }
        Ok(entry)
    }

    /// Cancel every request still running; returns how many were signalled
    pub async fn cancel_all(&self) -> usize {
        let in_flight = self.shared.in_flight.lock().await;
        for handle in in_flight.values() {
            handle.cancel();
        }
        in_flight.len()
    }

    /// Wait until no request is running, up to `timeout`
    ///
    /// Returns `false` if requests were still running when time ran out.
    pub async fn wait_idle(&self, timeout: Duration) -> bool {
        let wait = async {
            loop {
                let notified = self.shared.idle.notified();
                if self.shared.in_flight.lock().await.is_empty() {
                    return;
                }
                notified.await;
            }
        };
        tokio::time::timeout(timeout, wait).await.is_ok()
    }

    /// Number of requests still running
    pub async fn in_flight(&self) -> usize {
        self.shared.in_flight.lock().await.len()
    }

    pub fn store(&self) -> &BoundedStore {
        &self.shared.store
    }
}

impl Shared {
    async fn run_request(
        self: Arc<Self>,
        id: String,
        symbol: String,
        company_name: String,
        signal: CancellationSignal,
    ) {
        // A nested task turns a panic inside the run into a JoinError
        let runner = Arc::clone(&self.runner);
        let deadline = self.deadline;
        let run = tokio::spawn(async move {
            let analysis = runner.run(&company_name, &symbol, signal);
            match deadline {
                Some(limit) => tokio::time::timeout(limit, analysis)
                    .await
                    .unwrap_or(Err(agent_core::Error::DeadlineExceeded(limit))),
                None => analysis.await,
            }
        });

        let outcome = match run.await {
            Ok(Ok(report)) => {
                info!(recommendation = %report.investment_recommendation, "Analysis completed");
                Outcome::Completed(Box::new(report))
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Analysis failed");
                Outcome::Failed(format!("{RUN_ERROR_PREFIX}: {e}"))
            }
            Err(join_error) => {
                error!(error = %join_error, "Analysis task aborted");
                Outcome::Failed(format!("{RUN_ERROR_PREFIX}: {join_error}"))
            }
        };

        if let Err(e) = self.store.finish(&id, outcome).await {
            warn!(error = %e, "Could not record analysis outcome");
        }

        let mut in_flight = self.in_flight.lock().await;
        in_flight.remove(&id);
        if in_flight.is_empty() {
            self.idle.notify_waiters();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::store::RequestStatus;
    use agent_analyst::InvestmentReport;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Waits for cancellation or a release, then returns the scripted result
    struct ScriptedRunner {
        release: Arc<Notify>,
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl AnalysisRunner for ScriptedRunner {
        async fn run(
            &self,
            company_name: &str,
            symbol: &str,
            mut cancel: CancellationSignal,
        ) -> agent_core::Result<InvestmentReport> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::select! {
                () = cancel.cancelled() => return Err(agent_core::Error::Cancelled),
                () = self.release.notified() => {}
            }
            if self.fail {
                return Err(agent_core::Error::in_stage(
                    "qual_analyst",
                    agent_core::Error::ProcessingFailed("model unavailable".into()),
                ));
            }
            Ok(report(company_name, symbol))
        }
    }

    fn report(company_name: &str, symbol: &str) -> InvestmentReport {
        serde_json::from_value(serde_json::json!({
            "company_name": company_name,
            "stock_symbol": symbol,
            "executive_summary": "Solid",
            "quantitative_summary": "Up",
            "qualitative_summary": "Upbeat",
            "investment_recommendation": "Hold",
            "recommendation_rationale": "Balanced",
            "risk_assessment": "Moderate",
            "confidence_level": 55.0,
            "report_date": "2026-10-18",
            "analysis_period": "Trailing 12 months"
        }))
        .unwrap()
    }

    fn tracker(fail: bool, config: &ServerConfig) -> (RequestTracker, Arc<ScriptedRunner>) {
        let runner = Arc::new(ScriptedRunner {
            release: Arc::new(Notify::new()),
            calls: AtomicUsize::new(0),
            fail,
        });
        let tracker = RequestTracker::with_clock(runner.clone(), config, Arc::new(ManualClock::new()));
        (tracker, runner)
    }

    async fn wait_finished(tracker: &RequestTracker, id: &str) -> RequestEntry {
        assert!(tracker.wait_idle(Duration::from_secs(5)).await);
        tracker.poll(id).await.unwrap()
    }

    #[tokio::test]
    async fn test_submit_then_complete() {
        let (tracker, runner) = tracker(false, &ServerConfig::default());
        let entry = tracker.submit(" acme ", "Acme Corp").await.unwrap();
        assert_eq!(entry.symbol, "ACME");
        assert_eq!(entry.status(), RequestStatus::Processing);
        assert_eq!(tracker.poll(&entry.id).await.unwrap().status(), RequestStatus::Processing);

        runner.release.notify_one();
        let finished = wait_finished(&tracker, &entry.id).await;
        match finished.outcome {
            Some(Outcome::Completed(report)) => assert_eq!(report.stock_symbol, "ACME"),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(runner.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_is_recorded_with_prefix() {
        let (tracker, runner) = tracker(true, &ServerConfig::default());
        let entry = tracker.submit("ACME", "Acme Corp").await.unwrap();

        runner.release.notify_one();
        let finished = wait_finished(&tracker, &entry.id).await;
        assert_eq!(finished.status(), RequestStatus::Error);
        let Some(Outcome::Failed(message)) = finished.outcome else {
            panic!("expected failure");
        };
        assert!(message.starts_with("An error occurred during the agent run: "));
        assert!(message.contains("qual_analyst"));
    }

    #[tokio::test]
    async fn test_missing_fields_start_nothing() {
        let (tracker, runner) = tracker(false, &ServerConfig::default());
        assert_eq!(tracker.submit("ACME", "  ").await.unwrap_err(), TrackerError::MissingFields);
        assert_eq!(tracker.submit("", "Acme Corp").await.unwrap_err(), TrackerError::MissingFields);

        assert!(tracker.store().is_empty().await);
        assert_eq!(tracker.in_flight().await, 0);
        assert_eq!(runner.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_ids_are_unique() {
        let (tracker, _runner) = tracker(false, &ServerConfig::default());
        let first = tracker.submit("ACME", "Acme Corp").await.unwrap();
        let second = tracker.submit("ACME", "Acme Corp").await.unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(tracker.store().len().await, 2);
        tracker.cancel_all().await;
    }

    #[tokio::test]
    async fn test_unknown_id() {
        let (tracker, _runner) = tracker(false, &ServerConfig::default());
        assert_eq!(tracker.poll("nope").await.unwrap_err(), TrackerError::NotFound);
        assert_eq!(tracker.cancel("nope").await.unwrap_err(), TrackerError::NotFound);
    }

    #[tokio::test]
    async fn test_cancel_in_flight() {
        let (tracker, _runner) = tracker(false, &ServerConfig::default());
        let entry = tracker.submit("ACME", "Acme Corp").await.unwrap();

        let cancelled = tracker.cancel(&entry.id).await.unwrap();
        assert_eq!(cancelled.status(), RequestStatus::Processing);

        let finished = wait_finished(&tracker, &entry.id).await;
        let Some(Outcome::Failed(message)) = finished.outcome else {
            panic!("expected failure");
        };
        assert!(message.ends_with("Run cancelled"));

        let err = tracker.cancel(&entry.id).await.unwrap_err();
        assert_eq!(err, TrackerError::AlreadyFinished(entry.id));
    }

    #[tokio::test]
    async fn test_deadline_ends_run() {
        let config = ServerConfig {
            request_deadline: Some(Duration::from_millis(20)),
            ..ServerConfig::default()
        };
        let (tracker, _runner) = tracker(false, &config);
        let entry = tracker.submit("ACME", "Acme Corp").await.unwrap();

        let finished = wait_finished(&tracker, &entry.id).await;
        let Some(Outcome::Failed(message)) = finished.outcome else {
            panic!("expected failure");
        };
        assert!(message.contains("deadline"));
    }

    #[tokio::test]
    async fn test_capacity_backpressure() {
        let config = ServerConfig {
            capacity: 1,
            ..ServerConfig::default()
        };
        let (tracker, _runner) = tracker(false, &config);
        tracker.submit("ACME", "Acme Corp").await.unwrap();

        let err = tracker.submit("INIT", "Initech").await.unwrap_err();
        assert_eq!(err, TrackerError::AtCapacity);
        assert_eq!(tracker.cancel_all().await, 1);
    }

    struct PanicRunner;

    #[async_trait]
    impl AnalysisRunner for PanicRunner {
        async fn run(
            &self,
            _company_name: &str,
            _symbol: &str,
            _cancel: CancellationSignal,
        ) -> agent_core::Result<InvestmentReport> {
            panic!("stage blew up");
        }
    }

    #[tokio::test]
    async fn test_panicking_run_is_recorded_as_error() {
        let tracker = RequestTracker::with_clock(
            Arc::new(PanicRunner),
            &ServerConfig::default(),
            Arc::new(ManualClock::new()),
        );
        let entry = tracker.submit("ACME", "Acme Corp").await.unwrap();

        let finished = wait_finished(&tracker, &entry.id).await;
        assert_eq!(finished.status(), RequestStatus::Error);
        let Some(Outcome::Failed(message)) = finished.outcome else {
            panic!("expected failure");
        };
        assert!(message.starts_with(RUN_ERROR_PREFIX));
        assert!(message.contains("panicked"));
        assert_eq!(tracker.in_flight().await, 0);
    }
}
