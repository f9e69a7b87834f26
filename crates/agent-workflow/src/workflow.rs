//! Workflow definition and execution

use crate::cancel::CancellationSignal;
use agent_core::{Context, Error, Result, Stage};
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Timing for one completed stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageRecord {
    /// Stage name
    pub stage: String,
    /// Wall time spent in the stage, in milliseconds
    pub elapsed_ms: u64,
}

/// Result of a completed run
#[derive(Debug, Clone)]
pub struct WorkflowOutput {
    /// Final state after every stage merged its output
    pub state: Context,
    /// One record per stage, in execution order
    pub trace: Vec<StageRecord>,
}

/// A fixed, linear graph of named stages
///
/// Stages run strictly one after another along the declared edges. Each
/// stage sees the state accumulated by its predecessors and returns only
/// the keys it produces; those are merged additively. The first failing
/// stage ends the run.
///
/// # Example
///
/// ```no_run
/// use agent_workflow::{CancellationSignal, Workflow};
/// use std::sync::Arc;
///
/// # async fn example(a: Arc<dyn agent_core::Stage>, b: Arc<dyn agent_core::Stage>) -> agent_core::Result<()> {
/// let workflow = Workflow::builder("analysis")
///     .then(a)
///     .then(b)
///     .build()?;
///
/// let output = workflow
///     .execute(agent_core::Context::new(), CancellationSignal::never())
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct Workflow {
    name: String,
    stages: Vec<Arc<dyn Stage>>,
    edges: Vec<(String, String)>,
    deadline: Option<Duration>,
}

impl std::fmt::Debug for Workflow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workflow")
            .field("name", &self.name)
            .field("stages", &self.stage_names())
            .field("deadline", &self.deadline)
            .finish()
    }
}

impl Workflow {
    /// Start building a workflow
    pub fn builder(name: impl Into<String>) -> WorkflowBuilder {
        WorkflowBuilder::new(name)
    }

    /// The workflow's name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stage names in execution order
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Declared edges as `(from, to)` pairs
    pub fn edges(&self) -> &[(String, String)] {
        &self.edges
    }

    /// Deadline applied to a whole run, if any
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    /// Run every stage against `initial`
    ///
    /// Returns `Error::Cancelled` if `cancel` fires before the run finishes
    /// and `Error::DeadlineExceeded` if the configured deadline elapses.
    /// Any stage error is wrapped in `Error::StageFailed` with the stage name.
    pub async fn execute(
        &self,
        initial: Context,
        cancel: CancellationSignal,
    ) -> Result<WorkflowOutput> {
        tracing::debug!(workflow = %self.name, stages = self.stages.len(), "Starting workflow");

        let result = match self.deadline {
            Some(limit) => tokio::time::timeout(limit, self.run_stages(initial, cancel))
                .await
                .unwrap_or(Err(Error::DeadlineExceeded(limit))),
            None => self.run_stages(initial, cancel).await,
        };

        match &result {
            Ok(output) => {
                tracing::info!(workflow = %self.name, stages = output.trace.len(), "Workflow completed");
            }
            Err(e) => tracing::warn!(workflow = %self.name, error = %e, "Workflow did not complete"),
        }
        result
    }

    async fn run_stages(
        &self,
        initial: Context,
        mut cancel: CancellationSignal,
    ) -> Result<WorkflowOutput> {
        let mut state = initial;
        let mut trace = Vec::with_capacity(self.stages.len());

        for stage in &self.stages {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            let name = stage.name();
            let started = Instant::now();
            tracing::debug!(stage = name, "Running stage");

            let delta = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(Error::Cancelled),
                result = stage.run(&state) => result.map_err(|e| Error::in_stage(name, e))?,
            };
            state
                .merge(delta)
                .map_err(|e| Error::in_stage(name, e))?;

            let elapsed_ms = started.elapsed().as_millis() as u64;
            tracing::info!(stage = name, elapsed_ms, "Stage completed");
            trace.push(StageRecord {
                stage: name.to_string(),
                elapsed_ms,
            });
        }

        Ok(WorkflowOutput { state, trace })
    }
}

/// Builder for creating workflows
pub struct WorkflowBuilder {
    name: String,
    stages: Vec<Arc<dyn Stage>>,
    deadline: Option<Duration>,
}

impl WorkflowBuilder {
    /// Create a new workflow builder
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
            deadline: None,
        }
    }

    /// Append a stage, adding an edge from the previous one
    pub fn then(mut self, stage: Arc<dyn Stage>) -> Self {
        self.stages.push(stage);
        self
    }

    /// Bound the total run time
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Build the workflow
    ///
    /// Fails if no stage was added or two stages share a name.
    pub fn build(self) -> Result<Workflow> {
        if self.stages.is_empty() {
            return Err(Error::InitializationFailed(format!(
                "Workflow '{}' has no stages",
                self.name
            )));
        }

        let mut seen = HashSet::new();
        for stage in &self.stages {
            if !seen.insert(stage.name().to_string()) {
                return Err(Error::InitializationFailed(format!(
                    "Workflow '{}' has duplicate stage '{}'",
                    self.name,
                    stage.name()
                )));
            }
        }

        let edges = self
            .stages
            .windows(2)
            .map(|pair| (pair[0].name().to_string(), pair[1].name().to_string()))
            .collect();

        Ok(Workflow {
            name: self.name,
            stages: self.stages,
            edges,
            deadline: self.deadline,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cancel::CancellationHandle;
    use agent_core::StateKey;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const SEEN: StateKey<Vec<String>> = StateKey::new("seen");

    /// Writes `output_key`, recording which keys it could see
    struct RecordingStage {
        name: String,
        output_key: String,
        delay: Duration,
        fail: bool,
        calls: Arc<AtomicUsize>,
    }

    impl RecordingStage {
        fn new(name: &str, output_key: &str) -> Self {
            Self {
                name: name.to_string(),
                output_key: output_key.to_string(),
                delay: Duration::ZERO,
                fail: false,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn failing(mut self) -> Self {
            self.fail = true;
            self
        }

        fn slow(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    #[async_trait]
    impl Stage for RecordingStage {
        async fn run(&self, state: &Context) -> Result<Context> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail {
                return Err(Error::ProcessingFailed("boom".to_string()));
            }
            let mut delta = Context::new();
            delta.insert(
                self.output_key.clone(),
                serde_json::json!(state.keys()),
            );
            Ok(delta)
        }

        fn name(&self) -> &str {
            &self.name
        }
    }

    #[test]
    fn test_build_rejects_empty() {
        let err = Workflow::builder("empty").build().unwrap_err();
        assert!(matches!(err, Error::InitializationFailed(_)));
    }

    #[test]
    fn test_build_rejects_duplicate_names() {
        let err = Workflow::builder("dup")
            .then(Arc::new(RecordingStage::new("a", "x")))
            .then(Arc::new(RecordingStage::new("a", "y")))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("duplicate stage 'a'"));
    }

    #[test]
    fn test_edges_follow_declaration_order() {
        let workflow = Workflow::builder("chain")
            .then(Arc::new(RecordingStage::new("a", "x")))
            .then(Arc::new(RecordingStage::new("b", "y")))
            .then(Arc::new(RecordingStage::new("c", "z")))
            .build()
            .unwrap();
        assert_eq!(workflow.stage_names(), vec!["a", "b", "c"]);
        assert_eq!(
            workflow.edges(),
            &[
                ("a".to_string(), "b".to_string()),
                ("b".to_string(), "c".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn test_stages_see_upstream_output() {
        let workflow = Workflow::builder("chain")
            .then(Arc::new(RecordingStage::new("first", "seen_by_first")))
            .then(Arc::new(RecordingStage::new("second", "seen")))
            .build()
            .unwrap();

        let mut initial = Context::new();
        initial.insert("input", serde_json::json!("x"));
        let output = workflow
            .execute(initial, CancellationSignal::never())
            .await
            .unwrap();

        let seen = output.state.require(SEEN).unwrap();
        assert_eq!(seen, vec!["input", "seen_by_first"]);
        let stages: Vec<_> = output.trace.iter().map(|r| r.stage.as_str()).collect();
        assert_eq!(stages, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_failure_stops_downstream() {
        let downstream = RecordingStage::new("after", "z");
        let downstream_calls = downstream.calls.clone();

        let workflow = Workflow::builder("chain")
            .then(Arc::new(RecordingStage::new("ok", "x")))
            .then(Arc::new(RecordingStage::new("broken", "y").failing()))
            .then(Arc::new(downstream))
            .build()
            .unwrap();

        let err = workflow
            .execute(Context::new(), CancellationSignal::never())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::StageFailed { ref stage, .. } if stage == "broken"));
        assert!(matches!(err.root_cause(), Error::ProcessingFailed(_)));
        assert_eq!(downstream_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_overwrite_is_rejected() {
        let workflow = Workflow::builder("chain")
            .then(Arc::new(RecordingStage::new("a", "shared")))
            .then(Arc::new(RecordingStage::new("b", "shared")))
            .build()
            .unwrap();

        let err = workflow
            .execute(Context::new(), CancellationSignal::never())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::StageFailed { ref stage, .. } if stage == "b"));
        assert!(matches!(err.root_cause(), Error::StateConflict(k) if k == "shared"));
    }

    #[tokio::test]
    async fn test_cancel_before_start_runs_nothing() {
        let stage = RecordingStage::new("a", "x");
        let calls = stage.calls.clone();
        let workflow = Workflow::builder("chain").then(Arc::new(stage)).build().unwrap();

        let handle = CancellationHandle::new();
        handle.cancel();
        let err = workflow
            .execute(Context::new(), handle.signal())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Cancelled));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cancel_interrupts_running_stage() {
        let downstream = RecordingStage::new("b", "y");
        let downstream_calls = downstream.calls.clone();
        let workflow = Workflow::builder("chain")
            .then(Arc::new(
                RecordingStage::new("a", "x").slow(Duration::from_secs(5)),
            ))
            .then(Arc::new(downstream))
            .build()
            .unwrap();

        let handle = CancellationHandle::new();
        let signal = handle.signal();
        let run = tokio::spawn(async move { workflow.execute(Context::new(), signal).await });

        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.cancel();

        let err = tokio::time::timeout(Duration::from_secs(1), run)
            .await
            .expect("cancelled run should finish promptly")
            .unwrap()
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled));
        assert_eq!(downstream_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_deadline_exceeded() {
        let workflow = Workflow::builder("chain")
            .then(Arc::new(
                RecordingStage::new("a", "x").slow(Duration::from_secs(5)),
            ))
            .with_deadline(Duration::from_millis(30))
            .build()
            .unwrap();

        let err = workflow
            .execute(Context::new(), CancellationSignal::never())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DeadlineExceeded(d) if d == Duration::from_millis(30)));
    }
}
