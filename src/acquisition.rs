//! Report acquisition state machine
//!
//! Drives one report request through
//! `Start -> Triggering -> Polling -> {Ready, Failed}`:
//!
//! - the trigger is sent exactly once; if it fails no fetch is attempted
//! - every `Pending` poll is followed by the same fixed wait (no backoff, no jitter)
//! - a fetch error ends the run immediately
//!
//! Polling is unbounded unless [`PollConfig`] sets `max_attempts` or
//! `max_wait`. A [`CancellationToken`] is honoured before every fetch, while a
//! fetch is in flight and during every wait.

use crate::client::ReportClient;
use crate::config::PollConfig;
use crate::error::{AcquisitionError, ReportError};
use crate::types::{ReportRequest, ReportStatus};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Waits between polls
///
/// Injected so tests can observe waits without real time passing.
#[async_trait]
pub trait Sleeper: Send + Sync {
    /// Suspend for `duration`
    async fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] backed by `tokio::time::sleep`
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// States of the acquisition state machine
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AcquisitionState {
    /// Nothing sent yet
    Start,
    /// Generation request in flight
    Triggering,
    /// Waiting for the report to become available
    Polling,
    /// Report content received (terminal)
    Ready,
    /// Run ended without a report (terminal)
    Failed,
}

impl AcquisitionState {
    /// Whether no further transitions are possible
    pub fn is_terminal(self) -> bool {
        matches!(self, AcquisitionState::Ready | AcquisitionState::Failed)
    }
}

/// Terminal `Ready` output of a run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AcquiredReport {
    /// Raw report content exactly as returned by the service
    pub payload: Vec<u8>,
    /// Number of fetch attempts, including the successful one
    pub polls: u32,
    /// Number of fixed-interval waits taken
    pub waits: u32,
    /// Total time spent waiting
    pub waited: Duration,
}

/// One report request driven to a terminal state
///
/// # Examples
///
/// ```no_run
/// use iam_credential_report::acquisition::{Acquisition, TokioSleeper};
/// use iam_credential_report::client::IamReportClient;
/// use iam_credential_report::{PollConfig, ReportRequest};
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let request = ReportRequest::new("default", "us-east-1");
/// let client = Arc::new(IamReportClient::connect(&request).await);
///
/// let report = Acquisition::new(client, Arc::new(TokioSleeper), PollConfig::default(), request)
///     .run()
///     .await?;
/// println!("{} bytes after {} polls", report.payload.len(), report.polls);
/// # Ok(())
/// # }
/// ```
pub struct Acquisition {
    client: Arc<dyn ReportClient>,
    sleeper: Arc<dyn Sleeper>,
    poll: PollConfig,
    request: ReportRequest,
    cancel: CancellationToken,
    state: AcquisitionState,
    polls: u32,
    waits: u32,
    waited: Duration,
}

impl Acquisition {
    /// Create a state machine in the `Start` state
    pub fn new(
        client: Arc<dyn ReportClient>,
        sleeper: Arc<dyn Sleeper>,
        poll: PollConfig,
        request: ReportRequest,
    ) -> Self {
        Self {
            client,
            sleeper,
            poll,
            request,
            cancel: CancellationToken::new(),
            state: AcquisitionState::Start,
            polls: 0,
            waits: 0,
            waited: Duration::ZERO,
        }
    }

    /// Stop polling when `cancel` fires
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Current state
    pub fn state(&self) -> AcquisitionState {
        self.state
    }

    /// Drive the machine until it reaches `Ready` or `Failed`
    ///
    /// # Errors
    ///
    /// Returns the [`AcquisitionError`] describing why the run ended in `Failed`.
    pub async fn run(mut self) -> Result<AcquiredReport, AcquisitionError> {
        tracing::info!(
            client = self.client.name(),
            profile = self.request.profile(),
            region = self.request.region(),
            "acquiring credential report"
        );

        loop {
            let status = match self.state {
                AcquisitionState::Polling => self.poll().await,
                _ => self.trigger().await,
            };

            match status {
                ReportStatus::Triggered | ReportStatus::Pending => {}
                ReportStatus::Ready(payload) => {
                    tracing::info!(
                        bytes = payload.len(),
                        polls = self.polls,
                        waited_secs = self.waited.as_secs(),
                        "credential report ready"
                    );
                    return Ok(AcquiredReport {
                        payload,
                        polls: self.polls,
                        waits: self.waits,
                        waited: self.waited,
                    });
                }
                ReportStatus::Failed(err) => return Err(err),
            }
        }
    }

    async fn trigger(&mut self) -> ReportStatus {
        if self.cancel.is_cancelled() {
            return self.fail(AcquisitionError::Cancelled { polls: self.polls });
        }

        self.transition(AcquisitionState::Triggering);
        match self.client.trigger_generation(&self.request).await {
            Ok(()) => {
                tracing::info!("credential report generation triggered");
                self.transition(AcquisitionState::Polling);
                ReportStatus::Triggered
            }
            Err(err) => self.fail(AcquisitionError::TriggerFailed(err)),
        }
    }

    async fn poll(&mut self) -> ReportStatus {
        if self.cancel.is_cancelled() {
            return self.fail(AcquisitionError::Cancelled { polls: self.polls });
        }

        self.polls += 1;
        let fetched = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            result = self.client.fetch_once() => Some(result),
        };

        match fetched {
            None => self.fail(AcquisitionError::Cancelled { polls: self.polls }),
            Some(Ok(ReportStatus::Ready(payload))) => {
                self.transition(AcquisitionState::Ready);
                ReportStatus::Ready(payload)
            }
            Some(Ok(ReportStatus::Failed(err))) => self.fail(err),
            Some(Ok(ReportStatus::Pending | ReportStatus::Triggered)) => self.wait().await,
            Some(Err(err)) => self.fail(AcquisitionError::FetchFailed(err)),
        }
    }

    async fn wait(&mut self) -> ReportStatus {
        let interval = self.poll.interval;

        let attempts_exhausted = self.poll.max_attempts.is_some_and(|max| self.polls >= max);
        let wait_exhausted = self
            .poll
            .max_wait
            .is_some_and(|max| self.waited + interval > max);
        if attempts_exhausted || wait_exhausted {
            return self.fail(AcquisitionError::TimedOut {
                polls: self.polls,
                waited: self.waited,
            });
        }

        tracing::debug!(
            polls = self.polls,
            interval_secs = interval.as_secs(),
            "credential report not ready yet, waiting"
        );

        let cancelled = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => true,
            _ = self.sleeper.sleep(interval) => false,
        };
        if cancelled {
            return self.fail(AcquisitionError::Cancelled { polls: self.polls });
        }

        self.waits += 1;
        self.waited += interval;
        ReportStatus::Pending
    }

    fn fail(&mut self, err: AcquisitionError) -> ReportStatus {
        // The caller reports the error itself; only record detail here
        match &err {
            AcquisitionError::Cancelled { polls } => {
                tracing::debug!(polls, "credential report acquisition cancelled");
            }
            AcquisitionError::TimedOut { polls, waited } => {
                tracing::debug!(
                    polls,
                    waited_secs = waited.as_secs(),
                    "credential report not ready within the configured bound"
                );
            }
            AcquisitionError::TriggerFailed(source) | AcquisitionError::FetchFailed(source) => {
                tracing::debug!(kind = report_error_kind(source), "acquisition failed");
            }
        }
        self.transition(AcquisitionState::Failed);
        ReportStatus::Failed(err)
    }

    fn transition(&mut self, next: AcquisitionState) {
        tracing::debug!(from = ?self.state, to = ?next, "acquisition state transition");
        self.state = next;
    }
}

fn report_error_kind(err: &ReportError) -> &'static str {
    match err {
        ReportError::Authentication(_) => "authentication",
        ReportError::Network(_) => "network",
        ReportError::MalformedResponse(_) => "malformed_response",
        ReportError::Service(_) => "service",
    }
}
