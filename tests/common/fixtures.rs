//! Scripted report client, recording sleeper and recording launcher
//!
//! The client and sleeper mirror `src/test_helpers.rs`; keep the two APIs in step.

use async_trait::async_trait;
use iam_credential_report::acquisition::Sleeper;
use iam_credential_report::client::ReportClient;
use iam_credential_report::viewer::{ViewerLauncher, ViewerPlan};
use iam_credential_report::{ReportArtifact, ReportError, ReportRequest, ReportStatus};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// CSV payload used by the end-to-end scenario
pub const BOB_REPORT: &str = "user,arn\nbob,arn:aws:iam::1:user/bob\n";

/// Report client replaying a fixed list of fetch results, then `Pending` forever
pub struct ScriptedClient {
    fetches: Mutex<VecDeque<Result<ReportStatus, ReportError>>>,
    trigger_error: Option<ReportError>,
    cancel_on_fetch: Option<CancellationToken>,
    requests: Mutex<Vec<ReportRequest>>,
    fetch_calls: AtomicU32,
}

impl ScriptedClient {
    pub fn new(fetches: Vec<Result<ReportStatus, ReportError>>) -> Self {
        Self {
            fetches: Mutex::new(fetches.into()),
            trigger_error: None,
            cancel_on_fetch: None,
            requests: Mutex::new(Vec::new()),
            fetch_calls: AtomicU32::new(0),
        }
    }

    pub fn always_pending() -> Self {
        Self::new(Vec::new())
    }

    /// Two `Pending` polls followed by the bob report
    pub fn ready_after_two_pending() -> Self {
        Self::new(vec![
            Ok(ReportStatus::Pending),
            Ok(ReportStatus::Pending),
            Ok(ReportStatus::Ready(BOB_REPORT.as_bytes().to_vec())),
        ])
    }

    pub fn failing_trigger(mut self, err: ReportError) -> Self {
        self.trigger_error = Some(err);
        self
    }

    /// Cancel `token` inside the next fetch and never answer it
    pub fn cancelling_during_fetch(mut self, token: CancellationToken) -> Self {
        self.cancel_on_fetch = Some(token);
        self
    }

    pub fn trigger_calls(&self) -> u32 {
        self.requests.lock().unwrap().len() as u32
    }

    pub fn triggered_requests(&self) -> Vec<ReportRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn fetch_calls(&self) -> u32 {
        self.fetch_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReportClient for ScriptedClient {
    async fn trigger_generation(&self, request: &ReportRequest) -> Result<(), ReportError> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.trigger_error {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    async fn fetch_once(&self) -> Result<ReportStatus, ReportError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(token) = &self.cancel_on_fetch {
            token.cancel();
            std::future::pending::<()>().await;
        }
        self.fetches
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(ReportStatus::Pending))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Sleeper that records every requested wait and returns immediately
#[derive(Default)]
pub struct RecordingSleeper {
    waits: Mutex<Vec<Duration>>,
    cancel_after: Option<(usize, CancellationToken)>,
}

impl RecordingSleeper {
    /// Cancel `token` during the `count`-th wait
    pub fn cancelling_after(count: usize, token: CancellationToken) -> Self {
        Self {
            waits: Mutex::new(Vec::new()),
            cancel_after: Some((count, token)),
        }
    }

    pub fn waits(&self) -> Vec<Duration> {
        self.waits.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        let count = {
            let mut waits = self.waits.lock().unwrap();
            waits.push(duration);
            waits.len()
        };

        if let Some((after, token)) = &self.cancel_after {
            if count >= *after {
                token.cancel();
            }
        }
    }
}

/// Launcher that records launches instead of spawning processes
#[derive(Default)]
pub struct RecordingLauncher {
    launches: Mutex<Vec<(String, PathBuf)>>,
}

impl RecordingLauncher {
    /// `(executable, artifact path)` for every launch
    pub fn launches(&self) -> Vec<(String, PathBuf)> {
        self.launches.lock().unwrap().clone()
    }
}

#[async_trait]
impl ViewerLauncher for RecordingLauncher {
    async fn launch(
        &self,
        plan: &ViewerPlan,
        artifact: &ReportArtifact,
    ) -> iam_credential_report::Result<()> {
        self.launches
            .lock()
            .unwrap()
            .push((plan.executable.to_string(), artifact.path.clone()));
        Ok(())
    }
}
