//! Shared test doubles for the unit tests.
//!
//! `tests/common/fixtures.rs` carries the same doubles for the integration
//! tests; keep the two APIs in step.

use crate::acquisition::Sleeper;
use crate::client::ReportClient;
use crate::error::ReportError;
use crate::types::{ReportRequest, ReportStatus};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Report client that replays a fixed script of fetch results.
///
/// Once the script is exhausted every fetch returns `Pending`.
pub(crate) struct ScriptedClient {
    fetches: Mutex<VecDeque<Result<ReportStatus, ReportError>>>,
    trigger_error: Option<ReportError>,
    cancel_on_fetch: Option<CancellationToken>,
    requests: Mutex<Vec<ReportRequest>>,
    fetch_calls: AtomicU32,
}

impl ScriptedClient {
    pub(crate) fn new(fetches: Vec<Result<ReportStatus, ReportError>>) -> Self {
        Self {
            fetches: Mutex::new(fetches.into()),
            trigger_error: None,
            cancel_on_fetch: None,
            requests: Mutex::new(Vec::new()),
            fetch_calls: AtomicU32::new(0),
        }
    }

    pub(crate) fn always_pending() -> Self {
        Self::new(Vec::new())
    }

    pub(crate) fn failing_trigger(mut self, err: ReportError) -> Self {
        self.trigger_error = Some(err);
        self
    }

    /// Cancel `token` inside the next fetch and never answer it
    pub(crate) fn cancelling_during_fetch(mut self, token: CancellationToken) -> Self {
        self.cancel_on_fetch = Some(token);
        self
    }

    pub(crate) fn triggered_requests(&self) -> Vec<ReportRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn trigger_calls(&self) -> u32 {
        self.requests.lock().unwrap().len() as u32
    }

    pub(crate) fn fetch_calls(&self) -> u32 {
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

/// Sleeper that records requested waits and returns immediately.
#[derive(Default)]
pub(crate) struct RecordingSleeper {
    waits: Mutex<Vec<Duration>>,
    cancel_after: Option<(usize, CancellationToken)>,
}

impl RecordingSleeper {
    /// Cancel `token` during the `count`-th wait.
    pub(crate) fn cancelling_after(count: usize, token: CancellationToken) -> Self {
        Self {
            waits: Mutex::new(Vec::new()),
            cancel_after: Some((count, token)),
        }
    }

    pub(crate) fn waits(&self) -> Vec<Duration> {
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
