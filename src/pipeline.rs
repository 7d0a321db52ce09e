//! One complete run: acquire, persist, optionally open

use crate::acquisition::{Acquisition, Sleeper};
use crate::client::ReportClient;
use crate::config::Config;
use crate::error::Result;
use crate::types::ReportArtifact;
use crate::viewer::{HostOs, ViewerLauncher, resolve};
use crate::writer;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Result of a successful run
#[derive(Clone, Debug)]
pub struct PipelineOutcome {
    /// The persisted report
    pub artifact: ReportArtifact,
    /// Number of fetch attempts needed
    pub polls: u32,
    /// Whether a viewer was started
    pub launched: bool,
}

/// Wires the pipeline stages together for one invocation
///
/// Either a full [`ReportArtifact`] is produced (and the viewer launched when
/// requested) or the run fails with the error of the first failing stage.
pub struct ReportPipeline {
    config: Config,
    client: Arc<dyn ReportClient>,
    sleeper: Arc<dyn Sleeper>,
    launcher: Arc<dyn ViewerLauncher>,
    host: HostOs,
    cancel: CancellationToken,
}

impl ReportPipeline {
    /// Create a pipeline for the current host platform
    pub fn new(
        config: Config,
        client: Arc<dyn ReportClient>,
        sleeper: Arc<dyn Sleeper>,
        launcher: Arc<dyn ViewerLauncher>,
    ) -> Self {
        Self {
            config,
            client,
            sleeper,
            launcher,
            host: HostOs::current(),
            cancel: CancellationToken::new(),
        }
    }

    /// Resolve the viewer for `host` instead of the current platform
    pub fn with_host(mut self, host: HostOs) -> Self {
        self.host = host;
        self
    }

    /// Stop polling when `cancel` fires
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Run every stage to completion
    ///
    /// When opening is requested the viewer is resolved before any remote
    /// call, so an unsupported platform fails without contacting the service.
    ///
    /// # Errors
    ///
    /// Returns the first stage error; see [`crate::Error::stage`].
    pub async fn run(&self) -> Result<PipelineOutcome> {
        self.config.validate()?;

        let plan = if self.config.open_after_download {
            Some(resolve(&self.host)?)
        } else {
            None
        };

        let report = Acquisition::new(
            self.client.clone(),
            self.sleeper.clone(),
            self.config.poll.clone(),
            self.config.request(),
        )
        .with_cancellation(self.cancel.clone())
        .run()
        .await?;

        let artifact = writer::persist(&report.payload, &self.config.output_path).await?;

        let launched = match plan {
            Some(plan) => {
                self.launcher.launch(&plan, &artifact).await?;
                true
            }
            None => false,
        };

        Ok(PipelineOutcome {
            artifact,
            polls: report.polls,
            launched,
        })
    }
}
