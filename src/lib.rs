//! # iam-credential-report
//!
//! Generate, download and open AWS IAM credential reports.
//!
//! A run asks IAM to generate a credential report, polls at a fixed interval
//! until the report is ready, writes the CSV content to disk and, when asked,
//! opens it in the platform's spreadsheet viewer.
//!
//! ## Quick Start
//!
//! ```no_run
//! use iam_credential_report::acquisition::TokioSleeper;
//! use iam_credential_report::client::IamReportClient;
//! use iam_credential_report::viewer::ProcessLauncher;
//! use iam_credential_report::{Config, ReportPipeline};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config {
//!         region: "eu-west-1".to_string(),
//!         ..Default::default()
//!     };
//!
//!     let client = IamReportClient::connect(&config.request()).await;
//!     let pipeline = ReportPipeline::new(
//!         config,
//!         Arc::new(client),
//!         Arc::new(TokioSleeper),
//!         Arc::new(ProcessLauncher),
//!     );
//!
//!     let outcome = pipeline.run().await?;
//!     println!("wrote {}", outcome.artifact.path.display());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Report acquisition state machine
pub mod acquisition;
/// Remote report service client
pub mod client;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// End-to-end run of all stages
pub mod pipeline;
/// Core types
pub mod types;
/// Viewer resolution and launching
pub mod viewer;
/// Persisting reports to disk
pub mod writer;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
pub(crate) mod test_helpers;

// Re-export commonly used types
pub use config::{Config, PollConfig};
pub use error::{
    AcquisitionError, Error, LaunchError, PrerequisiteError, ReportError, Result, Stage,
    WriteError,
};
pub use pipeline::{PipelineOutcome, ReportPipeline};
pub use types::{ReportArtifact, ReportRequest, ReportStatus};

use tokio_util::sync::CancellationToken;

/// Returns a token that is cancelled when the process receives a termination signal.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// Must be called from within a tokio runtime.
pub fn cancel_on_shutdown_signal() -> CancellationToken {
    cancel_on(wait_for_signal())
}

fn cancel_on<F>(signal: F) -> CancellationToken
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let token = CancellationToken::new();
    let cancel = token.clone();
    tokio::spawn(async move {
        signal.await;
        cancel.cancel();
    });
    token
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Signal registration may fail in restricted environments (containers, tests)
    match (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), Ok(mut sigint)) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            sigint.recv().await;
            tracing::info!("Received SIGINT signal (Ctrl+C)");
        }
        (Ok(mut sigterm), Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            sigterm.recv().await;
            tracing::info!("Received SIGTERM signal");
        }
        (Err(e), Err(_)) => {
            tracing::error!(error = %e, "Could not register any signal handlers, using ctrl_c fallback");
            match tokio::signal::ctrl_c().await {
                Ok(()) => tracing::info!("Received Ctrl+C signal"),
                Err(e) => wait_without_signals(e).await,
            }
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => wait_without_signals(e).await,
    }
}

/// No handler could be installed: never report a signal
async fn wait_without_signals(e: std::io::Error) {
    tracing::error!(error = %e, "Failed to listen for Ctrl+C signal, shutdown signals are ignored");
    std::future::pending::<()>().await;
}
