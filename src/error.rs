//! Error types for iam-credential-report
//!
//! Every failure of the pipeline maps onto exactly one [`Stage`], so the caller
//! can print a single diagnostic naming where the run stopped and why:
//! - [`PrerequisiteError`] - unsupported platform or missing viewer
//! - [`ReportError`] - remote trigger/fetch failures
//! - [`AcquisitionError`] - terminal `Failed` states of the polling state machine
//! - [`WriteError`] - decoding or persisting the report
//! - [`LaunchError`] - spawning the viewer process

use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for iam-credential-report operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for iam-credential-report
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "region")
        key: Option<String>,
    },

    /// A local prerequisite for opening the report is missing
    #[error(transparent)]
    Prerequisite(#[from] PrerequisiteError),

    /// The report could not be acquired from the remote service
    #[error(transparent)]
    Acquisition(#[from] AcquisitionError),

    /// The report could not be written to disk
    #[error("write failed: {0}")]
    Write(#[from] WriteError),

    /// The viewer process could not be started
    #[error("viewer launch failed: {0}")]
    Launch(#[from] LaunchError),
}

impl Error {
    /// The pipeline stage this error belongs to
    pub fn stage(&self) -> Stage {
        match self {
            Error::Config { .. } => Stage::Config,
            Error::Prerequisite(_) => Stage::ViewerLookup,
            Error::Acquisition(AcquisitionError::TriggerFailed(_)) => Stage::Trigger,
            Error::Acquisition(_) => Stage::Fetch,
            Error::Write(_) => Stage::Write,
            Error::Launch(_) => Stage::ViewerLaunch,
        }
    }
}

/// Pipeline stage a failure is attributed to
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Validating configuration
    Config,
    /// Asking the service to generate a report
    Trigger,
    /// Polling for and downloading the report
    Fetch,
    /// Decoding and persisting the report
    Write,
    /// Resolving or locating the viewer
    ViewerLookup,
    /// Spawning the viewer
    ViewerLaunch,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Config => "config",
            Stage::Trigger => "trigger",
            Stage::Fetch => "fetch",
            Stage::Write => "write",
            Stage::ViewerLookup => "viewer lookup",
            Stage::ViewerLaunch => "viewer launch",
        };
        f.write_str(name)
    }
}

/// Missing local prerequisites for viewing a report
#[derive(Debug, Error)]
pub enum PrerequisiteError {
    /// No viewer mapping exists for this operating system
    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),

    /// The viewer for this platform is not installed
    #[error("viewer not found: {executable} is not installed or not on PATH")]
    ViewerNotFound {
        /// Executable or application name that was looked up
        executable: String,
    },
}

/// Failures of a single remote call to the identity service
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ReportError {
    /// Credentials were rejected or lack the required IAM permissions
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The request never reached the service or timed out
    #[error("network error: {0}")]
    Network(String),

    /// The service answered with something that could not be interpreted
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The service reported an error of its own
    #[error("service error: {0}")]
    Service(String),
}

/// Terminal `Failed` states of the acquisition state machine
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum AcquisitionError {
    /// Report generation could not be started; no fetch was attempted
    #[error("trigger failed: {0}")]
    TriggerFailed(#[source] ReportError),

    /// A poll failed with a hard error
    #[error("fetch failed: {0}")]
    FetchFailed(#[source] ReportError),

    /// A configured attempt or wait bound was exceeded
    #[error("fetch failed: report not ready after {polls} polls ({} s waited)", .waited.as_secs())]
    TimedOut {
        /// Number of fetch attempts made
        polls: u32,
        /// Total time spent waiting between polls
        waited: Duration,
    },

    /// Polling was cancelled before the report became ready
    #[error("fetch failed: cancelled after {polls} polls")]
    Cancelled {
        /// Number of fetch attempts made before cancellation
        polls: u32,
    },
}

/// Failures while decoding or persisting the report
#[derive(Debug, Error)]
pub enum WriteError {
    /// The payload is not valid UTF-8 text
    #[error("report content is not valid UTF-8: {0}")]
    Decode(#[from] std::str::Utf8Error),

    /// The payload is empty, so there is nothing to persist
    #[error("report content is empty")]
    EmptyPayload,

    /// The file could not be created or written
    #[error("failed to write {}: {source}", .path.display())]
    Io {
        /// Destination path
        path: PathBuf,
        /// Underlying I/O error (permission denied, disk full, ...)
        #[source]
        source: std::io::Error,
    },
}

/// Failures while starting the viewer process
#[derive(Debug, Error)]
pub enum LaunchError {
    /// Process creation failed
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        /// Program that was executed
        program: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
}
