//! Core types shared between the pipeline stages

use crate::error::AcquisitionError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;

/// Identifies the account context a report is requested for
///
/// Built once from validated configuration and never modified afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportRequest {
    profile: String,
    region: String,
}

impl ReportRequest {
    /// Create a request for the given profile and region
    pub fn new(profile: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            profile: profile.into(),
            region: region.into(),
        }
    }

    /// Named profile used to load credentials
    pub fn profile(&self) -> &str {
        &self.profile
    }

    /// Region the IAM client is configured for
    pub fn region(&self) -> &str {
        &self.region
    }
}

/// Outcome of a single step against the report service
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReportStatus {
    /// Generation was requested (fresh or already in progress)
    Triggered,
    /// The service has no content yet
    Pending,
    /// The report is available
    Ready(Vec<u8>),
    /// The run ended without a report
    Failed(AcquisitionError),
}

impl ReportStatus {
    /// Whether this status ends the polling loop
    pub fn is_terminal(&self) -> bool {
        matches!(self, ReportStatus::Ready(_) | ReportStatus::Failed(_))
    }
}

/// A report persisted to local disk
#[derive(Clone, Debug, Serialize)]
pub struct ReportArtifact {
    /// Where the report was written
    pub path: PathBuf,
    /// Size of the written file in bytes
    pub bytes: u64,
    /// Lowercase hex SHA-256 of the file content
    pub sha256: Option<String>,
    /// When the file was written
    pub written_at: DateTime<Utc>,
}
