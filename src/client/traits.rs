//! Trait for the remote credential report service

use crate::error::ReportError;
use crate::types::{ReportRequest, ReportStatus};
use async_trait::async_trait;

/// Trait for the two remote report operations
///
/// Implementations own an authenticated session and nothing else; neither
/// operation mutates local state.
#[async_trait]
pub trait ReportClient: Send + Sync {
    /// Ask the service to start generating a report
    ///
    /// A report that is already being generated is not an error; callers see
    /// the same `Ok(())` whether generation was started or joined.
    ///
    /// # Errors
    ///
    /// Returns a [`ReportError`] when the call is rejected or cannot be made.
    async fn trigger_generation(&self, request: &ReportRequest) -> Result<(), ReportError>;

    /// Check once whether the report is available
    ///
    /// Returns [`ReportStatus::Pending`] while the service has no content and
    /// [`ReportStatus::Ready`] with the raw payload once it has.
    ///
    /// # Errors
    ///
    /// Returns a [`ReportError`] for authentication, network or response
    /// failures.
    async fn fetch_once(&self) -> Result<ReportStatus, ReportError>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
