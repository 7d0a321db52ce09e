//! Spawning the viewer process

use super::resolver::{ViewerPlan, verify_available};
use crate::error::LaunchError;
use crate::types::ReportArtifact;
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;

/// Opens a persisted report in a viewer
#[async_trait]
pub trait ViewerLauncher: Send + Sync {
    /// Open `artifact` with the viewer described by `plan`
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Prerequisite`] when the viewer is not installed
    /// (nothing is spawned) and [`crate::Error::Launch`] when process creation
    /// fails.
    async fn launch(&self, plan: &ViewerPlan, artifact: &ReportArtifact) -> crate::Result<()>;
}

/// Launches the viewer as a detached child process
///
/// The child's stdio is discarded and its exit is never awaited.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessLauncher;

#[async_trait]
impl ViewerLauncher for ProcessLauncher {
    async fn launch(&self, plan: &ViewerPlan, artifact: &ReportArtifact) -> crate::Result<()> {
        verify_available(plan)?;

        let invocation = plan.invocation(&artifact.path);
        let child = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| LaunchError::Spawn {
                program: invocation.program.clone(),
                source,
            })?;

        tracing::info!(
            viewer = plan.executable,
            pid = ?child.id(),
            path = %artifact.path.display(),
            "opened credential report"
        );
        Ok(())
    }
}
