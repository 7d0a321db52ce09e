//! Persisting a downloaded report to disk

use crate::error::WriteError;
use crate::types::ReportArtifact;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Decode `payload` as UTF-8 text and write it verbatim to `path`
///
/// The file is created or truncated. Decoding happens before the file is
/// touched, so a payload that is not valid UTF-8 never produces a file. No
/// partial-write recovery is attempted: after any [`WriteError`] the state of
/// `path` is unspecified and must be treated as "no artifact".
///
/// # Errors
///
/// - [`WriteError::Decode`] when the payload is not valid UTF-8
/// - [`WriteError::EmptyPayload`] when there is nothing to write
/// - [`WriteError::Io`] on permission, disk-full or missing-directory failures
///
/// # Examples
///
/// ```no_run
/// use iam_credential_report::writer::persist;
/// use std::path::Path;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let artifact = persist(b"user,arn\n", Path::new("credentialsReport.csv")).await?;
/// assert_eq!(artifact.bytes, 9);
/// # Ok(())
/// # }
/// ```
pub async fn persist(payload: &[u8], path: &Path) -> Result<ReportArtifact, WriteError> {
    let text = std::str::from_utf8(payload)?;
    if text.is_empty() {
        return Err(WriteError::EmptyPayload);
    }

    tracing::info!(path = %path.display(), bytes = text.len(), "writing credential report");

    tokio::fs::write(path, text)
        .await
        .map_err(|source| WriteError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let checksum = format!("{:x}", hasher.finalize());

    Ok(ReportArtifact {
        path: path.to_path_buf(),
        bytes: text.len() as u64,
        sha256: Some(checksum),
        written_at: chrono::Utc::now(),
    })
}
