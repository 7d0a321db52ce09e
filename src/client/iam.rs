//! AWS IAM implementation of [`ReportClient`]

use super::traits::ReportClient;
use crate::error::ReportError;
use crate::types::{ReportRequest, ReportStatus};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_iam::Client as IamClient;
use aws_sdk_iam::config::Region;
use aws_sdk_iam::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_iam::operation::get_credential_report::GetCredentialReportError;

/// Service error codes that mean the caller is not allowed to make the call
const AUTH_ERROR_CODES: &[&str] = &[
    "AccessDenied",
    "AccessDeniedException",
    "ExpiredToken",
    "InvalidClientTokenId",
    "MissingAuthenticationToken",
    "SignatureDoesNotMatch",
    "UnrecognizedClientException",
];

/// Error code IAM returns while a credential report is still being generated
const REPORT_IN_PROGRESS_CODE: &str = "ReportInProgress";

/// Credential report client backed by the AWS SDK
///
/// Requires the `iam:GenerateCredentialReport` and `iam:GetCredentialReport`
/// permissions for the selected profile.
///
/// # Examples
///
/// ```no_run
/// use iam_credential_report::client::{IamReportClient, ReportClient};
/// use iam_credential_report::ReportRequest;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let request = ReportRequest::new("default", "us-east-1");
/// let client = IamReportClient::connect(&request).await;
///
/// client.trigger_generation(&request).await?;
/// let status = client.fetch_once().await?;
/// # Ok(())
/// # }
/// ```
pub struct IamReportClient {
    client: IamClient,
}

impl IamReportClient {
    /// Build a session for the request's profile and region
    ///
    /// Credential resolution is lazy; a bad profile surfaces as a
    /// [`ReportError::Authentication`] on the first remote call.
    pub async fn connect(request: &ReportRequest) -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest())
            .profile_name(request.profile())
            .region(Region::new(request.region().to_string()))
            .load()
            .await;

        tracing::debug!(
            profile = request.profile(),
            region = request.region(),
            "IAM session configured"
        );

        Self {
            client: IamClient::new(&config),
        }
    }
}

#[async_trait]
impl ReportClient for IamReportClient {
    async fn trigger_generation(&self, request: &ReportRequest) -> Result<(), ReportError> {
        let output = self
            .client
            .generate_credential_report()
            .send()
            .await
            .map_err(classify_sdk_error)?;

        // STARTED, INPROGRESS and COMPLETE are all accepted as success
        tracing::debug!(
            profile = request.profile(),
            state = ?output.state(),
            "credential report generation requested"
        );
        Ok(())
    }

    async fn fetch_once(&self) -> Result<ReportStatus, ReportError> {
        match self.client.get_credential_report().send().await {
            Ok(output) => Ok(status_from_content(
                output.content().map(|blob| blob.as_ref()),
            )),
            Err(err) if is_report_in_progress(&err) => Ok(ReportStatus::Pending),
            Err(err) => Err(classify_sdk_error(err)),
        }
    }

    fn name(&self) -> &'static str {
        "aws-iam"
    }
}

/// Map the content of a successful fetch onto a status
fn status_from_content(content: Option<&[u8]>) -> ReportStatus {
    match content {
        Some(bytes) if !bytes.is_empty() => ReportStatus::Ready(bytes.to_vec()),
        _ => ReportStatus::Pending,
    }
}

fn is_report_in_progress<R>(err: &SdkError<GetCredentialReportError, R>) -> bool {
    err.as_service_error().is_some_and(|service| {
        service.is_credential_report_not_ready_exception()
            || service.code() == Some(REPORT_IN_PROGRESS_CODE)
    })
}

fn classify_sdk_error<E, R>(err: SdkError<E, R>) -> ReportError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug,
{
    match &err {
        SdkError::ServiceError(service) => {
            let meta = service.err();
            let message = match (meta.code(), meta.message()) {
                (Some(code), Some(text)) => format!("{code}: {text}"),
                (Some(code), None) => code.to_string(),
                (None, Some(text)) => text.to_string(),
                (None, None) => error_chain(&err),
            };
            classify_service_code(meta.code(), message)
        }
        SdkError::TimeoutError(_) => ReportError::Network(error_chain(&err)),
        SdkError::DispatchFailure(dispatch) if dispatch.is_io() || dispatch.is_timeout() => {
            ReportError::Network(error_chain(&err))
        }
        // Credential resolution failures surface as non-I/O dispatch failures
        SdkError::DispatchFailure(_) => ReportError::Authentication(error_chain(&err)),
        SdkError::ResponseError(_) => ReportError::MalformedResponse(error_chain(&err)),
        _ => ReportError::Service(error_chain(&err)),
    }
}

/// Join the `Display` output of an error and its sources with `": "`
///
/// Sources whose text is already part of the message are skipped.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !text.is_empty() && !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

fn classify_service_code(code: Option<&str>, message: String) -> ReportError {
    match code {
        Some(code) if AUTH_ERROR_CODES.contains(&code) => ReportError::Authentication(message),
        _ => ReportError::Service(message),
    }
}
