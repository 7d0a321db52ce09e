//! Remote credential report service
//!
//! The [`ReportClient`] trait is the seam between the acquisition state
//! machine and the identity service. [`IamReportClient`] talks to AWS IAM;
//! tests substitute scripted implementations.

mod iam;
mod traits;

pub use iam::IamReportClient;
pub use traits::ReportClient;
