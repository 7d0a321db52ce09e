//! Opening a downloaded report in a spreadsheet viewer
//!
//! Deciding *which* viewer a platform uses ([`resolve`]) is kept apart from
//! checking whether it is *installed* ([`verify_available`]), so a failure
//! names the actual problem: wrong platform or missing install.
//!
//! ```no_run
//! use iam_credential_report::viewer::{HostOs, resolve, verify_available};
//!
//! let plan = resolve(&HostOs::current())?;
//! let location = verify_available(&plan)?;
//! println!("{} found at {}", plan.executable, location.display());
//! # Ok::<(), iam_credential_report::error::PrerequisiteError>(())
//! ```

mod launcher;
mod resolver;

pub use launcher::{ProcessLauncher, ViewerLauncher};
pub use resolver::{HostOs, Invocation, ViewerPlan, resolve, verify_available};
