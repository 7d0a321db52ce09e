//! Per-platform viewer selection and availability checks

use crate::error::PrerequisiteError;
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

/// Operating systems the tool knows how to open reports on
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostOs {
    /// Microsoft Windows
    Windows,
    /// Linux distributions
    Linux,
    /// Apple macOS
    MacOs,
    /// Anything else, carrying the platform name for diagnostics
    Other(String),
}

impl HostOs {
    /// The platform this binary was built for
    pub fn current() -> Self {
        Self::from_os_name(std::env::consts::OS)
    }

    /// Map a `std::env::consts::OS` style name onto a platform
    pub fn from_os_name(name: &str) -> Self {
        match name {
            "windows" => HostOs::Windows,
            "linux" => HostOs::Linux,
            "macos" => HostOs::MacOs,
            other => HostOs::Other(other.to_string()),
        }
    }
}

impl fmt::Display for HostOs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostOs::Windows => f.write_str("windows"),
            HostOs::Linux => f.write_str("linux"),
            HostOs::MacOs => f.write_str("macos"),
            HostOs::Other(name) => f.write_str(name),
        }
    }
}

/// Which viewer to use on a platform and how to invoke it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewerPlan {
    /// Platform the plan was resolved for
    pub os: HostOs,
    /// Executable or application that must be installed
    pub executable: &'static str,
    /// Program that is actually spawned
    pub program: &'static str,
    /// Arguments placed before the report path
    pub leading_args: &'static [&'static str],
}

/// A concrete command line for one report
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    /// Program to spawn
    pub program: String,
    /// Arguments, ending with the report path
    pub args: Vec<OsString>,
}

impl ViewerPlan {
    /// Render the command line that opens `path`
    pub fn invocation(&self, path: &Path) -> Invocation {
        let mut args: Vec<OsString> = self.leading_args.iter().map(OsString::from).collect();
        args.push(path.as_os_str().to_os_string());

        Invocation {
            program: self.program.to_string(),
            args,
        }
    }
}

/// Choose the viewer for `host`
///
/// | Platform | Looks for         | Runs                                 |
/// |----------|-------------------|--------------------------------------|
/// | Windows  | `excel.exe`       | `excel.exe <path>`                   |
/// | Linux    | `libreoffice`     | `libreoffice <path>`                 |
/// | macOS    | `Microsoft Excel` | `open -a "Microsoft Excel" <path>`   |
///
/// # Errors
///
/// [`PrerequisiteError::UnsupportedPlatform`] for any other platform; no
/// fallback viewer is guessed.
pub fn resolve(host: &HostOs) -> Result<ViewerPlan, PrerequisiteError> {
    let plan = match host {
        HostOs::Windows => ViewerPlan {
            os: HostOs::Windows,
            executable: "excel.exe",
            program: "excel.exe",
            leading_args: &[],
        },
        HostOs::Linux => ViewerPlan {
            os: HostOs::Linux,
            executable: "libreoffice",
            program: "libreoffice",
            leading_args: &[],
        },
        HostOs::MacOs => ViewerPlan {
            os: HostOs::MacOs,
            executable: "Microsoft Excel",
            program: "open",
            leading_args: &["-a", "Microsoft Excel"],
        },
        HostOs::Other(name) => {
            return Err(PrerequisiteError::UnsupportedPlatform(name.clone()));
        }
    };

    Ok(plan)
}

/// Check that the plan's viewer is installed, without launching it
///
/// Searches `PATH` with the `which` crate. macOS applications are installed as
/// bundles rather than on `PATH`, so `/Applications` and `~/Applications` are
/// checked as well on that platform.
///
/// # Errors
///
/// [`PrerequisiteError::ViewerNotFound`] when the viewer cannot be located.
pub fn verify_available(plan: &ViewerPlan) -> Result<PathBuf, PrerequisiteError> {
    if let Ok(path) = which::which(plan.executable) {
        tracing::debug!(viewer = plan.executable, path = %path.display(), "viewer found on PATH");
        return Ok(path);
    }

    if plan.os == HostOs::MacOs {
        if let Some(bundle) = find_app_bundle(plan.executable) {
            tracing::debug!(viewer = plan.executable, path = %bundle.display(), "viewer application found");
            return Ok(bundle);
        }
    }

    Err(PrerequisiteError::ViewerNotFound {
        executable: plan.executable.to_string(),
    })
}

fn find_app_bundle(name: &str) -> Option<PathBuf> {
    find_app_bundle_in(name, &app_bundle_dirs())
}

fn app_bundle_dirs() -> Vec<PathBuf> {
    let mut search_dirs = vec![PathBuf::from("/Applications")];
    if let Some(home) = dirs::home_dir() {
        search_dirs.push(home.join("Applications"));
    }
    search_dirs
}

/// First `<name>.app` directory found in `search_dirs`, in order
fn find_app_bundle_in(name: &str, search_dirs: &[PathBuf]) -> Option<PathBuf> {
    let bundle = format!("{name}.app");

    search_dirs
        .iter()
        .map(|dir| dir.join(&bundle))
        .find(|candidate| candidate.is_dir())
}
