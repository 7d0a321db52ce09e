//! Configuration for a single credential-report run

use crate::error::{Error, Result};
use crate::types::ReportRequest;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default output file name
pub const DEFAULT_FILENAME: &str = "credentialsReport.csv";

/// Default named profile
pub const DEFAULT_PROFILE: &str = "default";

/// Default region
pub const DEFAULT_REGION: &str = "us-east-1";

/// Regions the tool accepts
pub const SUPPORTED_REGIONS: &[&str] = &[
    "af-south-1",
    "ap-east-1",
    "ap-northeast-1",
    "ap-northeast-2",
    "ap-south-1",
    "ap-south-2",
    "ap-southeast-1",
    "ap-southeast-2",
    "ap-southeast-3",
    "ap-southeast-4",
    "ca-central-1",
    "cn-north-1",
    "cn-northwest-1",
    "eu-central-1",
    "eu-central-2",
    "eu-north-1",
    "eu-south-1",
    "eu-west-1",
    "eu-west-2",
    "eu-west-3",
    "me-south-1",
    "me-central-1",
    "sa-east-1",
    "us-east-1",
    "us-east-2",
    "us-gov-east-1",
    "us-gov-west-1",
    "us-west-1",
    "us-west-2",
];

/// Top-level configuration for one invocation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Named profile used to load AWS credentials (default: "default")
    #[serde(default = "default_profile")]
    pub profile: String,

    /// Region the IAM client talks to (default: "us-east-1")
    #[serde(default = "default_region")]
    pub region: String,

    /// Where the report is written (default: "credentialsReport.csv")
    #[serde(default = "default_output_path")]
    pub output_path: PathBuf,

    /// Open the report in a spreadsheet viewer once written
    #[serde(default)]
    pub open_after_download: bool,

    /// Polling behaviour while the report is generated
    #[serde(default)]
    pub poll: PollConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            profile: default_profile(),
            region: default_region(),
            output_path: default_output_path(),
            open_after_download: false,
            poll: PollConfig::default(),
        }
    }
}

impl Config {
    /// Check every setting, returning the first invalid one
    pub fn validate(&self) -> Result<()> {
        if self.profile.trim().is_empty() {
            return Err(config_error("profile must not be empty", "profile"));
        }

        if !SUPPORTED_REGIONS.contains(&self.region.as_str()) {
            return Err(config_error(
                format!("unsupported region '{}'", self.region),
                "region",
            ));
        }

        if self.output_path.as_os_str().is_empty() {
            return Err(config_error("output path must not be empty", "output_path"));
        }

        self.poll.validate()
    }

    /// The request this configuration describes
    pub fn request(&self) -> ReportRequest {
        ReportRequest::new(&self.profile, &self.region)
    }
}

/// Polling configuration for the acquisition state machine
///
/// Both bounds are unset by default, which polls until the report is ready or
/// a fetch fails.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PollConfig {
    /// Fixed delay between polls while the report is pending (default: 5 seconds)
    #[serde(default = "default_poll_interval", with = "duration_serde")]
    pub interval: Duration,

    /// Give up after this many fetch attempts (default: unbounded)
    #[serde(default)]
    pub max_attempts: Option<u32>,

    /// Give up once the accumulated wait between polls would exceed this (default: unbounded)
    #[serde(default, with = "optional_duration_serde")]
    pub max_wait: Option<Duration>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: default_poll_interval(),
            max_attempts: None,
            max_wait: None,
        }
    }
}

impl PollConfig {
    fn validate(&self) -> Result<()> {
        if self.interval.is_zero() {
            return Err(config_error("poll interval must be positive", "poll.interval"));
        }
        if self.max_attempts == Some(0) {
            return Err(config_error(
                "max attempts must be at least 1",
                "poll.max_attempts",
            ));
        }
        Ok(())
    }

    /// Whether any bound is configured
    pub fn is_bounded(&self) -> bool {
        self.max_attempts.is_some() || self.max_wait.is_some()
    }
}

fn config_error(message: impl Into<String>, key: &str) -> Error {
    Error::Config {
        message: message.into(),
        key: Some(key.to_string()),
    }
}

fn default_profile() -> String {
    DEFAULT_PROFILE.to_string()
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

fn default_output_path() -> PathBuf {
    PathBuf::from(DEFAULT_FILENAME)
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(5)
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Optional Duration serialization helper
mod optional_duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_values() {
        let config = Config::default();

        assert_eq!(config.profile, "default");
        assert_eq!(config.region, "us-east-1");
        assert_eq!(config.output_path, PathBuf::from("credentialsReport.csv"));
        assert!(!config.open_after_download);
        assert_eq!(config.poll.interval, Duration::from_secs(5));
        assert!(!config.poll.is_bounded());
        config.validate().expect("defaults must be valid");
    }

    #[test]
    fn empty_json_deserializes_to_defaults() {
        let config: Config = serde_json::from_str("{}").expect("deserialize failed");

        assert_eq!(config.region, DEFAULT_REGION);
        assert_eq!(config.poll, PollConfig::default());
    }

    #[test]
    fn poll_durations_are_whole_seconds() {
        let json = r#"{"poll": {"interval": 2, "max_wait": 60, "max_attempts": 10}}"#;
        let config: Config = serde_json::from_str(json).expect("deserialize failed");

        assert_eq!(config.poll.interval, Duration::from_secs(2));
        assert_eq!(config.poll.max_wait, Some(Duration::from_secs(60)));
        assert_eq!(config.poll.max_attempts, Some(10));

        let value = serde_json::to_value(&config.poll).expect("serialize failed");
        assert_eq!(value["interval"], 2);
        assert_eq!(value["max_wait"], 60);
    }

    #[test]
    fn unknown_region_is_rejected_with_its_key() {
        let config = Config {
            region: "mars-north-1".into(),
            ..Default::default()
        };

        match config.validate() {
            Err(Error::Config { message, key }) => {
                assert!(message.contains("mars-north-1"));
                assert_eq!(key.as_deref(), Some("region"));
            }
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn blank_profile_and_zero_interval_are_rejected() {
        let blank = Config {
            profile: "  ".into(),
            ..Default::default()
        };
        assert!(blank.validate().is_err());

        let zero = Config {
            poll: PollConfig {
                interval: Duration::ZERO,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            zero.validate(),
            Err(Error::Config { key: Some(k), .. }) if k == "poll.interval"
        ));
    }

    #[test]
    fn request_carries_profile_and_region() {
        let config = Config {
            profile: "audit".into(),
            region: "eu-west-1".into(),
            ..Default::default()
        };

        assert_eq!(config.request(), ReportRequest::new("audit", "eu-west-1"));
    }
}
