use clap::{ArgAction, Parser};
use iam_credential_report::acquisition::TokioSleeper;
use iam_credential_report::client::IamReportClient;
use iam_credential_report::config::{DEFAULT_FILENAME, DEFAULT_PROFILE, DEFAULT_REGION};
use iam_credential_report::viewer::{HostOs, ProcessLauncher};
use iam_credential_report::{Config, Error, PipelineOutcome, PollConfig, ReportPipeline};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, registry};

/// Generate and download an AWS IAM credential report.
///
/// Requires the iam:GenerateCredentialReport and iam:GetCredentialReport
/// permissions for the selected profile.
#[derive(Parser)]
#[command(name = "credential-report", version, about, long_about = None)]
struct Cli {
    /// The AWS region to run in
    #[arg(short, long, env = "AWS_REGION", default_value = DEFAULT_REGION)]
    region: String,

    /// The AWS CLI profile to load credentials from
    #[arg(short, long, env = "AWS_PROFILE", default_value = DEFAULT_PROFILE)]
    profile: String,

    /// The file to download the report to
    #[arg(short, long, default_value = DEFAULT_FILENAME)]
    filename: PathBuf,

    /// Open the report in a spreadsheet viewer after downloading
    #[arg(short, long)]
    open: bool,

    /// Seconds to wait between polls while the report is generated
    #[arg(long, default_value_t = 5)]
    poll_interval: u64,

    /// Give up after this many polls (default: poll until ready)
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Give up after waiting this many seconds in total (default: poll until ready)
    #[arg(long)]
    max_wait: Option<u64>,

    /// Print a JSON summary of the result on stdout
    #[arg(long)]
    json: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    fn config(&self) -> Config {
        Config {
            profile: self.profile.clone(),
            region: self.region.clone(),
            output_path: self.filename.clone(),
            open_after_download: self.open,
            poll: PollConfig {
                interval: Duration::from_secs(self.poll_interval),
                max_attempts: self.max_attempts,
                max_wait: self.max_wait.map(Duration::from_secs),
            },
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    let config = cli.config();
    log_banner(&config);

    match run(config).await {
        Ok(outcome) => {
            if cli.json {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "artifact": outcome.artifact,
                    "polls": outcome.polls,
                    "launched": outcome.launched,
                }));
            } else {
                println!(
                    "Credential report written to {} ({} bytes)",
                    outcome.artifact.path.display(),
                    outcome.artifact.bytes
                );
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            if cli.json {
                print_json(&serde_json::json!({
                    "status": "failed",
                    "stage": err.stage(),
                    "error": err.to_string(),
                }));
            }
            eprintln!("error: {} stage failed: {err}", err.stage());
            ExitCode::FAILURE
        }
    }
}

// Validation happens inside the pipeline; building the session makes no remote call
async fn run(config: Config) -> Result<PipelineOutcome, Error> {
    let client = IamReportClient::connect(&config.request()).await;
    let cancel = iam_credential_report::cancel_on_shutdown_signal();

    ReportPipeline::new(
        config,
        Arc::new(client),
        Arc::new(TokioSleeper),
        Arc::new(ProcessLauncher),
    )
    .with_cancellation(cancel)
    .run()
    .await
}

fn setup_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        LevelFilter::ERROR
    } else {
        match verbose {
            0 => LevelFilter::INFO,
            1 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    };

    // Everything outside this crate stays at WARN unless -vvv is given
    let filter = if verbose > 2 {
        Targets::new().with_default(LevelFilter::TRACE)
    } else {
        Targets::new()
            .with_default(LevelFilter::WARN.min(level))
            .with_target("iam_credential_report", level)
            .with_target("credential_report", level)
    };

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time();

    registry().with(fmt_layer).with(filter).init();
}

fn log_banner(config: &Config) {
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        platform = %HostOs::current(),
        arch = std::env::consts::ARCH,
        "credential-report starting"
    );
    tracing::info!(
        region = %config.region,
        profile = %config.profile,
        file = %config.output_path.display(),
        open = config.open_after_download,
        "settings"
    );
}

fn print_json(value: &serde_json::Value) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(e) => tracing::error!(error = %e, "failed to serialize summary"),
    }
}
