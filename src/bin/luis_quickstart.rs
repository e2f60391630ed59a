//! LUIS quickstart command line
//!
//! Creates, trains, publishes and queries the Contoso Pizza Company app.
//!
//! # Usage
//!
//! ```bash
//! export AUTHORING_KEY=...
//! export AUTHORING_RESOURCE_NAME=my-authoring-resource
//! export PREDICTION_RESOURCE_NAME=my-prediction-resource
//!
//! luis_quickstart
//! luis_quickstart --training-timeout-secs 300 --json
//! RUST_LOG=luis_quickstart=debug luis_quickstart
//! ```
//!
//! Exit codes: 0 success, 2 configuration, 3 remote call, 4 entity
//! resolution, 5 training timeout, 6 training failed.

use clap::Parser;
use colored::Colorize;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use luis_quickstart::quickstart::sample;
use luis_quickstart::{
    AuthoringClient, PollPolicy, Quickstart, QuickstartConfig, QuickstartError, QuickstartReport,
    RuntimeClient, SampleApp,
};

const DEFAULT_LOG_FILTER: &str = "warn,luis_quickstart=info";

#[derive(Parser)]
#[command(name = "luis_quickstart")]
#[command(version)]
#[command(about = "Create, train, publish and query a LUIS app")]
#[command(long_about = None)]
struct Args {
    /// Name of the app to create
    #[arg(long, default_value = sample::APP_NAME)]
    app_name: String,

    /// Initial version id
    #[arg(long, default_value = sample::VERSION_ID)]
    version_id: String,

    /// App culture
    #[arg(long, default_value = sample::CULTURE)]
    culture: String,

    /// Utterance sent to the published app
    #[arg(long, default_value = sample::PREDICTION_QUERY)]
    query: String,

    /// Slot to publish to and query ("Production" or "Staging")
    #[arg(long, default_value = sample::PRODUCTION_SLOT)]
    slot: String,

    /// Delay before the second training-status check
    #[arg(long, env = "LUIS_POLL_INTERVAL_MS", default_value_t = 1000)]
    poll_interval_ms: u64,

    /// Longest delay between training-status checks
    #[arg(long, env = "LUIS_POLL_MAX_INTERVAL_MS", default_value_t = 10_000)]
    poll_max_interval_ms: u64,

    /// Give up on training after this many seconds
    #[arg(long, env = "LUIS_TRAINING_TIMEOUT_SECS", default_value_t = 600)]
    training_timeout_secs: u64,

    /// Print the full run report as JSON instead of only the prediction
    #[arg(long)]
    json: bool,
}

impl Args {
    fn sample(&self) -> SampleApp {
        SampleApp {
            app_name: self.app_name.clone(),
            version_id: self.version_id.clone(),
            culture: self.culture.clone(),
            query: self.query.clone(),
            slot_name: self.slot.clone(),
        }
    }

    fn poll_policy(&self) -> Result<PollPolicy, QuickstartError> {
        let policy = PollPolicy {
            initial_interval: Duration::from_millis(self.poll_interval_ms),
            max_interval: Duration::from_millis(self.poll_max_interval_ms.max(self.poll_interval_ms)),
            deadline: Duration::from_secs(self.training_timeout_secs),
            ..PollPolicy::default()
        };
        policy.validate()?;
        Ok(policy)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // RUST_LOG wins when set
    tracing_subscriber::fmt()
        .with_env_filter(default_filter())
        .init();

    let args = Args::parse();

    match run(&args).await {
        Ok(report) => {
            let output = if args.json {
                serde_json::to_string_pretty(&report)
            } else {
                serde_json::to_string_pretty(&report.prediction.prediction)
            };
            match output {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    eprintln!("{} failed to render prediction: {}", "ERROR:".red().bold(), e);
                    return ExitCode::FAILURE;
                }
            }
            println!("{}", "Done".green().bold());
            ExitCode::SUCCESS
        }
        Err(e) => {
            report_error(&e);
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run(args: &Args) -> Result<QuickstartReport, QuickstartError> {
    let config = QuickstartConfig::from_env()?.with_poll_policy(args.poll_policy()?);

    let authoring = AuthoringClient::from_config(&config)
        .map_err(|e| QuickstartError::configuration(format!("{:#}", e)))?;
    let prediction = RuntimeClient::from_config(&config)
        .map_err(|e| QuickstartError::configuration(format!("{:#}", e)))?;

    let quickstart = Quickstart::new(&authoring, &prediction)
        .with_sample(args.sample())
        .with_poll_policy(config.poll);

    let example = quickstart.sample().labeled_example();
    match serde_json::to_string_pretty(&example) {
        Ok(json) => println!("Labeled Example Utterance: {}", json),
        Err(e) => tracing::warn!(error = %e, "Could not render labeled example"),
    }

    quickstart.run().await
}

fn default_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn report_error(error: &QuickstartError) {
    let prefix = match error.step() {
        Some(step) => format!("ERROR [{}]:", step),
        None => "ERROR:".to_string(),
    };
    eprintln!("{} {}", prefix.red().bold(), error);
}
