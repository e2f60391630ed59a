//! Run configuration
//!
//! Credentials and resource names come from the environment and are validated
//! up front, so a missing key is reported before any request is sent instead
//! of surfacing later as a 401 from the service.

use std::time::Duration;

use url::Url;

use crate::error::{QuickstartError, Result};

pub const AUTHORING_KEY_VAR: &str = "AUTHORING_KEY";
pub const AUTHORING_RESOURCE_NAME_VAR: &str = "AUTHORING_RESOURCE_NAME";
pub const PREDICTION_RESOURCE_NAME_VAR: &str = "PREDICTION_RESOURCE_NAME";
/// Optional; falls back to the authoring key.
pub const PREDICTION_KEY_VAR: &str = "PREDICTION_KEY";

const ENDPOINT_TEMPLATE_HOST: &str = "cognitiveservices.azure.com";
const MAX_RESOURCE_NAME_LEN: usize = 63;

/// Validated configuration for one quickstart run.
#[derive(Clone)]
pub struct QuickstartConfig {
    pub authoring_key: String,
    pub prediction_key: String,
    pub authoring_endpoint: Url,
    pub prediction_endpoint: Url,
    pub poll: PollPolicy,
}

impl std::fmt::Debug for QuickstartConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuickstartConfig")
            .field("authoring_key", &"<redacted>")
            .field("prediction_key", &"<redacted>")
            .field("authoring_endpoint", &self.authoring_endpoint.as_str())
            .field("prediction_endpoint", &self.prediction_endpoint.as_str())
            .field("poll", &self.poll)
            .finish()
    }
}

impl QuickstartConfig {
    /// Read configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// Every missing variable is reported at once. Blank values count as
    /// missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let authoring_key = read(AUTHORING_KEY_VAR);
        let authoring_resource_name = read(AUTHORING_RESOURCE_NAME_VAR);
        let prediction_resource_name = read(PREDICTION_RESOURCE_NAME_VAR);

        let missing: Vec<&str> = [
            (AUTHORING_KEY_VAR, authoring_key.is_none()),
            (AUTHORING_RESOURCE_NAME_VAR, authoring_resource_name.is_none()),
            (PREDICTION_RESOURCE_NAME_VAR, prediction_resource_name.is_none()),
        ]
        .into_iter()
        .filter_map(|(name, absent)| absent.then_some(name))
        .collect();

        match (authoring_key, authoring_resource_name, prediction_resource_name) {
            (Some(authoring_key), Some(authoring_resource_name), Some(prediction_resource_name)) => {
                let prediction_key = read(PREDICTION_KEY_VAR).unwrap_or_else(|| authoring_key.clone());
                Ok(Self {
                    authoring_endpoint: endpoint_for(&authoring_resource_name)?,
                    prediction_endpoint: endpoint_for(&prediction_resource_name)?,
                    authoring_key,
                    prediction_key,
                    poll: PollPolicy::default(),
                })
            }
            _ => Err(QuickstartError::configuration(format!(
                "required environment variable(s) not set: {}",
                missing.join(", ")
            ))),
        }
    }

    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }
}

/// `https://{resource}.cognitiveservices.azure.com/`
pub fn endpoint_for(resource_name: &str) -> Result<Url> {
    validate_resource_name(resource_name)?;
    Url::parse(&format!("https://{}.{}/", resource_name, ENDPOINT_TEMPLATE_HOST)).map_err(|e| {
        QuickstartError::configuration(format!(
            "resource name '{}' does not form a valid endpoint: {}",
            resource_name, e
        ))
    })
}

/// Resource names become a DNS label in the endpoint host.
fn validate_resource_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name.len() <= MAX_RESOURCE_NAME_LEN
        && !name.starts_with('-')
        && !name.ends_with('-')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');

    if valid {
        Ok(())
    } else {
        Err(QuickstartError::configuration(format!(
            "invalid resource name '{}': expected 1-{} ASCII letters, digits or '-'",
            name, MAX_RESOURCE_NAME_LEN
        )))
    }
}

// =============================================================================
// Training poll policy
// =============================================================================

/// Shortest delay the poll ever waits between two status checks.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How the training-status poll waits between checks and when it gives up.
///
/// Intervals below `MIN_POLL_INTERVAL` are raised to it when the poll runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollPolicy {
    /// Delay before the second status check.
    pub initial_interval: Duration,
    /// Upper bound for the delay between checks.
    pub max_interval: Duration,
    /// Multiplier applied to the delay after every pending check.
    pub backoff_factor: f64,
    /// Total time budget for the poll loop.
    pub deadline: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            initial_interval: Duration::from_secs(1),
            max_interval: Duration::from_secs(10),
            backoff_factor: 2.0,
            deadline: Duration::from_secs(600),
        }
    }
}

impl PollPolicy {
    /// Fixed interval, no backoff.
    pub fn fixed(interval: Duration, deadline: Duration) -> Self {
        Self {
            initial_interval: interval,
            max_interval: interval,
            backoff_factor: 1.0,
            deadline,
        }
    }

    /// Reject a policy that would hammer the service or never wait at all.
    pub fn validate(&self) -> Result<()> {
        if self.initial_interval.is_zero() {
            return Err(QuickstartError::configuration(
                "training poll interval must be greater than zero",
            ));
        }
        if self.deadline.is_zero() {
            return Err(QuickstartError::configuration(
                "training timeout must be greater than zero",
            ));
        }
        Ok(())
    }

    /// Delay after the first pending check.
    pub fn first_interval(&self) -> Duration {
        self.initial_interval.max(MIN_POLL_INTERVAL)
    }

    /// The delay that follows `current`.
    pub fn next_interval(&self, current: Duration) -> Duration {
        let factor = if self.backoff_factor.is_finite() && self.backoff_factor >= 1.0 {
            self.backoff_factor
        } else {
            1.0
        };
        current
            .mul_f64(factor)
            .min(self.max_interval)
            .max(MIN_POLL_INTERVAL)
    }
}
