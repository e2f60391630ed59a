//! Error taxonomy for a quickstart run
//!
//! Every failure a run can hit maps to exactly one `QuickstartError` variant,
//! and every variant maps to one process exit code so calling systems can tell
//! a bad environment from a rejected request from a failed training job.

use std::time::Duration;

use thiserror::Error;

use crate::quickstart::entity_tree::ResolutionError;
use crate::quickstart::steps::Step;

/// Top-level error returned by configuration loading and by the orchestrator.
#[derive(Error, Debug)]
pub enum QuickstartError {
    /// Missing or malformed environment configuration. Raised before any
    /// network call is made.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A remote authoring or prediction call failed (transport, auth,
    /// validation, quota). Aborts the run.
    #[error("Remote operation failed at step {step} ({context}): {source:#}")]
    RemoteOperation {
        step: Step,
        context: String,
        #[source]
        source: anyhow::Error,
    },

    /// A child or grandchild entity could not be recovered by name.
    #[error("Entity resolution failed: {0}")]
    EntityResolution(#[from] ResolutionError),

    /// Training did not reach all-Success before the deadline.
    #[error("Training of app {app_id} version {version_id} did not finish within {}s ({polls} status checks)", .waited.as_secs())]
    TrainingTimeout {
        app_id: String,
        version_id: String,
        waited: Duration,
        polls: u32,
    },

    /// At least one model reported a terminal failure status.
    #[error("Training of app {app_id} version {version_id} failed: {}", .failures.join("; "))]
    TrainingFailed {
        app_id: String,
        version_id: String,
        failures: Vec<String>,
    },

    /// A step ran before the step that produces its input.
    #[error("Step {step} requires {needs}, which no earlier step produced")]
    MissingPrerequisite { step: Step, needs: &'static str },
}

impl QuickstartError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn remote(step: Step, context: impl Into<String>, source: anyhow::Error) -> Self {
        Self::RemoteOperation {
            step,
            context: context.into(),
            source,
        }
    }

    /// Process exit code for this error class.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Configuration(_) => 2,
            Self::RemoteOperation { .. } => 3,
            Self::EntityResolution(_) => 4,
            Self::TrainingTimeout { .. } => 5,
            Self::TrainingFailed { .. } => 6,
            Self::MissingPrerequisite { .. } => 70,
        }
    }

    /// The step the error surfaced in, when there is one.
    pub fn step(&self) -> Option<Step> {
        match self {
            Self::RemoteOperation { step, .. } | Self::MissingPrerequisite { step, .. } => {
                Some(*step)
            }
            Self::EntityResolution(_) => Some(Step::ResolveSubEntityIds),
            Self::TrainingTimeout { .. } | Self::TrainingFailed { .. } => {
                Some(Step::PollTrainingStatus)
            }
            Self::Configuration(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, QuickstartError>;
