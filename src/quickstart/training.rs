//! Training-status polling.
//!
//! The loop only exits successfully when every model in the latest status
//! fetch reports `Success`. A terminal failure on any model ends it with
//! `TrainingFailed`; running out of the deadline ends it with
//! `TrainingTimeout`. Checks are spaced by the `PollPolicy` interval.

use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::PollPolicy;
use crate::error::{QuickstartError, Result};
use crate::luis::api::AuthoringApi;
use crate::luis::types::ModelTrainingInfo;
use crate::quickstart::steps::Step;

/// Status of one model as far as the poll loop is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelStatus {
    Success,
    Pending,
    Failed,
}

impl ModelStatus {
    /// Only `Success` counts as trained. `UpToDate` is pending too, so a
    /// version whose models the service reports as `UpToDate` instead of
    /// `Success` never passes the gate and ends in `TrainingTimeout`.
    pub fn classify(status: &str) -> Self {
        match status {
            "Success" => Self::Success,
            "Fail" | "Failed" => Self::Failed,
            "Queued" | "InProgress" | "UpToDate" => Self::Pending,
            other => {
                warn!(status = other, "Unrecognised training status, treating as pending");
                Self::Pending
            }
        }
    }
}

/// Summary of one status fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrainingState {
    /// Every model reported Success.
    Complete,
    /// At least one model is still queued or training.
    Pending { done: usize, total: usize },
    /// At least one model failed; one description per failed model.
    Failed(Vec<String>),
}

impl TrainingState {
    /// An empty status list is pending: there is nothing yet that succeeded.
    pub fn from_statuses(statuses: &[ModelTrainingInfo]) -> Self {
        if statuses.is_empty() {
            return Self::Pending { done: 0, total: 0 };
        }

        let mut done = 0;
        let mut failures = vec![];
        for info in statuses {
            match ModelStatus::classify(&info.details.status) {
                ModelStatus::Success => done += 1,
                ModelStatus::Failed => failures.push(describe_failure(info)),
                ModelStatus::Pending => {}
            }
        }

        if !failures.is_empty() {
            Self::Failed(failures)
        } else if done == statuses.len() {
            Self::Complete
        } else {
            Self::Pending {
                done,
                total: statuses.len(),
            }
        }
    }
}

fn describe_failure(info: &ModelTrainingInfo) -> String {
    let model = info
        .model_id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "<unknown model>".to_string());
    match &info.details.failure_reason {
        Some(reason) => format!("model {} {}: {}", model, info.details.status, reason),
        None => format!("model {} {}", model, info.details.status),
    }
}

/// Outcome of a successful poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrainingOutcome {
    pub polls: u32,
    pub models: usize,
    pub elapsed: Duration,
}

/// Poll get-training-status until the version is trained.
pub async fn wait_for_training(
    authoring: &dyn AuthoringApi,
    app_id: Uuid,
    version_id: &str,
    policy: &PollPolicy,
) -> Result<TrainingOutcome> {
    let started = Instant::now();
    let mut polls = 0u32;

    let result = tokio::time::timeout(
        policy.deadline,
        poll_until_trained(authoring, app_id, version_id, policy, started, &mut polls),
    )
    .await;
    match result {
        Ok(outcome) => {
            let outcome = outcome?;
            info!(
                polls = outcome.polls,
                models = outcome.models,
                elapsed_ms = outcome.elapsed.as_millis() as u64,
                "Training complete"
            );
            Ok(outcome)
        }
        Err(_) => Err(QuickstartError::TrainingTimeout {
            app_id: app_id.to_string(),
            version_id: version_id.to_string(),
            waited: started.elapsed(),
            polls,
        }),
    }
}

async fn poll_until_trained(
    authoring: &dyn AuthoringApi,
    app_id: Uuid,
    version_id: &str,
    policy: &PollPolicy,
    started: Instant,
    polls: &mut u32,
) -> Result<TrainingOutcome> {
    let mut interval = policy.first_interval();
    loop {
        *polls += 1;
        let check = *polls;
        let statuses = authoring
            .get_training_status(app_id, version_id)
            .await
            .map_err(|e| {
                QuickstartError::remote(
                    Step::PollTrainingStatus,
                    format!("get training status (check {})", check),
                    e,
                )
            })?;

        match TrainingState::from_statuses(&statuses) {
            TrainingState::Complete => {
                return Ok(TrainingOutcome {
                    polls: check,
                    models: statuses.len(),
                    elapsed: started.elapsed(),
                });
            }
            TrainingState::Failed(failures) => {
                return Err(QuickstartError::TrainingFailed {
                    app_id: app_id.to_string(),
                    version_id: version_id.to_string(),
                    failures,
                });
            }
            TrainingState::Pending { done, total } => {
                debug!(
                    poll = check,
                    done,
                    total,
                    wait_ms = interval.as_millis() as u64,
                    "Training in progress"
                );
                sleep(interval).await;
                interval = policy.next_interval(interval);
            }
        }
    }
}
