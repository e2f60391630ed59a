//! The ordered step pipeline of a quickstart run.
//!
//! ```text
//!  1 create-app               →  app id
//!  2 add-intent
//!  3 add-prebuilt-entity
//!  4 add-ml-entity            →  root entity id
//!  5 add-phrase-list-feature  →  phrase list id
//!  6 resolve-sub-entity-ids   →  Pizza/Quantity id, Toppings/Quantity id
//!  7 attach-features          (three submissions, all confirmed)
//!  8 add-labeled-example
//!  9 train
//! 10 poll-training-status     (gate: every model reports Success)
//! 11 publish                  →  endpoint info
//! 12 predict                  →  prediction
//! ```
//!
//! There is no branching on success: the only exits are completion after
//! `Predict` or an error at any step.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Step {
    CreateApp,
    AddIntent,
    AddPrebuiltEntity,
    AddMlEntity,
    AddPhraseListFeature,
    ResolveSubEntityIds,
    AttachFeatures,
    AddLabeledExample,
    Train,
    PollTrainingStatus,
    Publish,
    Predict,
}

impl Step {
    /// Every step in execution order.
    pub const ALL: [Step; 12] = [
        Step::CreateApp,
        Step::AddIntent,
        Step::AddPrebuiltEntity,
        Step::AddMlEntity,
        Step::AddPhraseListFeature,
        Step::ResolveSubEntityIds,
        Step::AttachFeatures,
        Step::AddLabeledExample,
        Step::Train,
        Step::PollTrainingStatus,
        Step::Publish,
        Step::Predict,
    ];

    /// 1-based position in the pipeline.
    pub fn ordinal(self) -> usize {
        self as usize + 1
    }

    /// The step that runs after this one, `None` after `Predict`.
    pub fn next(self) -> Option<Step> {
        Self::ALL.get(self.ordinal()).copied()
    }

    /// Same name the step serializes to.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CreateApp => "create-app",
            Self::AddIntent => "add-intent",
            Self::AddPrebuiltEntity => "add-prebuilt-entity",
            Self::AddMlEntity => "add-ml-entity",
            Self::AddPhraseListFeature => "add-phrase-list-feature",
            Self::ResolveSubEntityIds => "resolve-sub-entity-ids",
            Self::AttachFeatures => "attach-features",
            Self::AddLabeledExample => "add-labeled-example",
            Self::Train => "train",
            Self::PollTrainingStatus => "poll-training-status",
            Self::Publish => "publish",
            Self::Predict => "predict",
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/12 {}", self.ordinal(), self.as_str())
    }
}
