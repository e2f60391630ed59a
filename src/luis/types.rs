//! LUIS authoring and prediction payload types
//!
//! Field names follow the service's camelCase JSON.
//!
//! Reference: https://westus.dev.cognitive.microsoft.com/docs/services/luis-programmatic-apis-v3-0-preview

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Applications
// =============================================================================

/// Body of create-application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationCreateObject {
    pub name: String,
    pub culture: String,
    pub initial_version_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Body of publish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationPublishObject {
    pub version_id: String,
    pub is_staging: bool,
}

/// Where a version was published.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductionOrStagingEndpointInfo {
    #[serde(default)]
    pub version_id: Option<String>,
    #[serde(default)]
    pub is_staging: Option<bool>,
    #[serde(default)]
    pub endpoint_url: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub endpoint_region: Option<String>,
    #[serde(default)]
    pub published_date_time: Option<String>,
    #[serde(default)]
    pub failed_regions: Option<String>,
}

// =============================================================================
// Model
// =============================================================================

/// Body of add-intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelCreateObject {
    pub name: String,
}

/// One prebuilt entity attached to a version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrebuiltEntityExtractor {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub type_id: Option<i32>,
    #[serde(default)]
    pub readable_type: Option<String>,
}

/// A node of a machine-learned entity tree.
///
/// The same shape is submitted to add-entity (no ids) and read back from
/// get-entity (every node carries the id the service assigned). Leaves have
/// no `children` key on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<EntityNode>,
}

impl EntityNode {
    /// A node with no id and no children.
    pub fn leaf(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            children: vec![],
        }
    }

    /// A node with no id and the given children.
    pub fn branch(name: impl Into<String>, children: Vec<EntityNode>) -> Self {
        Self {
            id: None,
            name: name.into(),
            children,
        }
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }
}

// =============================================================================
// Features
// =============================================================================

/// Body of add-phrase-list-feature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhraselistCreateObject {
    pub name: String,
    /// Comma separated phrases.
    pub phrases: String,
    pub is_exchangeable: bool,
    pub enabled_for_all_models: bool,
}

/// Body of add-entity-feature: exactly one of `model_name` or `feature_name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelFeatureInformation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_required: Option<bool>,
}

impl ModelFeatureInformation {
    /// Use another model (prebuilt or custom) as a feature.
    pub fn model(name: impl Into<String>, is_required: bool) -> Self {
        Self {
            model_name: Some(name.into()),
            feature_name: None,
            is_required: is_required.then_some(true),
        }
    }

    /// Use a phrase list as a feature.
    pub fn feature(name: impl Into<String>) -> Self {
        Self {
            model_name: None,
            feature_name: Some(name.into()),
            is_required: None,
        }
    }
}

/// Generic `{code, message}` acknowledgement.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationStatus {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

// =============================================================================
// Examples
// =============================================================================

/// Body of add-labeled-example.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExampleLabelObject {
    pub text: String,
    pub intent_name: String,
    pub entity_labels: Vec<EntityLabelObject>,
}

/// A labeled span. Both indexes are character offsets and inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityLabelObject {
    pub start_char_index: usize,
    pub end_char_index: usize,
    pub entity_name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<EntityLabelObject>,
}

impl EntityLabelObject {
    pub fn new(entity_name: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            start_char_index: start,
            end_char_index: end,
            entity_name: entity_name.into(),
            children: vec![],
        }
    }

    pub fn with_children(mut self, children: Vec<EntityLabelObject>) -> Self {
        self.children = children;
        self
    }

    /// The labeled text, `None` if the span falls outside `text`.
    pub fn covered<'a>(&self, text: &'a str) -> Option<&'a str> {
        let start = text.char_indices().nth(self.start_char_index)?.0;
        let end = text
            .char_indices()
            .nth(self.end_char_index + 1)
            .map(|(i, _)| i)
            .unwrap_or(text.len());
        if self.end_char_index >= text.chars().count() || start > end {
            return None;
        }
        text.get(start..end)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelExampleResponse {
    #[serde(default)]
    pub utterance_text: Option<String>,
    pub example_id: i64,
}

// =============================================================================
// Training
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnqueueTrainingResponse {
    #[serde(default)]
    pub status_id: Option<i32>,
    pub status: String,
}

/// One entry of get-training-status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelTrainingInfo {
    #[serde(default)]
    pub model_id: Option<Uuid>,
    pub details: ModelTrainingDetails,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelTrainingDetails {
    #[serde(default)]
    pub status_id: Option<i32>,
    pub status: String,
    #[serde(default)]
    pub example_count: Option<i32>,
    #[serde(default)]
    pub training_date_time: Option<String>,
    #[serde(default)]
    pub failure_reason: Option<String>,
}

// =============================================================================
// Prediction
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub query: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub query: String,
    pub prediction: Prediction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalized_query: Option<String>,
    pub top_intent: String,
    #[serde(default)]
    pub intents: BTreeMap<String, IntentScore>,
    /// Entity extraction output; its shape depends on the app's entities.
    #[serde(default)]
    pub entities: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentScore {
    #[serde(default)]
    pub score: Option<f64>,
}
