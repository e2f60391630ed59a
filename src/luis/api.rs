//! Client traits for the LUIS authoring and prediction surfaces
//!
//! The orchestrator only talks to these traits, so a run can be driven against
//! the real HTTP clients or an in-memory double.

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use super::types::*;

/// Authoring operations (apps, model, features, examples, train).
#[async_trait]
pub trait AuthoringApi: Send + Sync {
    /// Create an application, returning its id.
    async fn add_app(&self, app: &ApplicationCreateObject) -> Result<Uuid>;

    async fn add_intent(&self, app_id: Uuid, version_id: &str, intent: &ModelCreateObject)
        -> Result<Uuid>;

    async fn add_prebuilt(
        &self,
        app_id: Uuid,
        version_id: &str,
        prebuilt_names: &[String],
    ) -> Result<Vec<PrebuiltEntityExtractor>>;

    /// Create a machine-learned entity tree, returning the root id.
    async fn add_entity(&self, app_id: Uuid, version_id: &str, entity: &EntityNode)
        -> Result<Uuid>;

    /// Read an entity tree back with every node's id filled in.
    async fn get_entity(&self, app_id: Uuid, version_id: &str, entity_id: Uuid)
        -> Result<EntityNode>;

    async fn add_phrase_list(
        &self,
        app_id: Uuid,
        version_id: &str,
        phrase_list: &PhraselistCreateObject,
    ) -> Result<i64>;

    async fn add_entity_feature(
        &self,
        app_id: Uuid,
        version_id: &str,
        entity_id: Uuid,
        feature: &ModelFeatureInformation,
    ) -> Result<OperationStatus>;

    async fn add_example(
        &self,
        app_id: Uuid,
        version_id: &str,
        example: &ExampleLabelObject,
        enable_nested_children: bool,
    ) -> Result<LabelExampleResponse>;

    async fn train_version(&self, app_id: Uuid, version_id: &str)
        -> Result<EnqueueTrainingResponse>;

    async fn get_training_status(&self, app_id: Uuid, version_id: &str)
        -> Result<Vec<ModelTrainingInfo>>;

    async fn publish(
        &self,
        app_id: Uuid,
        publish: &ApplicationPublishObject,
    ) -> Result<ProductionOrStagingEndpointInfo>;
}

/// Runtime (prediction) operations.
#[async_trait]
pub trait PredictionApi: Send + Sync {
    async fn get_slot_prediction(
        &self,
        app_id: Uuid,
        slot_name: &str,
        request: &PredictionRequest,
    ) -> Result<PredictionResponse>;
}
