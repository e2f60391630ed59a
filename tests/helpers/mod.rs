//! In-memory LUIS double for driving the orchestrator without a network.
//!
//! Every call is recorded in order. Training status responses are scripted;
//! the last scripted response repeats once the script runs out.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use uuid::Uuid;

use luis_quickstart::luis::types::*;
use luis_quickstart::{AuthoringApi, PredictionApi, Step};

pub const APP_ID: Uuid = Uuid::from_u128(0xA11);
pub const PHRASE_LIST_ID: i64 = 42;
pub const EXAMPLE_ID: i64 = 7;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    AddApp(ApplicationCreateObject),
    AddIntent { app_id: Uuid, version_id: String, intent: String },
    AddPrebuilt(Vec<String>),
    AddEntity(EntityNode),
    AddPhraseList(PhraselistCreateObject),
    GetEntity(Uuid),
    AddEntityFeature { entity_id: Uuid, feature: ModelFeatureInformation },
    AddExample { example: ExampleLabelObject, enable_nested_children: bool },
    TrainVersion,
    GetTrainingStatus,
    Publish(ApplicationPublishObject),
    Predict { slot: String, query: String },
}

impl Call {
    /// The pipeline step that issues this call.
    pub fn step(&self) -> Step {
        match self {
            Call::AddApp(_) => Step::CreateApp,
            Call::AddIntent { .. } => Step::AddIntent,
            Call::AddPrebuilt(_) => Step::AddPrebuiltEntity,
            Call::AddEntity(_) => Step::AddMlEntity,
            Call::AddPhraseList(_) => Step::AddPhraseListFeature,
            Call::GetEntity(_) => Step::ResolveSubEntityIds,
            Call::AddEntityFeature { .. } => Step::AttachFeatures,
            Call::AddExample { .. } => Step::AddLabeledExample,
            Call::TrainVersion => Step::Train,
            Call::GetTrainingStatus => Step::PollTrainingStatus,
            Call::Publish(_) => Step::Publish,
            Call::Predict { .. } => Step::Predict,
        }
    }
}

pub fn status(value: &str) -> ModelTrainingInfo {
    ModelTrainingInfo {
        model_id: Some(Uuid::new_v4()),
        details: ModelTrainingDetails {
            status_id: None,
            status: value.to_string(),
            example_count: Some(1),
            training_date_time: None,
            failure_reason: (value == "Fail" || value == "Failed")
                .then(|| "FewLabels".to_string()),
        },
    }
}

pub fn statuses(values: &[&str]) -> Vec<ModelTrainingInfo> {
    values.iter().map(|v| status(v)).collect()
}

pub struct FakeLuis {
    calls: Mutex<Vec<Call>>,
    training: Mutex<VecDeque<Vec<ModelTrainingInfo>>>,
    created_entity: Mutex<Option<EntityNode>>,
    entity_override: Option<EntityNode>,
    fail_at: Option<Step>,
    next_id: Mutex<u128>,
}

impl Default for FakeLuis {
    fn default() -> Self {
        Self {
            calls: Mutex::new(vec![]),
            training: Mutex::new(VecDeque::from(vec![statuses(&["Success", "Success"])])),
            created_entity: Mutex::new(None),
            entity_override: None,
            fail_at: None,
            next_id: Mutex::new(0x1000),
        }
    }
}

impl FakeLuis {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_training_script(self, script: Vec<Vec<ModelTrainingInfo>>) -> Self {
        *self.training.lock().unwrap() = script.into();
        self
    }

    /// Return this tree from get-entity instead of the created one.
    pub fn with_entity_override(mut self, tree: EntityNode) -> Self {
        self.entity_override = Some(tree);
        self
    }

    /// Reject the first call issued by `step`.
    pub fn failing_at(mut self, step: Step) -> Self {
        self.fail_at = Some(step);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, step: Step) -> usize {
        self.calls().iter().filter(|c| c.step() == step).count()
    }

    /// Id the fake assigned to `child/grandchild` of the created tree.
    pub fn created_id(&self, path: &[&str]) -> Option<Uuid> {
        let guard = self.created_entity.lock().unwrap();
        let mut node = guard.as_ref()?;
        for name in path {
            node = node.children.iter().find(|c| c.name == *name)?;
        }
        node.id
    }

    fn record(&self, call: Call) -> Result<()> {
        let step = call.step();
        self.calls.lock().unwrap().push(call);
        if self.fail_at == Some(step) {
            return Err(anyhow!("LUIS authoring API error 401 Unauthorized: simulated"));
        }
        Ok(())
    }

    fn fresh_id(&self) -> Uuid {
        let mut next = self.next_id.lock().unwrap();
        *next += 1;
        Uuid::from_u128(*next)
    }

    fn assign_ids(&self, node: &EntityNode) -> EntityNode {
        EntityNode {
            id: Some(self.fresh_id()),
            name: node.name.clone(),
            children: node.children.iter().map(|c| self.assign_ids(c)).collect(),
        }
    }
}

#[async_trait]
impl AuthoringApi for FakeLuis {
    async fn add_app(&self, app: &ApplicationCreateObject) -> Result<Uuid> {
        self.record(Call::AddApp(app.clone()))?;
        Ok(APP_ID)
    }

    async fn add_intent(
        &self,
        app_id: Uuid,
        version_id: &str,
        intent: &ModelCreateObject,
    ) -> Result<Uuid> {
        self.record(Call::AddIntent {
            app_id,
            version_id: version_id.to_string(),
            intent: intent.name.clone(),
        })?;
        Ok(self.fresh_id())
    }

    async fn add_prebuilt(
        &self,
        _app_id: Uuid,
        _version_id: &str,
        prebuilt_names: &[String],
    ) -> Result<Vec<PrebuiltEntityExtractor>> {
        self.record(Call::AddPrebuilt(prebuilt_names.to_vec()))?;
        Ok(prebuilt_names
            .iter()
            .map(|name| PrebuiltEntityExtractor {
                id: self.fresh_id(),
                name: name.clone(),
                type_id: Some(2),
                readable_type: Some("Prebuilt Entity Extractor".to_string()),
            })
            .collect())
    }

    async fn add_entity(
        &self,
        _app_id: Uuid,
        _version_id: &str,
        entity: &EntityNode,
    ) -> Result<Uuid> {
        self.record(Call::AddEntity(entity.clone()))?;
        let created = self.assign_ids(entity);
        let root_id = created.id.unwrap_or_default();
        *self.created_entity.lock().unwrap() = Some(created);
        Ok(root_id)
    }

    async fn get_entity(
        &self,
        _app_id: Uuid,
        _version_id: &str,
        entity_id: Uuid,
    ) -> Result<EntityNode> {
        self.record(Call::GetEntity(entity_id))?;
        if let Some(tree) = &self.entity_override {
            return Ok(tree.clone());
        }
        self.created_entity
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| anyhow!("entity {} not found", entity_id))
    }

    async fn add_phrase_list(
        &self,
        _app_id: Uuid,
        _version_id: &str,
        phrase_list: &PhraselistCreateObject,
    ) -> Result<i64> {
        self.record(Call::AddPhraseList(phrase_list.clone()))?;
        Ok(PHRASE_LIST_ID)
    }

    async fn add_entity_feature(
        &self,
        _app_id: Uuid,
        _version_id: &str,
        entity_id: Uuid,
        feature: &ModelFeatureInformation,
    ) -> Result<OperationStatus> {
        self.record(Call::AddEntityFeature {
            entity_id,
            feature: feature.clone(),
        })?;
        Ok(OperationStatus {
            code: Some("Success".to_string()),
            message: Some("Operation Successful".to_string()),
        })
    }

    async fn add_example(
        &self,
        _app_id: Uuid,
        _version_id: &str,
        example: &ExampleLabelObject,
        enable_nested_children: bool,
    ) -> Result<LabelExampleResponse> {
        self.record(Call::AddExample {
            example: example.clone(),
            enable_nested_children,
        })?;
        Ok(LabelExampleResponse {
            utterance_text: Some(example.text.to_lowercase()),
            example_id: EXAMPLE_ID,
        })
    }

    async fn train_version(&self, _app_id: Uuid, _version_id: &str) -> Result<EnqueueTrainingResponse> {
        self.record(Call::TrainVersion)?;
        Ok(EnqueueTrainingResponse {
            status_id: Some(9),
            status: "Queued".to_string(),
        })
    }

    async fn get_training_status(
        &self,
        _app_id: Uuid,
        _version_id: &str,
    ) -> Result<Vec<ModelTrainingInfo>> {
        self.record(Call::GetTrainingStatus)?;
        let mut script = self.training.lock().unwrap();
        if script.len() > 1 {
            Ok(script.pop_front().unwrap_or_default())
        } else {
            Ok(script.front().cloned().unwrap_or_default())
        }
    }

    async fn publish(
        &self,
        _app_id: Uuid,
        publish: &ApplicationPublishObject,
    ) -> Result<ProductionOrStagingEndpointInfo> {
        self.record(Call::Publish(publish.clone()))?;
        Ok(ProductionOrStagingEndpointInfo {
            version_id: Some(publish.version_id.clone()),
            is_staging: Some(publish.is_staging),
            endpoint_url: Some(format!(
                "https://contoso-prediction.cognitiveservices.azure.com/luis/prediction/v3.0/apps/{}",
                APP_ID
            )),
            region: Some("westus".to_string()),
            ..Default::default()
        })
    }
}

#[async_trait]
impl PredictionApi for FakeLuis {
    async fn get_slot_prediction(
        &self,
        _app_id: Uuid,
        slot_name: &str,
        request: &PredictionRequest,
    ) -> Result<PredictionResponse> {
        self.record(Call::Predict {
            slot: slot_name.to_string(),
            query: request.query.clone(),
        })?;
        Ok(serde_json::from_value(serde_json::json!({
            "query": request.query,
            "prediction": {
                "topIntent": "OrderPizzaIntent",
                "intents": {"OrderPizzaIntent": {"score": 0.97}},
                "entities": {"Pizza order": [{"Pizza": [{"Quantity": [2]}]}]}
            }
        }))?)
    }
}
