//! Quickstart orchestration.
//!
//! `Quickstart::run()` walks `Step::ALL` in order, threading the ids each step
//! produces through a `RunState`. Any error ends the run immediately; nothing
//! created remotely is rolled back.

use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::info;
use uuid::Uuid;

use super::entity_tree::grandchild_id;
use super::sample::{
    SampleApp, PHRASE_LIST_NAME, PIZZA_QUANTITY_PATH, PREBUILT_NUMBER, TOPPINGS_QUANTITY_PATH,
};
use super::steps::Step;
use super::training::{wait_for_training, TrainingOutcome};
use crate::config::PollPolicy;
use crate::error::{QuickstartError, Result};
use crate::luis::api::{AuthoringApi, PredictionApi};
use crate::luis::types::{
    ModelFeatureInformation, OperationStatus, PredictionResponse, ProductionOrStagingEndpointInfo,
};

// ---------------------------------------------------------------------------
// RunState
// ---------------------------------------------------------------------------

/// Everything the steps of one run have produced so far.
#[derive(Debug, Clone, Default)]
pub struct RunState {
    pub app_id: Option<Uuid>,
    pub ml_entity_id: Option<Uuid>,
    pub phrase_list_id: Option<i64>,
    pub pizza_quantity_id: Option<Uuid>,
    pub toppings_quantity_id: Option<Uuid>,
    pub example_id: Option<i64>,
    pub training: Option<TrainingOutcome>,
    pub endpoint: Option<ProductionOrStagingEndpointInfo>,
    pub prediction: Option<PredictionResponse>,
    /// Steps completed, in the order they finished.
    pub completed: Vec<StepRecord>,
}

/// Timing of one completed step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    pub step: Step,
    pub elapsed_ms: u64,
}

fn require<T: Clone>(value: &Option<T>, step: Step, needs: &'static str) -> Result<T> {
    value
        .clone()
        .ok_or(QuickstartError::MissingPrerequisite { step, needs })
}

impl RunState {
    /// The last step that finished, if any.
    pub fn last_completed(&self) -> Option<Step> {
        self.completed.last().map(|r| r.step)
    }

    fn into_report(self, version_id: String) -> Result<QuickstartReport> {
        let step = Step::Predict;
        Ok(QuickstartReport {
            app_id: require(&self.app_id, step, "app id")?,
            version_id,
            ml_entity_id: require(&self.ml_entity_id, step, "entity id")?,
            phrase_list_id: require(&self.phrase_list_id, step, "phrase list id")?,
            pizza_quantity_id: require(&self.pizza_quantity_id, step, "Pizza/Quantity id")?,
            toppings_quantity_id: require(&self.toppings_quantity_id, step, "Toppings/Quantity id")?,
            example_id: require(&self.example_id, step, "example id")?,
            training_polls: require(&self.training, step, "training outcome")?.polls,
            endpoint: require(&self.endpoint, step, "publish endpoint")?,
            prediction: require(&self.prediction, step, "prediction")?,
            steps: self.completed,
        })
    }
}

// ---------------------------------------------------------------------------
// QuickstartReport
// ---------------------------------------------------------------------------

/// Result of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct QuickstartReport {
    pub app_id: Uuid,
    pub version_id: String,
    pub ml_entity_id: Uuid,
    pub phrase_list_id: i64,
    pub pizza_quantity_id: Uuid,
    pub toppings_quantity_id: Uuid,
    pub example_id: i64,
    pub training_polls: u32,
    pub endpoint: ProductionOrStagingEndpointInfo,
    pub prediction: PredictionResponse,
    pub steps: Vec<StepRecord>,
}

// ---------------------------------------------------------------------------
// Quickstart
// ---------------------------------------------------------------------------

pub struct Quickstart<'a> {
    authoring: &'a dyn AuthoringApi,
    prediction: &'a dyn PredictionApi,
    sample: SampleApp,
    poll: PollPolicy,
}

impl<'a> Quickstart<'a> {
    pub fn new(authoring: &'a dyn AuthoringApi, prediction: &'a dyn PredictionApi) -> Self {
        Self {
            authoring,
            prediction,
            sample: SampleApp::default(),
            poll: PollPolicy::default(),
        }
    }

    pub fn with_sample(mut self, sample: SampleApp) -> Self {
        self.sample = sample;
        self
    }

    pub fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    pub fn sample(&self) -> &SampleApp {
        &self.sample
    }

    /// Run every step in order.
    pub async fn run(&self) -> Result<QuickstartReport> {
        info!(app = %self.sample.app_name, version = %self.sample.version_id, "Starting quickstart");
        let mut state = RunState::default();
        for step in Step::ALL {
            self.execute(step, &mut state).await?;
        }
        state.into_report(self.sample.version_id.clone())
    }

    /// Run a single step against `state`.
    pub async fn execute(&self, step: Step, state: &mut RunState) -> Result<()> {
        info!(%step, "Starting step");
        let started = Instant::now();

        match step {
            Step::CreateApp => self.create_app(state).await?,
            Step::AddIntent => self.add_intent(state).await?,
            Step::AddPrebuiltEntity => self.add_prebuilt_entity(state).await?,
            Step::AddMlEntity => self.add_ml_entity(state).await?,
            Step::AddPhraseListFeature => self.add_phrase_list(state).await?,
            Step::ResolveSubEntityIds => self.resolve_sub_entity_ids(state).await?,
            Step::AttachFeatures => self.attach_features(state).await?,
            Step::AddLabeledExample => self.add_labeled_example(state).await?,
            Step::Train => self.train(state).await?,
            Step::PollTrainingStatus => self.poll_training_status(state).await?,
            Step::Publish => self.publish(state).await?,
            Step::Predict => self.predict(state).await?,
        }

        let elapsed_ms = started.elapsed().as_millis() as u64;
        info!(%step, elapsed_ms, "Step complete");
        state.completed.push(StepRecord { step, elapsed_ms });
        Ok(())
    }

    fn version(&self) -> &str {
        &self.sample.version_id
    }

    async fn create_app(&self, state: &mut RunState) -> Result<()> {
        let payload = self.sample.create_app();
        let app_id = self.authoring.add_app(&payload).await.map_err(|e| {
            QuickstartError::remote(
                Step::CreateApp,
                format!("create application '{}'", payload.name),
                e,
            )
        })?;
        info!(%app_id, name = %payload.name, "Created LUIS app");
        state.app_id = Some(app_id);
        Ok(())
    }

    async fn add_intent(&self, state: &mut RunState) -> Result<()> {
        let step = Step::AddIntent;
        let app_id = require(&state.app_id, step, "app id")?;
        let intent = self.sample.intent();
        let intent_id = self
            .authoring
            .add_intent(app_id, self.version(), &intent)
            .await
            .map_err(|e| {
                QuickstartError::remote(
                    step,
                    format!("add intent '{}' to app {} version {}", intent.name, app_id, self.version()),
                    e,
                )
            })?;
        info!(%intent_id, intent = %intent.name, "Added intent");
        Ok(())
    }

    async fn add_prebuilt_entity(&self, state: &mut RunState) -> Result<()> {
        let step = Step::AddPrebuiltEntity;
        let app_id = require(&state.app_id, step, "app id")?;
        let names = self.sample.prebuilt_entities();
        let added = self
            .authoring
            .add_prebuilt(app_id, self.version(), &names)
            .await
            .map_err(|e| {
                QuickstartError::remote(
                    step,
                    format!("add prebuilt entities {:?} to app {}", names, app_id),
                    e,
                )
            })?;
        info!(count = added.len(), "Added prebuilt entities");
        Ok(())
    }

    async fn add_ml_entity(&self, state: &mut RunState) -> Result<()> {
        let step = Step::AddMlEntity;
        let app_id = require(&state.app_id, step, "app id")?;
        let entity = self.sample.ml_entity();
        let entity_id = self
            .authoring
            .add_entity(app_id, self.version(), &entity)
            .await
            .map_err(|e| {
                QuickstartError::remote(
                    step,
                    format!("add entity '{}' to app {}", entity.name, app_id),
                    e,
                )
            })?;
        info!(%entity_id, entity = %entity.name, "Added machine-learned entity");
        state.ml_entity_id = Some(entity_id);
        Ok(())
    }

    async fn add_phrase_list(&self, state: &mut RunState) -> Result<()> {
        let step = Step::AddPhraseListFeature;
        let app_id = require(&state.app_id, step, "app id")?;
        let phrase_list = self.sample.phrase_list();
        let phrase_list_id = self
            .authoring
            .add_phrase_list(app_id, self.version(), &phrase_list)
            .await
            .map_err(|e| {
                QuickstartError::remote(
                    step,
                    format!("add phrase list '{}' to app {}", phrase_list.name, app_id),
                    e,
                )
            })?;
        info!(phrase_list_id, name = %phrase_list.name, "Added phrase list");
        state.phrase_list_id = Some(phrase_list_id);
        Ok(())
    }

    async fn resolve_sub_entity_ids(&self, state: &mut RunState) -> Result<()> {
        let step = Step::ResolveSubEntityIds;
        let app_id = require(&state.app_id, step, "app id")?;
        let entity_id = require(&state.ml_entity_id, step, "entity id")?;

        let tree = self
            .authoring
            .get_entity(app_id, self.version(), entity_id)
            .await
            .map_err(|e| {
                QuickstartError::remote(
                    step,
                    format!("get entity {} of app {}", entity_id, app_id),
                    e,
                )
            })?;

        let (child, grandchild) = TOPPINGS_QUANTITY_PATH;
        let toppings_quantity_id = grandchild_id(&tree, child, grandchild)?;
        let (child, grandchild) = PIZZA_QUANTITY_PATH;
        let pizza_quantity_id = grandchild_id(&tree, child, grandchild)?;

        info!(%pizza_quantity_id, %toppings_quantity_id, "Resolved sub-entity ids");
        state.pizza_quantity_id = Some(pizza_quantity_id);
        state.toppings_quantity_id = Some(toppings_quantity_id);
        Ok(())
    }

    /// The three feature associations are independent, so they are sent
    /// together; the step completes only when all three are acknowledged.
    async fn attach_features(&self, state: &mut RunState) -> Result<()> {
        let step = Step::AttachFeatures;
        let app_id = require(&state.app_id, step, "app id")?;
        let pizza_quantity_id = require(&state.pizza_quantity_id, step, "Pizza/Quantity id")?;
        let toppings_quantity_id =
            require(&state.toppings_quantity_id, step, "Toppings/Quantity id")?;

        tokio::try_join!(
            self.attach_feature(
                app_id,
                pizza_quantity_id,
                ModelFeatureInformation::model(PREBUILT_NUMBER, true),
            ),
            self.attach_feature(
                app_id,
                toppings_quantity_id,
                ModelFeatureInformation::model(PREBUILT_NUMBER, false),
            ),
            self.attach_feature(
                app_id,
                toppings_quantity_id,
                ModelFeatureInformation::feature(PHRASE_LIST_NAME),
            ),
        )?;
        Ok(())
    }

    async fn attach_feature(
        &self,
        app_id: Uuid,
        entity_id: Uuid,
        feature: ModelFeatureInformation,
    ) -> Result<OperationStatus> {
        let name = feature
            .model_name
            .as_deref()
            .or(feature.feature_name.as_deref())
            .unwrap_or_default()
            .to_string();
        let status = self
            .authoring
            .add_entity_feature(app_id, self.version(), entity_id, &feature)
            .await
            .map_err(|e| {
                QuickstartError::remote(
                    Step::AttachFeatures,
                    format!("add feature '{}' to entity {}", name, entity_id),
                    e,
                )
            })?;
        info!(%entity_id, feature = %name, required = feature.is_required.unwrap_or(false), "Attached feature");
        Ok(status)
    }

    async fn add_labeled_example(&self, state: &mut RunState) -> Result<()> {
        let step = Step::AddLabeledExample;
        let app_id = require(&state.app_id, step, "app id")?;
        let example = self.sample.labeled_example();
        // Nested children lets the two "Quantity" sub-entities be labeled by
        // position in the tree rather than by a globally unique name.
        let response = self
            .authoring
            .add_example(app_id, self.version(), &example, true)
            .await
            .map_err(|e| {
                QuickstartError::remote(
                    step,
                    format!("add labeled example '{}' to app {}", example.text, app_id),
                    e,
                )
            })?;
        info!(example_id = response.example_id, "Added labeled example");
        state.example_id = Some(response.example_id);
        Ok(())
    }

    async fn train(&self, state: &mut RunState) -> Result<()> {
        let step = Step::Train;
        let app_id = require(&state.app_id, step, "app id")?;
        let queued = self
            .authoring
            .train_version(app_id, self.version())
            .await
            .map_err(|e| {
                QuickstartError::remote(
                    step,
                    format!("train app {} version {}", app_id, self.version()),
                    e,
                )
            })?;
        info!(status = %queued.status, "Training queued");
        Ok(())
    }

    async fn poll_training_status(&self, state: &mut RunState) -> Result<()> {
        let app_id = require(&state.app_id, Step::PollTrainingStatus, "app id")?;
        let outcome = wait_for_training(self.authoring, app_id, self.version(), &self.poll).await?;
        state.training = Some(outcome);
        Ok(())
    }

    async fn publish(&self, state: &mut RunState) -> Result<()> {
        let step = Step::Publish;
        let app_id = require(&state.app_id, step, "app id")?;
        let publish = self.sample.publish();
        let endpoint = self.authoring.publish(app_id, &publish).await.map_err(|e| {
            QuickstartError::remote(
                step,
                format!(
                    "publish app {} version {} (staging: {})",
                    app_id, publish.version_id, publish.is_staging
                ),
                e,
            )
        })?;
        info!(
            endpoint = endpoint.endpoint_url.as_deref().unwrap_or("-"),
            staging = publish.is_staging,
            "Published"
        );
        state.endpoint = Some(endpoint);
        Ok(())
    }

    async fn predict(&self, state: &mut RunState) -> Result<()> {
        let step = Step::Predict;
        let app_id = require(&state.app_id, step, "app id")?;
        let request = self.sample.prediction_request();
        let slot = &self.sample.slot_name;
        let response = self
            .prediction
            .get_slot_prediction(app_id, slot, &request)
            .await
            .map_err(|e| {
                QuickstartError::remote(
                    step,
                    format!("predict '{}' against app {} slot {}", request.query, app_id, slot),
                    e,
                )
            })?;
        info!(top_intent = %response.prediction.top_intent, "Prediction received");
        state.prediction = Some(response);
        Ok(())
    }
}
