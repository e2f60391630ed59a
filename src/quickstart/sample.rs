//! The Contoso Pizza Company sample app.
//!
//! Every payload the quickstart submits is built here from `SampleApp`, so the
//! orchestrator only sequences calls.

use serde::{Deserialize, Serialize};

use crate::luis::types::*;

pub const APP_NAME: &str = "Contoso Pizza Company";
pub const VERSION_ID: &str = "0.1";
pub const CULTURE: &str = "en-us";
pub const INTENT_NAME: &str = "OrderPizzaIntent";
pub const PREBUILT_NUMBER: &str = "number";
pub const ML_ENTITY_NAME: &str = "Pizza order";
pub const PHRASE_LIST_NAME: &str = "QuantityPhraselist";
pub const PHRASE_LIST_PHRASES: &str = "few,more,extra";
pub const EXAMPLE_UTTERANCE: &str = "I want two small seafood pizzas with extra cheese.";
pub const PREDICTION_QUERY: &str = "I want two small pepperoni pizzas with more salsa";
pub const PRODUCTION_SLOT: &str = "Production";

/// Sub-entity paths whose ids are recovered after the tree is created.
pub const PIZZA_QUANTITY_PATH: (&str, &str) = ("Pizza", "Quantity");
pub const TOPPINGS_QUANTITY_PATH: (&str, &str) = ("Toppings", "Quantity");

/// The parts of the sample a caller may override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleApp {
    pub app_name: String,
    pub version_id: String,
    pub culture: String,
    pub query: String,
    pub slot_name: String,
}

impl Default for SampleApp {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            version_id: VERSION_ID.to_string(),
            culture: CULTURE.to_string(),
            query: PREDICTION_QUERY.to_string(),
            slot_name: PRODUCTION_SLOT.to_string(),
        }
    }
}

impl SampleApp {
    pub fn create_app(&self) -> ApplicationCreateObject {
        ApplicationCreateObject {
            name: self.app_name.clone(),
            culture: self.culture.clone(),
            initial_version_id: self.version_id.clone(),
            description: None,
        }
    }

    pub fn intent(&self) -> ModelCreateObject {
        ModelCreateObject {
            name: INTENT_NAME.to_string(),
        }
    }

    pub fn prebuilt_entities(&self) -> Vec<String> {
        vec![PREBUILT_NUMBER.to_string()]
    }

    pub fn ml_entity(&self) -> EntityNode {
        ml_entity_definition()
    }

    pub fn phrase_list(&self) -> PhraselistCreateObject {
        PhraselistCreateObject {
            name: PHRASE_LIST_NAME.to_string(),
            phrases: PHRASE_LIST_PHRASES.to_string(),
            is_exchangeable: true,
            enabled_for_all_models: false,
        }
    }

    pub fn labeled_example(&self) -> ExampleLabelObject {
        labeled_example()
    }

    /// Publishing targets production unless the slot is named "Staging".
    pub fn publish(&self) -> ApplicationPublishObject {
        ApplicationPublishObject {
            version_id: self.version_id.clone(),
            is_staging: self.slot_name.eq_ignore_ascii_case("staging"),
        }
    }

    pub fn prediction_request(&self) -> PredictionRequest {
        PredictionRequest {
            query: self.query.clone(),
        }
    }
}

/// Pizza order → {Pizza → {Quantity, Type, Size}, Toppings → {Type, Quantity}}
pub fn ml_entity_definition() -> EntityNode {
    EntityNode::branch(
        ML_ENTITY_NAME,
        vec![
            EntityNode::branch(
                "Pizza",
                vec![
                    EntityNode::leaf("Quantity"),
                    EntityNode::leaf("Type"),
                    EntityNode::leaf("Size"),
                ],
            ),
            EntityNode::branch(
                "Toppings",
                vec![EntityNode::leaf("Type"), EntityNode::leaf("Quantity")],
            ),
        ],
    )
}

/// "I want two small seafood pizzas with extra cheese." labeled against the
/// entity tree. Offsets are inclusive character indexes.
pub fn labeled_example() -> ExampleLabelObject {
    ExampleLabelObject {
        text: EXAMPLE_UTTERANCE.to_string(),
        intent_name: INTENT_NAME.to_string(),
        entity_labels: vec![EntityLabelObject::new(ML_ENTITY_NAME, 7, 48).with_children(vec![
            EntityLabelObject::new("Pizza", 7, 30).with_children(vec![
                EntityLabelObject::new("Quantity", 7, 9),
                EntityLabelObject::new("Size", 11, 15),
                EntityLabelObject::new("Type", 17, 23),
            ]),
            EntityLabelObject::new("Toppings", 37, 48).with_children(vec![
                EntityLabelObject::new("Quantity", 37, 41),
                EntityLabelObject::new("Type", 43, 48),
            ]),
        ])],
    }
}
