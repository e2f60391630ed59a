//! The quickstart pipeline
//!
//! This module provides:
//! - The ordered step state machine
//! - The Contoso Pizza sample payloads
//! - Name-path lookup of sub-entity ids
//! - Training-status polling with backoff and a deadline
//! - The orchestrator that runs everything in order

pub mod entity_tree;
pub mod orchestrator;
pub mod sample;
pub mod steps;
pub mod training;

pub use entity_tree::{grandchild_id, ResolutionError};
pub use orchestrator::{Quickstart, QuickstartReport, RunState, StepRecord};
pub use sample::SampleApp;
pub use steps::Step;
pub use training::{wait_for_training, ModelStatus, TrainingOutcome, TrainingState};
