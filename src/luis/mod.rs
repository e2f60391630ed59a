//! LUIS (Language Understanding) service integration
//!
//! This module provides:
//! - Payload types for the authoring and prediction APIs
//! - Client traits the orchestrator is written against
//! - reqwest clients implementing them

pub mod api;
pub mod client;
pub mod types;

pub use api::{AuthoringApi, PredictionApi};
pub use client::{AuthoringClient, RuntimeClient};
pub use types::*;
