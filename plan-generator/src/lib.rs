//! Sketch-to-floor-plan generation service.
//!
//! Ties the sketch canvas and the prompt pipeline to a diffusion predictor,
//! persists the inputs of every generation and exposes the whole interaction
//! over HTTP.

pub mod artifacts;
pub mod config;
pub mod controller;
pub mod predictor;
pub mod routes;

pub use artifacts::{ArtifactError, ArtifactStore};
pub use config::{AppConfig, CanvasConfig, PredictorConfig};
pub use controller::{GenerateError, GenerationController, GenerationResult, Outcome, Phase, ResultInfo, Snapshot};
pub use predictor::{HttpPredictor, Predictor, PredictorError};
pub use routes::{create_app, ErrorResponse};
