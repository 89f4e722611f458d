//! Turns free-text floor plan descriptions into a structured room graph by
//! prompting a hosted language model and recovering JSON from its reply.

use thiserror::Error;

pub mod client;
pub mod config;
pub mod json;
pub mod pipeline;
pub mod prompts;
pub mod schema;

pub use client::{LlmClient, TextGenerator};
pub use config::{LlmConfig, Provider};
pub use json::{clean_and_fix_json, extract_json_from_text};
pub use pipeline::PromptPipeline;
pub use schema::{LocationType, Room, RoomGraph, RoomSummary, RoomType, SizeType};

/// Errors surfaced by configuration loading, the LLM call or response parsing
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("LLM request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("LLM API error: {status} - {body}")]
    Api { status: u16, body: String },

    #[error("No response content from LLM")]
    EmptyResponse,

    #[error("No balanced JSON object found in LLM response")]
    NoJsonObject,

    #[error("Failed to parse floor plan JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid floor plan: {0}")]
    Schema(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
