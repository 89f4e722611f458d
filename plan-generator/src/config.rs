//! Application configuration loaded from a JSON file.

use anyhow::{Context, Result};
use prompt_pipeline::LlmConfig;
use serde::{Deserialize, Serialize};
use sketch_canvas::{DEFAULT_PIXELS_PER_METER, DRAW_REGION_SIZE, MASK_RESOLUTION};
use std::path::{Path, PathBuf};
use tracing::info;

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "FLOORPLAN_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "floorplan.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Text-generation service, in the `api_info.json` layout
    #[serde(default)]
    pub llm: LlmConfig,
    pub predictor: PredictorConfig,
    #[serde(default = "default_artifacts_dir")]
    pub artifacts_dir: PathBuf,
    #[serde(default)]
    pub canvas: CanvasConfig,
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictorConfig {
    pub endpoint: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub width: u32,
    pub height: u32,
    /// Side of the square draw region in pixels
    pub draw_size: u32,
    pub mask_resolution: u32,
    /// Pixels per meter used for length labels
    pub scale: f64,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            draw_size: DRAW_REGION_SIZE,
            mask_resolution: MASK_RESOLUTION,
            scale: DEFAULT_PIXELS_PER_METER,
        }
    }
}

fn default_artifacts_dir() -> PathBuf {
    PathBuf::from("artifacts")
}

fn default_listen_addr() -> String {
    "0.0.0.0:3000".to_string()
}

impl AppConfig {
    /// Load from `FLOORPLAN_CONFIG`, or `floorplan.json` in the working directory
    pub fn from_env() -> Result<Self> {
        let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load(Path::new(&path))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_json(&raw)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        info!(
            "Loaded config from {} (llm: {}/{}, predictor: {})",
            path.display(),
            config.llm.provider,
            config.llm.model,
            config.predictor.endpoint
        );
        Ok(config)
    }

    /// Parse, apply the `LLM_API_KEY` fallback and validate
    pub fn from_json(raw: &str) -> Result<Self> {
        let mut config: AppConfig = serde_json::from_str(raw).context("Failed to parse config JSON")?;
        config.llm = config.llm.with_env_key();
        config.llm.validate()?;

        if config.predictor.endpoint.trim().is_empty() {
            anyhow::bail!("predictor.endpoint must not be empty");
        }
        if config.canvas.draw_size == 0 || config.canvas.mask_resolution == 0 {
            anyhow::bail!("canvas.draw_size and canvas.mask_resolution must be positive");
        }
        Ok(config)
    }
}
