use chrono::{DateTime, Utc};
use image::{DynamicImage, ImageFormat};
use prompt_pipeline::{PipelineError, PromptPipeline, RoomGraph, TextGenerator};
use serde::Serialize;
use sketch_canvas::{render_canvas, render_strokes, BinaryMask, DrawRegion, LineSegment, Point, SketchCanvas};
use std::io::Cursor;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};

use crate::artifacts::{ArtifactError, ArtifactStore};
use crate::predictor::{Predictor, PredictorError};

/// Prompts shorter than this (after trimming) reuse the previous structured text
pub const MIN_PROMPT_LENGTH: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Nothing sketched, no result
    Idle,
    /// Strokes present, prompt still too short
    Sketching,
    /// Strokes and a usable prompt
    Ready,
    /// Showing a result, nothing new entered since
    Generated,
    /// Showing a result while the user sketches or types again
    Editing,
}

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("nothing has been generated yet")]
    NoContext,

    #[error("predictor returned no image")]
    EmptyPrediction,

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Predictor(#[from] PredictorError),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),
}

/// Image returned by the predictor and the inputs that produced it
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub image: DynamicImage,
    pub text: String,
    pub repredict: bool,
    pub created_at: DateTime<Utc>,
}

impl GenerationResult {
    pub fn info(&self) -> ResultInfo {
        ResultInfo {
            width: self.image.width(),
            height: self.image.height(),
            text: self.text.clone(),
            repredict: self.repredict,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultInfo {
    pub width: u32,
    pub height: u32,
    pub text: String,
    pub repredict: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Generated { result: ResultInfo },
    /// No strokes to rasterize; nothing was sent anywhere
    NothingToGenerate,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub phase: Phase,
    pub width: u32,
    pub height: u32,
    pub region: DrawRegion,
    pub segments: Vec<LineSegment>,
    pub anchor: Option<Point>,
    pub drawing: bool,
    pub pixels_per_meter: f64,
    pub text: String,
    pub history_len: usize,
    pub result: Option<ResultInfo>,
}

/// Owns the sketch, the prompt text and the generation history, and drives
/// the pipeline and predictor for generate/regenerate.
pub struct GenerationController<G, P> {
    canvas: SketchCanvas,
    pipeline: PromptPipeline<G>,
    predictor: P,
    artifacts: ArtifactStore,
    text: String,
    history: Vec<String>,
    mid: Option<RoomGraph>,
    last_mask: Option<BinaryMask>,
    result: Option<GenerationResult>,
}

impl<G: TextGenerator, P: Predictor> GenerationController<G, P> {
    pub fn new(canvas: SketchCanvas, pipeline: PromptPipeline<G>, predictor: P, artifacts: ArtifactStore) -> Self {
        Self {
            canvas,
            pipeline,
            predictor,
            artifacts,
            text: String::new(),
            history: Vec::new(),
            mid: None,
            last_mask: None,
            result: None,
        }
    }

    pub fn canvas(&self) -> &SketchCanvas {
        &self.canvas
    }

    /// Direct sketch edits; the phase follows from the resulting state
    pub fn canvas_mut(&mut self) -> &mut SketchCanvas {
        &mut self.canvas
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn result(&self) -> Option<&GenerationResult> {
        self.result.as_ref()
    }

    pub fn room_graph(&self) -> Option<&RoomGraph> {
        self.mid.as_ref()
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn predictor(&self) -> &P {
        &self.predictor
    }

    pub fn pipeline(&self) -> &PromptPipeline<G> {
        &self.pipeline
    }

    fn has_prompt(&self) -> bool {
        self.text.trim().chars().count() >= MIN_PROMPT_LENGTH
    }

    pub fn phase(&self) -> Phase {
        let sketching = !self.canvas.is_empty();
        match (&self.result, sketching) {
            (Some(_), _) if sketching || !self.text.trim().is_empty() => Phase::Editing,
            (Some(_), _) => Phase::Generated,
            (None, false) => Phase::Idle,
            (None, true) if self.has_prompt() => Phase::Ready,
            (None, true) => Phase::Sketching,
        }
    }

    /// Rasterize the sketch, structure the prompt and ask the predictor for a plan
    pub async fn generate(&mut self) -> Result<Outcome, GenerateError> {
        let Some(mask) = self.canvas.to_mask() else {
            warn!("Generate requested without a sketch; nothing to generate");
            return Ok(Outcome::NothingToGenerate);
        };
        self.artifacts.save_mask(&mask)?;

        let text = if self.has_prompt() {
            let graph = match (&self.mid, self.phase()) {
                (Some(mid), Phase::Generated | Phase::Editing) => self.pipeline.update(mid, &self.text).await?,
                _ => self.pipeline.extract(&self.text).await?,
            };
            self.store_graph(graph)?
        } else {
            info!("Prompt too short, reusing previous structured text");
            self.history.last().cloned().unwrap_or_default()
        };

        self.predict(mask, text, false).await
    }

    /// Sample again from the last context; a long enough prompt starts a fresh extraction
    pub async fn regenerate(&mut self) -> Result<Outcome, GenerateError> {
        if !matches!(self.phase(), Phase::Generated | Phase::Editing) {
            return Err(GenerateError::NoContext);
        }

        let mask = match self.canvas.to_mask() {
            Some(mask) => mask,
            None => self.last_mask.clone().ok_or(GenerateError::NoContext)?,
        };
        self.artifacts.save_mask(&mask)?;

        let text = if self.has_prompt() {
            self.history.clear();
            let graph = self.pipeline.extract(&self.text).await?;
            self.store_graph(graph)?
        } else {
            self.history.last().cloned().unwrap_or_default()
        };

        self.predict(mask, text, true).await
    }

    fn store_graph(&mut self, graph: RoomGraph) -> Result<String, GenerateError> {
        let json = graph.to_json()?;
        self.mid = Some(graph);
        Ok(json)
    }

    async fn predict(&mut self, mask: BinaryMask, text: String, repredict: bool) -> Result<Outcome, GenerateError> {
        self.artifacts.save_text(&text)?;
        self.history.push(text.clone());

        let image = self
            .predictor
            .predict(&mask, &text, repredict)
            .await?
            .ok_or(GenerateError::EmptyPrediction)?;

        let result = GenerationResult {
            image,
            text,
            repredict,
            created_at: Utc::now(),
        };
        let info = result.info();
        info!("Generated {}x{} plan (repredict: {})", info.width, info.height, repredict);

        self.result = Some(result);
        self.last_mask = Some(mask);
        self.canvas.clear();
        self.text.clear();
        Ok(Outcome::Generated { result: info })
    }

    /// Drop the sketch, text, history and result
    pub fn clear(&mut self) {
        self.canvas.clear();
        self.text.clear();
        self.history.clear();
        self.mid = None;
        self.last_mask = None;
        self.result = None;
    }

    /// Write the result, or the bare sketch when there is none, to `drawing.png`
    pub fn save(&self) -> Result<PathBuf, GenerateError> {
        let image = match &self.result {
            Some(result) => result.image.clone(),
            None => DynamicImage::ImageRgb8(render_strokes(&self.canvas)),
        };
        let path = self.artifacts.save_drawing(&image)?;
        info!("Saved drawing to {}", path.display());
        Ok(path)
    }

    pub fn render(&self) -> DynamicImage {
        DynamicImage::ImageRgb8(render_canvas(&self.canvas, self.result.as_ref().map(|r| &r.image)))
    }

    pub fn render_png(&self) -> Result<Vec<u8>, GenerateError> {
        let mut bytes = Vec::new();
        self.render()
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(ArtifactError::from)?;
        Ok(bytes)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase(),
            width: self.canvas.width(),
            height: self.canvas.height(),
            region: self.canvas.region(),
            segments: self.canvas.segments().to_vec(),
            anchor: self.canvas.anchor(),
            drawing: self.canvas.is_drawing(),
            pixels_per_meter: self.canvas.pixels_per_meter(),
            text: self.text.clone(),
            history_len: self.history.len(),
            result: self.result.as_ref().map(GenerationResult::info),
        }
    }
}
