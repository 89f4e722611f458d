use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::DynamicImage;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sketch_canvas::BinaryMask;
use std::future::Future;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum PredictorError {
    #[error("predictor request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("predictor returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("predictor image could not be encoded or decoded: {0}")]
    Image(#[from] image::ImageError),

    #[error("predictor image is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Mask-conditioned floor plan image generator
pub trait Predictor {
    /// `None` means the model produced nothing for this input
    fn predict(
        &self,
        mask: &BinaryMask,
        text: &str,
        repredict: bool,
    ) -> impl Future<Output = Result<Option<DynamicImage>, PredictorError>> + Send;
}

#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    mask: String,
    text: &'a str,
    repredict: bool,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    image: Option<String>,
}

/// Calls a diffusion service over HTTP with base64 PNG payloads
#[derive(Debug, Clone)]
pub struct HttpPredictor {
    client: Client,
    endpoint: String,
}

impl HttpPredictor {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn decode_image(encoded: &str) -> Result<DynamicImage, PredictorError> {
    // Accept data URLs as well as bare base64
    let payload = encoded.split_once(',').map_or(encoded, |(_, data)| data);
    let bytes = STANDARD.decode(payload.trim())?;
    Ok(image::load_from_memory(&bytes)?)
}

impl Predictor for HttpPredictor {
    async fn predict(
        &self,
        mask: &BinaryMask,
        text: &str,
        repredict: bool,
    ) -> Result<Option<DynamicImage>, PredictorError> {
        let body = PredictRequest {
            mask: STANDARD.encode(mask.to_png_bytes()?),
            text,
            repredict,
        };

        info!("Requesting prediction from {} (repredict: {})", self.endpoint, repredict);
        let response = self.client.post(&self.endpoint).json(&body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            warn!("Predictor error: {} - {}", status, error_text);
            return Err(PredictorError::Status {
                status: status.as_u16(),
                body: error_text,
            });
        }

        let payload: PredictResponse = response.json().await?;
        match payload.image.filter(|s| !s.trim().is_empty()) {
            Some(encoded) => Ok(Some(decode_image(&encoded)?)),
            None => {
                warn!("Predictor returned no image");
                Ok(None)
            }
        }
    }
}
