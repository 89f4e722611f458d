use axum::{
    extract::{Json, State},
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use prompt_pipeline::TextGenerator;
use serde::{Deserialize, Serialize};
use sketch_canvas::{ClickOutcome, Preview};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::controller::{GenerateError, GenerationController, Outcome, Snapshot};
use crate::predictor::Predictor;

const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:8080,http://127.0.0.1:8080,http://localhost:3000,http://127.0.0.1:3000";

/// The one controller, locked for the whole request so user actions run one at a time
pub struct AppState<G, P> {
    controller: Arc<Mutex<GenerationController<G, P>>>,
}

impl<G, P> Clone for AppState<G, P> {
    fn clone(&self) -> Self {
        Self {
            controller: Arc::clone(&self.controller),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl IntoResponse for GenerateError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            GenerateError::NoContext => (StatusCode::CONFLICT, "NO_CONTEXT"),
            GenerateError::EmptyPrediction => (StatusCode::BAD_GATEWAY, "EMPTY_PREDICTION"),
            GenerateError::Pipeline(_) => (StatusCode::BAD_GATEWAY, "PIPELINE_ERROR"),
            GenerateError::Predictor(_) => (StatusCode::BAD_GATEWAY, "PREDICTOR_ERROR"),
            GenerateError::Artifact(_) => (StatusCode::INTERNAL_SERVER_ERROR, "ARTIFACT_ERROR"),
        };
        warn!("Request failed with {}: {}", code, self);

        let body = ErrorResponse {
            error: code.to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct PointerRequest {
    x: f64,
    y: f64,
}

#[derive(Debug, Deserialize)]
struct ScaleRequest {
    pixels_per_meter: f64,
}

#[derive(Debug, Deserialize)]
struct TextRequest {
    text: String,
}

#[derive(Debug, Deserialize)]
struct ResizeRequest {
    width: u32,
    height: u32,
}

#[derive(Debug, Serialize)]
struct DrawModeResponse {
    drawing: bool,
}

#[derive(Debug, Serialize)]
struct SaveResponse {
    path: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn state_handler<G, P>(State(state): State<AppState<G, P>>) -> Json<Snapshot>
where
    G: TextGenerator + Send + Sync + 'static,
    P: Predictor + Send + Sync + 'static,
{
    Json(state.controller.lock().await.snapshot())
}

async fn canvas_png_handler<G, P>(State(state): State<AppState<G, P>>) -> Result<Response, GenerateError>
where
    G: TextGenerator + Send + Sync + 'static,
    P: Predictor + Send + Sync + 'static,
{
    let png = state.controller.lock().await.render_png()?;
    Ok(([(header::CONTENT_TYPE, "image/png")], png).into_response())
}

async fn toggle_draw_handler<G, P>(State(state): State<AppState<G, P>>) -> Json<DrawModeResponse>
where
    G: TextGenerator + Send + Sync + 'static,
    P: Predictor + Send + Sync + 'static,
{
    let drawing = state.controller.lock().await.canvas_mut().toggle_draw_mode();
    info!("Draw mode {}", if drawing { "on" } else { "off" });
    Json(DrawModeResponse { drawing })
}

async fn exit_draw_handler<G, P>(State(state): State<AppState<G, P>>) -> Json<DrawModeResponse>
where
    G: TextGenerator + Send + Sync + 'static,
    P: Predictor + Send + Sync + 'static,
{
    state.controller.lock().await.canvas_mut().exit_draw_mode();
    Json(DrawModeResponse { drawing: false })
}

async fn click_handler<G, P>(
    State(state): State<AppState<G, P>>,
    Json(request): Json<PointerRequest>,
) -> Json<ClickOutcome>
where
    G: TextGenerator + Send + Sync + 'static,
    P: Predictor + Send + Sync + 'static,
{
    Json(state.controller.lock().await.canvas_mut().click(request.x, request.y))
}

async fn move_handler<G, P>(
    State(state): State<AppState<G, P>>,
    Json(request): Json<PointerRequest>,
) -> Json<Option<Preview>>
where
    G: TextGenerator + Send + Sync + 'static,
    P: Predictor + Send + Sync + 'static,
{
    Json(state.controller.lock().await.canvas().pointer_move(request.x, request.y))
}

async fn undo_handler<G, P>(State(state): State<AppState<G, P>>) -> Json<Snapshot>
where
    G: TextGenerator + Send + Sync + 'static,
    P: Predictor + Send + Sync + 'static,
{
    let mut controller = state.controller.lock().await;
    controller.canvas_mut().undo();
    Json(controller.snapshot())
}

async fn clear_handler<G, P>(State(state): State<AppState<G, P>>) -> Json<Snapshot>
where
    G: TextGenerator + Send + Sync + 'static,
    P: Predictor + Send + Sync + 'static,
{
    let mut controller = state.controller.lock().await;
    controller.clear();
    info!("Cleared sketch, text and results");
    Json(controller.snapshot())
}

async fn generate_handler<G, P>(State(state): State<AppState<G, P>>) -> Result<Json<Outcome>, GenerateError>
where
    G: TextGenerator + Send + Sync + 'static,
    P: Predictor + Send + Sync + 'static,
{
    info!("Generate requested");
    let outcome = state.controller.lock().await.generate().await?;
    Ok(Json(outcome))
}

async fn regenerate_handler<G, P>(State(state): State<AppState<G, P>>) -> Result<Json<Outcome>, GenerateError>
where
    G: TextGenerator + Send + Sync + 'static,
    P: Predictor + Send + Sync + 'static,
{
    info!("Regenerate requested");
    let outcome = state.controller.lock().await.regenerate().await?;
    Ok(Json(outcome))
}

async fn save_handler<G, P>(State(state): State<AppState<G, P>>) -> Result<Json<SaveResponse>, GenerateError>
where
    G: TextGenerator + Send + Sync + 'static,
    P: Predictor + Send + Sync + 'static,
{
    let path = state.controller.lock().await.save()?;
    Ok(Json(SaveResponse {
        path: path.display().to_string(),
    }))
}

async fn scale_handler<G, P>(
    State(state): State<AppState<G, P>>,
    Json(request): Json<ScaleRequest>,
) -> Json<Snapshot>
where
    G: TextGenerator + Send + Sync + 'static,
    P: Predictor + Send + Sync + 'static,
{
    let mut controller = state.controller.lock().await;
    controller.canvas_mut().set_scale(request.pixels_per_meter);
    Json(controller.snapshot())
}

async fn text_handler<G, P>(
    State(state): State<AppState<G, P>>,
    Json(request): Json<TextRequest>,
) -> Json<Snapshot>
where
    G: TextGenerator + Send + Sync + 'static,
    P: Predictor + Send + Sync + 'static,
{
    let mut controller = state.controller.lock().await;
    controller.set_text(request.text);
    Json(controller.snapshot())
}

async fn resize_handler<G, P>(
    State(state): State<AppState<G, P>>,
    Json(request): Json<ResizeRequest>,
) -> Json<Snapshot>
where
    G: TextGenerator + Send + Sync + 'static,
    P: Predictor + Send + Sync + 'static,
{
    let mut controller = state.controller.lock().await;
    controller.canvas_mut().resize(request.width, request.height);
    Json(controller.snapshot())
}

fn cors_layer() -> CorsLayer {
    let allowed_origins =
        std::env::var("ALLOWED_ORIGINS").unwrap_or_else(|_| DEFAULT_ALLOWED_ORIGINS.to_string());

    let origins: Vec<_> = allowed_origins
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([header::CONTENT_TYPE]);

    if origins.is_empty() {
        cors.allow_origin(Any)
    } else {
        cors.allow_origin(origins)
    }
}

/// Build the router around a single generation controller
pub fn create_app<G, P>(controller: GenerationController<G, P>) -> Router
where
    G: TextGenerator + Send + Sync + 'static,
    P: Predictor + Send + Sync + 'static,
{
    let state = AppState {
        controller: Arc::new(Mutex::new(controller)),
    };

    Router::new()
        .route("/health", get(health_check))
        .route("/state", get(state_handler::<G, P>))
        .route("/canvas.png", get(canvas_png_handler::<G, P>))
        .route("/draw/toggle", post(toggle_draw_handler::<G, P>))
        .route("/draw/exit", post(exit_draw_handler::<G, P>))
        .route("/pointer/click", post(click_handler::<G, P>))
        .route("/pointer/move", post(move_handler::<G, P>))
        .route("/undo", post(undo_handler::<G, P>))
        .route("/clear", post(clear_handler::<G, P>))
        .route("/generate", post(generate_handler::<G, P>))
        .route("/regenerate", post(regenerate_handler::<G, P>))
        .route("/save", post(save_handler::<G, P>))
        .route("/scale", put(scale_handler::<G, P>))
        .route("/text", put(text_handler::<G, P>))
        .route("/resize", post(resize_handler::<G, P>))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
        .with_state(state)
}
