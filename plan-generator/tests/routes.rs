use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use image::DynamicImage;
use plan_generator::{create_app, ArtifactStore, GenerationController, Predictor, PredictorError};
use prompt_pipeline::{PromptPipeline, TextGenerator};
use serde_json::{json, Value};
use sketch_canvas::{BinaryMask, SketchCanvas};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

const PLAN: &str = r#"Here is the plan: {"rooms": [{"name": "Living", "type": "LivingRoom", "link": [], "location": "center", "size": "L"}]}"#;

struct CannedGenerator;

impl TextGenerator for CannedGenerator {
    async fn call(&self, _prompt: &str, _model: &str) -> prompt_pipeline::Result<String> {
        Ok(PLAN.to_string())
    }
}

#[derive(Clone, Default)]
struct RecordingPredictor {
    empty: bool,
    repredicts: Arc<Mutex<Vec<bool>>>,
}

impl Predictor for RecordingPredictor {
    async fn predict(
        &self,
        _mask: &BinaryMask,
        _text: &str,
        repredict: bool,
    ) -> Result<Option<DynamicImage>, PredictorError> {
        self.repredicts.lock().unwrap().push(repredict);
        Ok((!self.empty).then(|| DynamicImage::new_rgb8(128, 128)))
    }
}

fn app(name: &str, predictor: RecordingPredictor) -> Router {
    let dir = std::env::temp_dir().join(format!("plan-generator-routes-{}-{}", std::process::id(), name));
    let _ = std::fs::remove_dir_all(&dir);
    let controller = GenerationController::new(
        SketchCanvas::new(800, 600),
        PromptPipeline::new(CannedGenerator, "test-model"),
        predictor,
        ArtifactStore::new(dir).unwrap(),
    );
    create_app(controller)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn draw_square(app: &Router) {
    let (_, toggled) = send(app, "POST", "/draw/toggle", None).await;
    assert_eq!(toggled["drawing"], true);
    for (x, y) in [(250.0, 150.0), (550.0, 150.0), (550.0, 450.0), (250.0, 450.0)] {
        let (status, _) = send(app, "POST", "/pointer/click", Some(json!({"x": x, "y": y}))).await;
        assert_eq!(status, StatusCode::OK);
    }
}

#[tokio::test]
async fn test_health() {
    let app = app("health", RecordingPredictor::default());
    let (status, body) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_regenerate_before_generate_conflicts() {
    let predictor = RecordingPredictor::default();
    let app = app("conflict", predictor.clone());

    let (status, body) = send(&app, "POST", "/regenerate", None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "NO_CONTEXT");
    assert!(predictor.repredicts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_generate_without_sketch() {
    let predictor = RecordingPredictor::default();
    let app = app("nothing", predictor.clone());

    send(&app, "PUT", "/text", Some(json!({"text": "one living room"}))).await;
    let (status, body) = send(&app, "POST", "/generate", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "nothing_to_generate"}));
    assert!(predictor.repredicts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_click_outside_region_ignored() {
    let app = app("ignored", RecordingPredictor::default());
    let (_, body) = send(&app, "POST", "/pointer/click", Some(json!({"x": 300.0, "y": 200.0}))).await;
    assert_eq!(body["kind"], "ignored");

    send(&app, "POST", "/draw/toggle", None).await;
    let (_, body) = send(&app, "POST", "/pointer/click", Some(json!({"x": 10.0, "y": 10.0}))).await;
    assert_eq!(body["kind"], "ignored");

    let (_, body) = send(&app, "POST", "/pointer/click", Some(json!({"x": 300.0, "y": 200.0}))).await;
    assert_eq!(body["kind"], "anchored");
}

#[tokio::test]
async fn test_generate_and_regenerate_flow() {
    let predictor = RecordingPredictor::default();
    let app = app("flow", predictor.clone());

    draw_square(&app).await;
    let (_, state) = send(&app, "GET", "/state", None).await;
    assert_eq!(state["phase"], "sketching");
    assert_eq!(state["segments"].as_array().unwrap().len(), 3);
    assert_eq!(state["segments"][0]["label"]["text"], "15.00 m");

    let (_, state) = send(&app, "PUT", "/text", Some(json!({"text": "one big living room"}))).await;
    assert_eq!(state["phase"], "ready");

    let (status, body) = send(&app, "POST", "/generate", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "generated");
    assert_eq!(body["result"]["width"], 128);

    let (_, state) = send(&app, "GET", "/state", None).await;
    assert_eq!(state["phase"], "generated");
    assert_eq!(state["drawing"], false);

    let (status, body) = send(&app, "POST", "/regenerate", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"]["repredict"], true);
    assert_eq!(*predictor.repredicts.lock().unwrap(), vec![false, true]);

    let (_, state) = send(&app, "POST", "/clear", None).await;
    assert_eq!(state["phase"], "idle");
}

#[tokio::test]
async fn test_empty_prediction_is_bad_gateway() {
    let predictor = RecordingPredictor {
        empty: true,
        ..Default::default()
    };
    let app = app("empty", predictor);

    draw_square(&app).await;
    let (status, body) = send(&app, "POST", "/generate", None).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "EMPTY_PREDICTION");
}

#[tokio::test]
async fn test_undo_scale_and_resize() {
    let app = app("edit", RecordingPredictor::default());
    draw_square(&app).await;

    let (_, state) = send(&app, "POST", "/undo", None).await;
    assert_eq!(state["segments"].as_array().unwrap().len(), 2);
    assert_eq!(state["anchor"], json!({"x": 550.0, "y": 450.0}));

    let (_, state) = send(&app, "PUT", "/scale", Some(json!({"pixels_per_meter": 30.0}))).await;
    assert_eq!(state["segments"][0]["label"]["text"], "10.00 m");

    let (_, state) = send(&app, "POST", "/resize", Some(json!({"width": 1000, "height": 800}))).await;
    assert_eq!(state["region"]["left"], 300.0);
    assert_eq!(state["region"]["top"], 200.0);
    assert_eq!(state["segments"][0]["start"], json!({"x": 350.0, "y": 250.0}));
}

#[tokio::test]
async fn test_canvas_png() {
    let app = app("png", RecordingPredictor::default());
    let response = app
        .oneshot(Request::builder().uri("/canvas.png").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let frame = image::load_from_memory(&bytes).unwrap();
    assert_eq!((frame.width(), frame.height()), (800, 600));
}

#[tokio::test]
async fn test_save_writes_drawing() {
    let app = app("save", RecordingPredictor::default());
    draw_square(&app).await;

    let (status, body) = send(&app, "POST", "/save", None).await;
    assert_eq!(status, StatusCode::OK);
    let path = body["path"].as_str().unwrap();
    assert!(path.ends_with("drawing.png"));
    assert!(std::path::Path::new(path).exists());
}
