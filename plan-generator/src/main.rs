use anyhow::Context;
use plan_generator::{create_app, AppConfig, ArtifactStore, GenerationController, HttpPredictor};
use prompt_pipeline::{LlmClient, PromptPipeline};
use sketch_canvas::SketchCanvas;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting floor plan generator");

    let config = AppConfig::from_env()?;

    let mut canvas = SketchCanvas::with_geometry(
        config.canvas.width,
        config.canvas.height,
        config.canvas.draw_size,
        config.canvas.mask_resolution,
    );
    canvas.set_scale(config.canvas.scale);

    let model = config.llm.model.clone();
    let client = LlmClient::new(config.llm.clone()).context("Failed to create LLM client")?;
    let pipeline = PromptPipeline::new(client, model);
    let predictor = HttpPredictor::new(config.predictor.endpoint.clone());
    let artifacts = ArtifactStore::new(config.artifacts_dir.clone())
        .with_context(|| format!("Failed to create artifacts dir {}", config.artifacts_dir.display()))?;

    let controller = GenerationController::new(canvas, pipeline, predictor, artifacts);
    let app = create_app(controller);

    info!("Server listening on {}", config.listen_addr);
    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
