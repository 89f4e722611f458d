// Example: turn a free-text floor plan description into a room graph
use anyhow::Context;
use prompt_pipeline::{LlmClient, LlmConfig, PromptPipeline};
use std::path::Path;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().collect();
    let config_path = args.get(1).map(|s| s.as_str()).unwrap_or("api_info.json");
    let description = args.get(2).map(|s| s.as_str()).unwrap_or(
        "A bright living room in the center connects to a small kitchen in the north \
         and a master bedroom in the southeast. A bathroom sits next to the master bedroom.",
    );

    println!("Loading LLM configuration: {}", config_path);
    let config = LlmConfig::from_file(Path::new(config_path))
        .with_context(|| format!("Failed to load {}", config_path))?;
    let model = config.model.clone();
    let pipeline = PromptPipeline::new(LlmClient::new(config)?, model);

    println!("Extracting rooms with {}...\n", pipeline.model());
    let graph = pipeline.extract(description).await?;

    println!("{}", "=".repeat(70));
    for room in graph.summary() {
        println!(
            "{:<16} {:<12} {:<10} {:<4} -> {}",
            room.name, room.room_type, room.location, room.size, room.link
        );
    }
    println!("{}", "=".repeat(70));
    println!("\n{}", graph.to_json()?);

    Ok(())
}
