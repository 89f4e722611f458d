use tracing::{debug, info};

use crate::client::TextGenerator;
use crate::json::{clean_and_fix_json, extract_json_from_text};
use crate::prompts::{extract_prompt, update_prompt};
use crate::schema::RoomGraph;
use crate::Result;

/// Prompts a text generator and turns its reply into a validated [`RoomGraph`]
#[derive(Debug, Clone)]
pub struct PromptPipeline<G> {
    generator: G,
    model: String,
}

impl<G: TextGenerator> PromptPipeline<G> {
    pub fn new(generator: G, model: impl Into<String>) -> Self {
        Self {
            generator,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Build a room graph from scratch
    pub async fn extract(&self, text: &str) -> Result<RoomGraph> {
        info!("Extracting floor plan from {} chars of text", text.len());
        self.run(&extract_prompt(text)).await
    }

    /// Revise an existing room graph with an additional description.
    /// Merging is left to the model, which is told to keep untouched details.
    pub async fn update(&self, existing: &RoomGraph, text: &str) -> Result<RoomGraph> {
        info!("Updating floor plan of {} rooms", existing.len());
        let floor_plan = existing.to_json()?;
        self.run(&update_prompt(&floor_plan, text)).await
    }

    async fn run(&self, prompt: &str) -> Result<RoomGraph> {
        let reply = self.generator.call(prompt, &self.model).await?;
        let json_text = clean_and_fix_json(extract_json_from_text(&reply)?);
        debug!("Recovered floor plan JSON: {}", json_text);

        let graph = RoomGraph::from_json(&json_text)?;
        info!("Parsed floor plan with {} rooms", graph.len());
        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SizeType;
    use crate::PipelineError;
    use std::sync::Mutex;

    /// Replays canned replies and records every prompt it receives
    struct ScriptedGenerator {
        replies: Mutex<Vec<String>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedGenerator {
        fn new(replies: &[&str]) -> Self {
            Self {
                replies: Mutex::new(replies.iter().rev().map(|r| r.to_string()).collect()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    impl TextGenerator for ScriptedGenerator {
        async fn call(&self, prompt: &str, _model: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.replies
                .lock()
                .unwrap()
                .pop()
                .ok_or(PipelineError::EmptyResponse)
        }
    }

    #[tokio::test]
    async fn test_extract_parses_noisy_reply() {
        let reply = "Here is the JSON:\n```json\n{\"rooms\": [\n  {\"name\": \"Living\", \"type\": \"LivingRoom\", \"link\": [], \"location\": \"center\", \"size\": \"L\"}, // main\n]}\n```";
        let pipeline = PromptPipeline::new(ScriptedGenerator::new(&[reply]), "llama3");

        let graph = pipeline.extract("a big living room").await.unwrap();
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.rooms[0].size, Some(SizeType::Large));
        assert!(pipeline.generator().prompts()[0].contains("text: a big living room"));
    }

    #[tokio::test]
    async fn test_update_sends_existing_plan() {
        let first = r#"{"rooms": [{"name": "A", "size": "L", "link": ["B"]}, {"name": "B", "size": "M", "link": ["A"]}]}"#;
        let second = r#"{"rooms": [{"name": "A", "size": "XL", "link": ["B"]}, {"name": "B", "size": "M", "link": ["A"]}]}"#;
        let pipeline = PromptPipeline::new(ScriptedGenerator::new(&[first, second]), "llama3");

        let mid = pipeline.extract("two rooms A and B").await.unwrap();
        let updated = pipeline.update(&mid, "make A extra large").await.unwrap();

        assert_eq!(updated.find_room("A").unwrap().size, Some(SizeType::ExtraLarge));
        assert_eq!(updated.find_room("B").unwrap().size, Some(SizeType::Medium));

        let prompts = pipeline.generator().prompts();
        assert!(prompts[1].contains(&mid.to_json().unwrap()));
        assert!(prompts[1].contains("make A extra large"));
    }

    #[tokio::test]
    async fn test_reply_without_json_fails() {
        let pipeline = PromptPipeline::new(ScriptedGenerator::new(&["I cannot help with that."]), "llama3");
        let err = pipeline.extract("three bedrooms").await.unwrap_err();
        assert!(matches!(err, PipelineError::NoJsonObject));
    }

    #[tokio::test]
    async fn test_schema_violation_fails() {
        let reply = r#"{"rooms": [{"name": "A", "type": "Garage"}]}"#;
        let pipeline = PromptPipeline::new(ScriptedGenerator::new(&[reply]), "llama3");
        let err = pipeline.extract("a garage").await.unwrap_err();
        assert!(matches!(err, PipelineError::Json(_)));
    }
}
