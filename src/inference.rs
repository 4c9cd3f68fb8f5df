// Vision inference
//
// Builds a single user-turn prompt from the best-effort scene context plus
// the captured image, and requests a completion from an OpenAI-compatible
// chat endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::InferenceConfig;
use crate::error::{Result, VantageError};
use crate::pipeline::SceneContext;

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: Vec<ContentPart>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageRef },
}

#[derive(Debug, Serialize)]
struct ImageRef {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Assemble the user-turn instruction from whatever context survived. A
/// place description supersedes the raw coordinates; with no location at all
/// the placeholder keeps the prompt well-formed.
pub fn build_scene_prompt(context: &SceneContext) -> String {
    let mut prompt = String::from(
        "You are a knowledgeable local guide. Describe the surroundings shown in \
         this photo for a visitor standing there, in a few short paragraphs.",
    );

    match (&context.place, &context.location) {
        (Some(place), _) => {
            prompt.push_str(&format!("\nLocation: {}", place));
        }
        (None, Some(resolved)) => {
            prompt.push_str(&format!(
                "\nLocation: {:.5}, {:.5}",
                resolved.coordinate.latitude, resolved.coordinate.longitude
            ));
        }
        (None, None) => {
            prompt.push_str("\nLocation: Unknown coordinates");
        }
    }

    if let Some(landmark) = &context.landmark {
        prompt.push_str(&format!("\nNearby landmark: {}", landmark));
    }

    prompt
}

/// Seam to the vision model.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SceneDescriber: Send + Sync {
    async fn describe(&self, prompt: &str, image_b64: &str) -> Result<String>;
}

pub struct OpenRouterDescriber {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    max_tokens: u32,
}

impl OpenRouterDescriber {
    pub fn new(config: &InferenceConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .expect("HTTP client creation should not fail");

        Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        }
    }
}

#[async_trait]
impl SceneDescriber for OpenRouterDescriber {
    async fn describe(&self, prompt: &str, image_b64: &str) -> Result<String> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: vec![
                    ContentPart::Text {
                        text: prompt.to_string(),
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageRef {
                            url: format!("data:image/jpeg;base64,{}", image_b64),
                        },
                    },
                ],
            }],
            max_tokens: self.max_tokens,
        };

        let url = format!("{}/chat/completions", self.endpoint);
        debug!("Sending scene description request to {}", url);

        let mut builder = self.client.post(&url).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| VantageError::Inference(format!("Completion request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(VantageError::Inference(format!(
                "Completion API error {}: {}",
                status, error_text
            )));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| VantageError::Inference(format!("Failed to parse completion response: {}", e)))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| VantageError::Inference("Empty completion received".to_string()))
    }
}
