use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use super::{TranslationProvider, TranslationRequest};
use crate::error::{Result, VantageError};

const DEFAULT_ENDPOINT: &str = "https://translation.googleapis.com/language/translate/v2";

#[derive(Debug, Deserialize)]
struct GoogleResponse {
    #[serde(default)]
    data: Option<GoogleData>,
}

#[derive(Debug, Deserialize)]
struct GoogleData {
    #[serde(default)]
    translations: Vec<GoogleTranslation>,
}

#[derive(Debug, Deserialize)]
struct GoogleTranslation {
    #[serde(rename = "translatedText")]
    #[serde(default)]
    translated_text: Option<String>,
}

/// Keyed primary provider. Only placed in the chain when a credential is
/// configured; its output arrives HTML-escaped and is decoded before return.
pub struct GoogleTranslate {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl GoogleTranslate {
    pub fn new(api_key: String) -> Self {
        Self::with_endpoint(api_key, DEFAULT_ENDPOINT.to_string())
    }

    pub fn with_endpoint(api_key: String, endpoint: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("HTTP client creation should not fail");

        Self {
            client,
            endpoint,
            api_key,
        }
    }
}

#[async_trait]
impl TranslationProvider for GoogleTranslate {
    fn name(&self) -> &str {
        "google-translate"
    }

    async fn attempt(&self, request: &TranslationRequest) -> Result<String> {
        let mut payload = json!({
            "q": request.text,
            "target": request.target,
        });
        if let Some(source) = &request.source {
            payload["source"] = json!(source);
        }

        debug!("Sending translation request to {}", self.endpoint);
        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(&payload)
            .send()
            .await
            .map_err(|e| VantageError::Translation(format!("Primary provider request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(VantageError::Translation(format!(
                "Primary provider returned {}",
                response.status()
            )));
        }

        let body: GoogleResponse = response
            .json()
            .await
            .map_err(|e| VantageError::Translation(format!("Failed to parse primary response: {}", e)))?;

        let translated = body
            .data
            .and_then(|data| data.translations.into_iter().next())
            .and_then(|translation| translation.translated_text)
            .filter(|text| !text.is_empty())
            .ok_or_else(|| {
                VantageError::Translation("Primary provider returned no translation".to_string())
            })?;

        Ok(decode_html_entities(&translated))
    }
}

/// Restore the literal characters this provider escapes in its output.
pub fn decode_html_entities(input: &str) -> String {
    input
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}
