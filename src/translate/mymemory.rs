use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::{TranslationProvider, TranslationRequest};
use crate::error::{Result, VantageError};

#[derive(Debug, Deserialize)]
struct MyMemoryResponse {
    #[serde(rename = "responseData")]
    #[serde(default)]
    response_data: Option<MyMemoryData>,
}

#[derive(Debug, Deserialize)]
struct MyMemoryData {
    #[serde(rename = "translatedText")]
    #[serde(default)]
    translated_text: Option<String>,
}

/// Rate-limited public API, queried as the last resort. Only its single
/// documented response shape is probed.
pub struct MyMemory {
    client: Client,
    endpoint: String,
}

impl MyMemory {
    pub fn new(endpoint: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("HTTP client creation should not fail");

        Self { client, endpoint }
    }
}

#[async_trait]
impl TranslationProvider for MyMemory {
    fn name(&self) -> &str {
        "mymemory"
    }

    async fn attempt(&self, request: &TranslationRequest) -> Result<String> {
        let langpair = format!("{}|{}", request.source_or_auto(), request.target);

        debug!("Sending last-resort translation request to {}", self.endpoint);
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("q", request.text.as_str()), ("langpair", langpair.as_str())])
            .send()
            .await
            .map_err(|e| VantageError::Translation(format!("Last-resort request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(VantageError::Translation(format!(
                "Last-resort provider returned {}",
                response.status()
            )));
        }

        let body: MyMemoryResponse = response
            .json()
            .await
            .map_err(|e| VantageError::Translation(format!("Failed to parse last-resort response: {}", e)))?;

        body.response_data
            .and_then(|data| data.translated_text)
            .filter(|text| !text.is_empty())
            .ok_or_else(|| {
                VantageError::Translation("Last-resort provider returned no translation".to_string())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_shape_parses() {
        let raw = r#"{"responseData": {"translatedText": "Bonjour", "match": 0.98}, "responseStatus": 200}"#;
        let body: MyMemoryResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(
            body.response_data.unwrap().translated_text.as_deref(),
            Some("Bonjour")
        );
    }
}
