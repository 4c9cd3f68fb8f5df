use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use super::{TranslationProvider, TranslationRequest};
use crate::error::{Result, VantageError};

/// Self-hostable fallback provider.
///
/// Deployments disagree with each other in two ways: some only accept
/// form-url-encoded requests, and they name the response field differently.
/// Both encodings are tried per endpoint and the response is probed across
/// every known field name. The probe list must stay complete; narrowing it
/// silently drops valid responses from some deployments.
pub struct LibreTranslate {
    client: Client,
    endpoint: String,
}

impl LibreTranslate {
    pub fn new(endpoint: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("HTTP client creation should not fail");

        Self { client, endpoint }
    }

    fn probe_translation(value: &serde_json::Value) -> Option<String> {
        for field in ["translatedText", "translation", "translated_text"] {
            if let Some(text) = value.get(field).and_then(|v| v.as_str()) {
                if !text.is_empty() {
                    return Some(text.to_string());
                }
            }
        }

        value
            .get("translations")
            .and_then(|v| v.get(0))
            .and_then(|v| v.get("text"))
            .and_then(|v| v.as_str())
            .filter(|text| !text.is_empty())
            .map(|text| text.to_string())
    }

    async fn attempt_json(&self, request: &TranslationRequest) -> Result<String> {
        let payload = json!({
            "q": request.text,
            "source": request.source_or_auto(),
            "target": request.target,
            "format": "text",
        });

        let response = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|e| VantageError::Translation(format!("{}: {}", self.endpoint, e)))?;

        self.extract(response).await
    }

    async fn attempt_form(&self, request: &TranslationRequest) -> Result<String> {
        let form = [
            ("q", request.text.as_str()),
            ("source", request.source_or_auto()),
            ("target", request.target.as_str()),
            ("format", "text"),
        ];

        let response = self
            .client
            .post(&self.endpoint)
            .form(&form)
            .send()
            .await
            .map_err(|e| VantageError::Translation(format!("{}: {}", self.endpoint, e)))?;

        self.extract(response).await
    }

    async fn extract(&self, response: reqwest::Response) -> Result<String> {
        if !response.status().is_success() {
            return Err(VantageError::Translation(format!(
                "{} returned {}",
                self.endpoint,
                response.status()
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| VantageError::Translation(format!("{}: unparseable response: {}", self.endpoint, e)))?;

        Self::probe_translation(&body).ok_or_else(|| {
            VantageError::Translation(format!(
                "{} response had no recognizable translation field",
                self.endpoint
            ))
        })
    }
}

#[async_trait]
impl TranslationProvider for LibreTranslate {
    fn name(&self) -> &str {
        &self.endpoint
    }

    async fn attempt(&self, request: &TranslationRequest) -> Result<String> {
        match self.attempt_json(request).await {
            Ok(translation) => Ok(translation),
            Err(json_error) => {
                debug!(
                    "JSON encoding rejected by {} ({}); retrying form-encoded",
                    self.endpoint, json_error
                );
                self.attempt_form(request).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probes_every_known_field_name() {
        let shapes = [
            r#"{"translatedText": "Bonjour"}"#,
            r#"{"translation": "Bonjour"}"#,
            r#"{"translated_text": "Bonjour"}"#,
            r#"{"translations": [{"text": "Bonjour"}]}"#,
        ];

        for raw in shapes {
            let value: serde_json::Value = serde_json::from_str(raw).unwrap();
            assert_eq!(
                LibreTranslate::probe_translation(&value).as_deref(),
                Some("Bonjour"),
                "shape not recognized: {}",
                raw
            );
        }
    }

    #[test]
    fn unknown_shapes_and_empty_values_probe_to_absent() {
        let value: serde_json::Value =
            serde_json::from_str(r#"{"result": "Bonjour"}"#).unwrap();
        assert!(LibreTranslate::probe_translation(&value).is_none());

        let value: serde_json::Value = serde_json::from_str(r#"{"translatedText": ""}"#).unwrap();
        assert!(LibreTranslate::probe_translation(&value).is_none());

        let value: serde_json::Value = serde_json::from_str(r#"{"translations": []}"#).unwrap();
        assert!(LibreTranslate::probe_translation(&value).is_none());
    }
}
