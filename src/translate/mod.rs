// Ordered provider-fallback translation
//
// Providers are strategy objects tried in configured order; the first
// success wins. Unlike the location and place resolvers there is no usable
// empty result here, so exhausting the chain is a hard error carrying the
// most recent underlying failure.

pub mod google;
pub mod libre;
pub mod mymemory;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::config::TranslateConfig;
use crate::error::{Result, VantageError};

#[derive(Debug, Clone)]
pub struct TranslationRequest {
    pub text: String,
    /// Source language code; absent means automatic detection
    pub source: Option<String>,
    pub target: String,
}

impl TranslationRequest {
    pub fn new(text: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: None,
            target: target.into(),
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn source_or_auto(&self) -> &str {
        self.source.as_deref().unwrap_or("auto")
    }
}

/// A single translation backend.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn attempt(&self, request: &TranslationRequest) -> Result<String>;
}

pub struct TranslationResolver {
    providers: Vec<Box<dyn TranslationProvider>>,
}

impl TranslationResolver {
    /// Assemble the provider chain from configuration: the keyed primary
    /// when a credential exists, then the custom fallback instance, then the
    /// public fallback instances in configured order, then the last-resort
    /// public API.
    pub fn from_config(config: &TranslateConfig) -> Self {
        let mut providers: Vec<Box<dyn TranslationProvider>> = Vec::new();

        if let Some(key) = &config.google_api_key {
            providers.push(Box::new(google::GoogleTranslate::new(key.clone())));
        }
        if let Some(endpoint) = &config.custom_endpoint {
            providers.push(Box::new(libre::LibreTranslate::new(endpoint.clone())));
        }
        for endpoint in &config.fallback_endpoints {
            providers.push(Box::new(libre::LibreTranslate::new(endpoint.clone())));
        }
        providers.push(Box::new(mymemory::MyMemory::new(
            config.mymemory_endpoint.clone(),
        )));

        Self { providers }
    }

    pub fn with_providers(providers: Vec<Box<dyn TranslationProvider>>) -> Self {
        Self { providers }
    }

    /// First success wins. Every provider failure is recorded; exhaustion
    /// surfaces the most recent one.
    pub async fn translate(&self, request: &TranslationRequest) -> Result<String> {
        let mut last_error: Option<VantageError> = None;

        for provider in &self.providers {
            debug!("Attempting translation via {}", provider.name());
            match provider.attempt(request).await {
                Ok(translation) => {
                    info!("Translation succeeded via {}", provider.name());
                    return Ok(translation);
                }
                Err(e) => {
                    warn!("Provider {} failed: {}", provider.name(), e);
                    last_error = Some(e);
                }
            }
        }

        Err(VantageError::Translation(match last_error {
            Some(e) => format!("All providers exhausted: {}", e),
            None => "All providers exhausted".to_string(),
        }))
    }
}
