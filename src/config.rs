use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Result, VantageError};

// Default values for service endpoints and bounds
fn default_fresh_timeout_ms() -> u64 {
    7_000
}

fn default_geocode_timeout_ms() -> u64 {
    3_000
}

fn default_cache_max_age_secs() -> u64 {
    900
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub location: LocationConfig,
    pub geocode: GeocodeConfig,
    pub landmark: LandmarkConfig,
    pub translate: TranslateConfig,
    pub inference: InferenceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    /// IP-geolocation endpoint used for fresh position reads
    pub lookup_endpoint: String,
    /// Pinned coordinates; when set, fresh reads return these instead of
    /// querying the lookup endpoint
    pub fixed: Option<[f64; 2]>,
    /// Bound on a fresh position read (milliseconds)
    #[serde(default = "default_fresh_timeout_ms")]
    pub fresh_timeout_ms: u64,
    /// Last-known fixes older than this count as absent (seconds)
    #[serde(default = "default_cache_max_age_secs")]
    pub cache_max_age_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeocodeConfig {
    /// Reverse-geocoding endpoint (Nominatim-style `/reverse` API)
    pub endpoint: String,
    /// API key, appended to requests when set
    pub api_key: Option<String>,
    /// Bound on a reverse-geocode call (milliseconds); shorter than the
    /// location bound since the place string is enrichment, not the signal
    #[serde(default = "default_geocode_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LandmarkConfig {
    /// Encyclopedia action API endpoint (geosearch)
    pub api_endpoint: String,
    /// Encyclopedia REST endpoint (page summaries)
    pub rest_endpoint: String,
    /// Geosearch radius in meters
    pub search_radius_m: u32,
    /// Geosearch result cap
    pub search_limit: u32,
    /// Maximum candidates enriched by the trip planner
    pub plan_limit: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateConfig {
    /// Keyed primary provider; only attempted when a key is configured
    pub google_api_key: Option<String>,
    /// Self-hosted fallback instance, tried before the public ones
    pub custom_endpoint: Option<String>,
    /// Public fallback instances, tried in order
    pub fallback_endpoints: Vec<String>,
    /// Rate-limited last-resort provider
    pub mymemory_endpoint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Chat-completions endpoint (OpenAI-compatible)
    pub endpoint: String,
    /// API key sent as a bearer token
    pub api_key: Option<String>,
    /// Vision-capable model id
    pub model: String,
    /// Token budget for the completion
    pub max_tokens: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            location: LocationConfig {
                lookup_endpoint: "http://ip-api.com/json".to_string(),
                fixed: None,
                fresh_timeout_ms: default_fresh_timeout_ms(),
                cache_max_age_secs: default_cache_max_age_secs(),
            },
            geocode: GeocodeConfig {
                endpoint: "https://geocode.maps.co".to_string(),
                api_key: None,
                timeout_ms: default_geocode_timeout_ms(),
            },
            landmark: LandmarkConfig {
                api_endpoint: "https://en.wikipedia.org/w/api.php".to_string(),
                rest_endpoint: "https://en.wikipedia.org/api/rest_v1".to_string(),
                search_radius_m: 10_000,
                search_limit: 20,
                plan_limit: 10,
            },
            translate: TranslateConfig {
                google_api_key: None,
                custom_endpoint: None,
                fallback_endpoints: vec![
                    "https://libretranslate.com/translate".to_string(),
                    "https://translate.astian.org/translate".to_string(),
                ],
                mymemory_endpoint: "https://api.mymemory.translated.net/get".to_string(),
            },
            inference: InferenceConfig {
                endpoint: "https://openrouter.ai/api/v1".to_string(),
                api_key: None,
                model: "qwen/qwen2.5-vl-32b-instruct".to_string(),
                max_tokens: 512,
            },
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| VantageError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| VantageError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| VantageError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| VantageError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Secrets are preferred from the environment over the config file.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("VANTAGE_OPENROUTER_API_KEY") {
            if !key.is_empty() {
                self.inference.api_key = Some(key);
            }
        }
        if let Ok(key) = std::env::var("VANTAGE_GOOGLE_TRANSLATE_API_KEY") {
            if !key.is_empty() {
                self.translate.google_api_key = Some(key);
            }
        }
        if let Ok(url) = std::env::var("VANTAGE_LIBRETRANSLATE_URL") {
            if !url.is_empty() {
                self.translate.custom_endpoint = Some(url);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = Config::default();
        let serialized = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&serialized).unwrap();
        assert_eq!(parsed.location.fresh_timeout_ms, 7_000);
        assert_eq!(parsed.geocode.timeout_ms, 3_000);
        assert_eq!(parsed.landmark.search_radius_m, 10_000);
        assert_eq!(parsed.translate.fallback_endpoints.len(), 2);
    }

    #[test]
    fn missing_bounds_fall_back_to_defaults() {
        let partial = r#"
            [location]
            lookup_endpoint = "http://ip-api.com/json"

            [geocode]
            endpoint = "https://geocode.maps.co"

            [landmark]
            api_endpoint = "https://en.wikipedia.org/w/api.php"
            rest_endpoint = "https://en.wikipedia.org/api/rest_v1"
            search_radius_m = 10000
            search_limit = 20
            plan_limit = 10

            [translate]
            fallback_endpoints = []
            mymemory_endpoint = "https://api.mymemory.translated.net/get"

            [inference]
            endpoint = "https://openrouter.ai/api/v1"
            model = "qwen/qwen2.5-vl-32b-instruct"
            max_tokens = 512
        "#;
        let config: Config = toml::from_str(partial).unwrap();
        assert_eq!(config.location.fresh_timeout_ms, 7_000);
        assert_eq!(config.location.cache_max_age_secs, 900);
        assert_eq!(config.geocode.timeout_ms, 3_000);
    }
}
