use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::{Accuracy, Coordinate, PositionSource};
use crate::error::{Result, VantageError};

/// IP-geolocation response shape (`status` is `"success"` or `"fail"`).
#[derive(Debug, Deserialize)]
struct IpLookupResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    lat: Option<f64>,
    #[serde(default)]
    lon: Option<f64>,
}

/// Fresh position fix derived from the caller's public IP address.
///
/// A network fix has a single precision, so the accuracy hint is accepted but
/// has no effect on the request.
pub struct IpLookupSource {
    client: Client,
    endpoint: String,
}

impl IpLookupSource {
    pub fn new(endpoint: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("HTTP client creation should not fail");

        Self { client, endpoint }
    }
}

#[async_trait]
impl PositionSource for IpLookupSource {
    async fn current_position(&self, accuracy: Accuracy) -> Result<Coordinate> {
        debug!(
            "Requesting network fix from {} (accuracy hint: {:?})",
            self.endpoint, accuracy
        );

        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .map_err(|e| VantageError::Location(format!("Position lookup failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(VantageError::Location(format!(
                "Position lookup returned {}",
                response.status()
            )));
        }

        let body: IpLookupResponse = response
            .json()
            .await
            .map_err(|e| VantageError::Location(format!("Failed to parse position response: {}", e)))?;

        if body.status != "success" {
            return Err(VantageError::Location(
                body.message
                    .unwrap_or_else(|| "position lookup refused".to_string()),
            ));
        }

        match (body.lat, body.lon) {
            (Some(latitude), Some(longitude)) => Ok(Coordinate {
                latitude,
                longitude,
            }),
            _ => Err(VantageError::Location(
                "Position response missing coordinates".to_string(),
            )),
        }
    }
}
