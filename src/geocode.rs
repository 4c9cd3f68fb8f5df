// Reverse geocoding
//
// Turns a coordinate into a human-readable place string. Enrichment only:
// every failure path degrades to absence and the caller proceeds without a
// place description.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::GeocodeConfig;
use crate::error::Result;
use crate::location::Coordinate;
use crate::timing::with_timeout_or;

/// Ordered place components drawn from a geocoding response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaceParts {
    pub name: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

/// Join the non-empty components in order. All components empty yields
/// `None`, never an empty string.
pub fn describe_place(parts: &PlaceParts) -> Option<String> {
    let components = [
        &parts.name,
        &parts.street,
        &parts.city,
        &parts.region,
        &parts.postal_code,
        &parts.country,
    ];

    let present: Vec<&str> = components
        .iter()
        .filter_map(|component| component.as_deref())
        .map(str::trim)
        .filter(|component| !component.is_empty())
        .collect();

    if present.is_empty() {
        None
    } else {
        Some(present.join(", "))
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    /// First matching place record only.
    async fn reverse(&self, coordinate: Coordinate) -> Result<Option<PlaceParts>>;
}

#[derive(Debug, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    address: Option<ReverseAddress>,
}

#[derive(Debug, Deserialize, Default)]
struct ReverseAddress {
    #[serde(default)]
    road: Option<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    town: Option<String>,
    #[serde(default)]
    village: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    postcode: Option<String>,
    #[serde(default)]
    country: Option<String>,
}

/// Nominatim-style `/reverse` endpoint.
pub struct NominatimGeocoder {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl NominatimGeocoder {
    pub fn new(config: &GeocodeConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("HTTP client creation should not fail");

        Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
        }
    }
}

#[async_trait]
impl ReverseGeocoder for NominatimGeocoder {
    async fn reverse(&self, coordinate: Coordinate) -> Result<Option<PlaceParts>> {
        let url = format!("{}/reverse", self.endpoint);
        let mut query: Vec<(&str, String)> = vec![
            ("lat", coordinate.latitude.to_string()),
            ("lon", coordinate.longitude.to_string()),
        ];
        if let Some(key) = &self.api_key {
            query.push(("api_key", key.clone()));
        }

        let response = self.client.get(&url).query(&query).send().await?;
        if !response.status().is_success() {
            debug!("Reverse geocode returned {}", response.status());
            return Ok(None);
        }

        let body: ReverseResponse = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                debug!("Unparseable reverse geocode response: {}", e);
                return Ok(None);
            }
        };

        let address = body.address.unwrap_or_default();
        Ok(Some(PlaceParts {
            name: body.name,
            street: address.road,
            city: address.city.or(address.town).or(address.village),
            region: address.state,
            postal_code: address.postcode,
            country: address.country,
        }))
    }
}

/// Bounds the geocoder seam with the short enrichment timeout and flattens
/// every outcome to a best-effort place string.
pub struct PlaceResolver {
    geocoder: Box<dyn ReverseGeocoder>,
    timeout: Duration,
}

impl PlaceResolver {
    pub fn new(config: &GeocodeConfig) -> Self {
        Self {
            geocoder: Box::new(NominatimGeocoder::new(config)),
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }

    pub fn with_geocoder(geocoder: Box<dyn ReverseGeocoder>, timeout: Duration) -> Self {
        Self { geocoder, timeout }
    }

    pub async fn resolve(&self, coordinate: Coordinate) -> Option<String> {
        let bound = self.timeout;
        let lookup = self.geocoder.reverse(coordinate);

        match with_timeout_or(lookup, bound, || {
            warn!("Reverse geocoding timed out after {:?}", bound)
        })
        .await
        {
            Ok(Ok(Some(parts))) => describe_place(&parts),
            Ok(Ok(None)) => None,
            Ok(Err(e)) => {
                warn!("Reverse geocoding failed: {}", e);
                None
            }
            Err(_) => None,
        }
    }
}
