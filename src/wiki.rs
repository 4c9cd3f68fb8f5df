// Encyclopedia lookups
//
// Two endpoints: the action API for geosearch (ranked nearby landmarks) and
// the REST API for one-line page summaries. The nearest-title lookup is
// best-effort; the planner's summary fan-out tolerates per-candidate failure.

use async_trait::async_trait;
use futures::future::join_all;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::LandmarkConfig;
use crate::error::{Result, VantageError};
use crate::location::Coordinate;

#[derive(Debug, Clone, Deserialize)]
pub struct GeosearchHit {
    pub pageid: u64,
    pub title: String,
    pub lat: f64,
    pub lon: f64,
    /// Distance from the query point in meters; the API ranks hits by it.
    pub dist: f64,
}

#[derive(Debug, Deserialize)]
struct GeosearchResponse {
    #[serde(default)]
    query: Option<GeosearchQuery>,
}

#[derive(Debug, Deserialize)]
struct GeosearchQuery {
    #[serde(default)]
    geosearch: Vec<GeosearchHit>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PageSummary {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub extract: Option<String>,
    #[serde(default)]
    pub content_urls: Option<ContentUrls>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContentUrls {
    #[serde(default)]
    pub desktop: Option<PageRef>,
    #[serde(default)]
    pub mobile: Option<PageRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PageRef {
    pub page: String,
}

/// Nearest-landmark seam used by the capture pipeline.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LandmarkSource: Send + Sync {
    /// Title of the closest landmark, if any. Failures and empty result
    /// lists degrade to absence; no retry.
    async fn nearest_title(&self, coordinate: Coordinate) -> Option<String>;
}

pub struct WikiClient {
    client: Client,
    api_endpoint: String,
    rest_endpoint: String,
    search_radius_m: u32,
    search_limit: u32,
}

impl WikiClient {
    pub fn new(config: &LandmarkConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("HTTP client creation should not fail");

        Self {
            client,
            api_endpoint: config.api_endpoint.clone(),
            rest_endpoint: config.rest_endpoint.clone(),
            search_radius_m: config.search_radius_m,
            search_limit: config.search_limit,
        }
    }

    /// Landmarks near a coordinate, ranked by distance upstream. Non-2xx is
    /// an error at this layer; callers decide whether to degrade.
    pub async fn search_nearby(&self, coordinate: Coordinate) -> Result<Vec<GeosearchHit>> {
        let gscoord = format!("{}|{}", coordinate.latitude, coordinate.longitude);
        let query: Vec<(&str, String)> = vec![
            ("action", "query".to_string()),
            ("format", "json".to_string()),
            ("list", "geosearch".to_string()),
            ("gscoord", gscoord),
            ("gsradius", self.search_radius_m.to_string()),
            ("gslimit", self.search_limit.to_string()),
        ];

        debug!("Geosearch around {:?}", coordinate);
        let response = self
            .client
            .get(&self.api_endpoint)
            .query(&query)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(VantageError::Landmark(format!(
                "Geosearch query returned {}",
                response.status()
            )));
        }

        let body: GeosearchResponse = response.json().await?;
        Ok(body.query.map(|q| q.geosearch).unwrap_or_default())
    }

    /// One-line summary for a page title. Non-2xx means the page has no
    /// summary and comes back absent; transport failures are errors.
    pub async fn fetch_summary(&self, title: &str) -> Result<Option<PageSummary>> {
        let mut url = reqwest::Url::parse(&self.rest_endpoint)
            .map_err(|e| VantageError::Landmark(format!("Invalid summary endpoint: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| VantageError::Landmark("Summary endpoint cannot be a base".to_string()))?
            .extend(["page", "summary", title]);

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            debug!("No summary for '{}' ({})", title, response.status());
            return Ok(None);
        }

        let summary: PageSummary = response.json().await?;
        Ok(Some(summary))
    }

    /// Enrich the first `limit` ranked hits with summaries. The fetches run
    /// concurrently; results are reassembled in rank order by index, and a
    /// failed fetch leaves its candidate with absent summary fields rather
    /// than dropping the candidate.
    pub async fn enumerate_nearby(
        &self,
        coordinate: Coordinate,
        limit: usize,
    ) -> Result<Vec<(GeosearchHit, Option<PageSummary>)>> {
        let hits = self.search_nearby(coordinate).await?;
        let top: Vec<GeosearchHit> = hits.into_iter().take(limit).collect();

        let summaries = join_all(top.iter().map(|hit| async move {
            match self.fetch_summary(&hit.title).await {
                Ok(summary) => summary,
                Err(e) => {
                    warn!("Summary fetch failed for '{}': {}", hit.title, e);
                    None
                }
            }
        }))
        .await;

        Ok(top.into_iter().zip(summaries).collect())
    }
}

#[async_trait]
impl LandmarkSource for WikiClient {
    async fn nearest_title(&self, coordinate: Coordinate) -> Option<String> {
        match self.search_nearby(coordinate).await {
            Ok(hits) => hits.into_iter().next().map(|hit| hit.title),
            Err(e) => {
                warn!("Nearby landmark lookup failed: {}", e);
                None
            }
        }
    }
}
