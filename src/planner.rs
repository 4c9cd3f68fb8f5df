// Trip planning
//
// Enumerates nearby points of interest and enriches each with a one-line
// summary. Location is best-effort: with nothing resolvable the plan is
// empty, not an error.

use tracing::{info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::location::{Accuracy, Coordinate, LocationResolver};
use crate::wiki::{PageSummary, WikiClient};

#[derive(Debug, Clone)]
pub struct PlanItem {
    pub title: String,
    /// One-line summary of the point of interest
    pub detail: Option<String>,
    pub url: Option<String>,
}

pub struct TripPlanner {
    locations: LocationResolver,
    wiki: WikiClient,
    plan_limit: usize,
}

impl TripPlanner {
    pub fn new(config: &Config) -> Self {
        Self {
            // A rough position is enough to search a 10 km radius.
            locations: LocationResolver::new(&config.location)
                .with_fresh_accuracy(Accuracy::Lowest),
            wiki: WikiClient::new(&config.landmark),
            plan_limit: config.landmark.plan_limit,
        }
    }

    pub fn with_parts(locations: LocationResolver, wiki: WikiClient, plan_limit: usize) -> Self {
        Self {
            locations,
            wiki,
            plan_limit,
        }
    }

    pub async fn plan_nearby(
        &self,
        coordinate_override: Option<Coordinate>,
        limit: Option<usize>,
    ) -> Result<Vec<PlanItem>> {
        let coordinate = match coordinate_override {
            Some(coordinate) => Some(coordinate),
            None => self.locations.resolve().await.map(|r| r.coordinate),
        };

        let Some(coordinate) = coordinate else {
            warn!("No location available; returning an empty plan");
            return Ok(Vec::new());
        };

        let limit = limit.unwrap_or(self.plan_limit);
        let enriched = self.wiki.enumerate_nearby(coordinate, limit).await?;
        info!("Found {} points of interest", enriched.len());

        Ok(enriched
            .into_iter()
            .map(|(hit, summary)| PlanItem {
                title: hit.title,
                detail: summary
                    .as_ref()
                    .and_then(|s| s.description.clone()),
                url: summary.as_ref().and_then(page_url),
            })
            .collect())
    }
}

/// Canonical page link; the desktop form wins, the mobile form is the
/// fallback.
fn page_url(summary: &PageSummary) -> Option<String> {
    let urls = summary.content_urls.as_ref()?;
    urls.desktop
        .as_ref()
        .or(urls.mobile.as_ref())
        .map(|page_ref| page_ref.page.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wiki::{ContentUrls, PageRef};

    #[test]
    fn desktop_url_wins_over_mobile() {
        let summary = PageSummary {
            description: None,
            extract: None,
            content_urls: Some(ContentUrls {
                desktop: Some(PageRef {
                    page: "https://en.wikipedia.org/wiki/Eiffel_Tower".to_string(),
                }),
                mobile: Some(PageRef {
                    page: "https://en.m.wikipedia.org/wiki/Eiffel_Tower".to_string(),
                }),
            }),
        };

        assert_eq!(
            page_url(&summary).as_deref(),
            Some("https://en.wikipedia.org/wiki/Eiffel_Tower")
        );
    }

    #[test]
    fn mobile_url_backfills_missing_desktop() {
        let summary = PageSummary {
            description: None,
            extract: None,
            content_urls: Some(ContentUrls {
                desktop: None,
                mobile: Some(PageRef {
                    page: "https://en.m.wikipedia.org/wiki/Eiffel_Tower".to_string(),
                }),
            }),
        };

        assert_eq!(
            page_url(&summary).as_deref(),
            Some("https://en.m.wikipedia.org/wiki/Eiffel_Tower")
        );
    }

    #[test]
    fn absent_urls_stay_absent() {
        let summary = PageSummary {
            description: Some("Tower in Paris".to_string()),
            extract: None,
            content_urls: None,
        };
        assert!(page_url(&summary).is_none());
    }
}
