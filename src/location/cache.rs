use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, warn};

use super::Coordinate;
use crate::error::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LastFix {
    pub latitude: f64,
    pub longitude: f64,
    pub recorded_at: DateTime<Utc>,
}

/// Persistent last-known fix. One JSON file; entries past the staleness
/// window count as absent.
pub struct FixCache {
    cache_dir: PathBuf,
    max_age_secs: u64,
}

impl FixCache {
    pub fn new(cache_dir: PathBuf, max_age_secs: u64) -> Self {
        Self {
            cache_dir,
            max_age_secs,
        }
    }

    pub fn with_default_dir(max_age_secs: u64) -> Self {
        Self::new(PathBuf::from(".vantage/cache/location"), max_age_secs)
    }

    fn fix_path(&self) -> PathBuf {
        self.cache_dir.join("last_fix.json")
    }

    /// Load the last-known fix. Missing, unparseable, or stale entries all
    /// come back as `None` rather than failing the caller.
    pub async fn load(&self) -> Result<Option<Coordinate>> {
        let path = self.fix_path();
        if !path.exists() {
            return Ok(None);
        }

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(_) => return Ok(None),
        };

        match serde_json::from_str::<LastFix>(&content) {
            Ok(fix) => {
                let age = Utc::now().signed_duration_since(fix.recorded_at);
                if age.num_seconds() < 0 || age.num_seconds() as u64 > self.max_age_secs {
                    debug!(
                        "Last-known fix is stale ({}s old), ignoring",
                        age.num_seconds()
                    );
                    return Ok(None);
                }
                Ok(Some(Coordinate {
                    latitude: fix.latitude,
                    longitude: fix.longitude,
                }))
            }
            Err(e) => {
                warn!("Failed to parse last-known fix: {}", e);
                Ok(None)
            }
        }
    }

    /// Persist a fix so the next invocation can skip the fresh read.
    pub async fn store(&self, coordinate: &Coordinate) -> Result<()> {
        tokio::fs::create_dir_all(&self.cache_dir).await?;

        let fix = LastFix {
            latitude: coordinate.latitude,
            longitude: coordinate.longitude,
            recorded_at: Utc::now(),
        };
        let content = serde_json::to_string_pretty(&fix)?;
        tokio::fs::write(self.fix_path(), content).await?;

        debug!("Persisted last-known fix");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn missing_fix_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FixCache::new(dir.path().to_path_buf(), 900);
        assert!(cache.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn stored_fix_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FixCache::new(dir.path().to_path_buf(), 900);
        let coordinate = Coordinate {
            latitude: 48.8584,
            longitude: 2.2945,
        };
        cache.store(&coordinate).await.unwrap();

        let loaded = cache.load().await.unwrap().unwrap();
        assert_eq!(loaded, coordinate);
    }

    #[tokio::test]
    async fn stale_fix_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FixCache::new(dir.path().to_path_buf(), 900);
        let fix = LastFix {
            latitude: 48.8584,
            longitude: 2.2945,
            recorded_at: Utc::now() - Duration::hours(2),
        };
        tokio::fs::create_dir_all(dir.path()).await.unwrap();
        tokio::fs::write(
            dir.path().join("last_fix.json"),
            serde_json::to_string(&fix).unwrap(),
        )
        .await
        .unwrap();

        assert!(cache.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn corrupt_fix_is_absent_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FixCache::new(dir.path().to_path_buf(), 900);
        tokio::fs::create_dir_all(dir.path()).await.unwrap();
        tokio::fs::write(dir.path().join("last_fix.json"), "not json")
            .await
            .unwrap();

        assert!(cache.load().await.unwrap().is_none());
    }
}
