// Best-effort location resolution
//
// The resolver prefers a cached last-known fix over a fresh read, and bounds
// the fresh read so an unresponsive lookup cannot stall the capture flow.
// Total failure is an absence, never an error; callers carry on without a
// position.

pub mod cache;
pub mod ip_lookup;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::LocationConfig;
use crate::error::Result;
use crate::timing::with_timeout_or;

pub use cache::FixCache;
pub use ip_lookup::IpLookupSource;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// How the coordinate was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccuracyTier {
    /// Last-known fix from the cache
    Cached,
    /// Fresh read from a position source
    Fresh,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedLocation {
    pub coordinate: Coordinate,
    pub accuracy: AccuracyTier,
}

/// Accuracy hint handed to a position source for a fresh read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accuracy {
    Lowest,
    Balanced,
    High,
}

/// A source of fresh position reads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PositionSource: Send + Sync {
    async fn current_position(&self, accuracy: Accuracy) -> Result<Coordinate>;
}

/// Coordinates pinned in configuration; stands in for a real source on
/// machines without any locatable network address.
pub struct FixedPositionSource {
    coordinate: Coordinate,
}

impl FixedPositionSource {
    pub fn new(coordinate: Coordinate) -> Self {
        Self { coordinate }
    }
}

#[async_trait]
impl PositionSource for FixedPositionSource {
    async fn current_position(&self, _accuracy: Accuracy) -> Result<Coordinate> {
        Ok(self.coordinate)
    }
}

/// Factory for assembling the position source from configuration
pub struct PositionSourceFactory;

impl PositionSourceFactory {
    pub fn create_source(config: &LocationConfig) -> Box<dyn PositionSource> {
        match config.fixed {
            Some([latitude, longitude]) => {
                Box::new(FixedPositionSource::new(Coordinate::new(latitude, longitude)))
            }
            None => Box::new(IpLookupSource::new(config.lookup_endpoint.clone())),
        }
    }
}

pub struct LocationResolver {
    cache: FixCache,
    source: Box<dyn PositionSource>,
    fresh_timeout: Duration,
    fresh_accuracy: Accuracy,
}

impl LocationResolver {
    pub fn new(config: &LocationConfig) -> Self {
        Self {
            cache: FixCache::with_default_dir(config.cache_max_age_secs),
            source: PositionSourceFactory::create_source(config),
            fresh_timeout: Duration::from_millis(config.fresh_timeout_ms),
            fresh_accuracy: Accuracy::Balanced,
        }
    }

    pub fn with_parts(
        cache: FixCache,
        source: Box<dyn PositionSource>,
        fresh_timeout: Duration,
    ) -> Self {
        Self {
            cache,
            source,
            fresh_timeout,
            fresh_accuracy: Accuracy::Balanced,
        }
    }

    /// Accuracy hint used for fresh reads; flows that only need a rough
    /// position can ask for less.
    pub fn with_fresh_accuracy(mut self, accuracy: Accuracy) -> Self {
        self.fresh_accuracy = accuracy;
        self
    }

    /// Best-effort position: a valid last-known fix wins outright and the
    /// fresh path is never invoked; otherwise a bounded fresh read. Absent
    /// when everything fails.
    pub async fn resolve(&self) -> Option<ResolvedLocation> {
        match self.cache.load().await {
            Ok(Some(coordinate)) => {
                debug!(
                    "Using last-known fix: {:.5}, {:.5}",
                    coordinate.latitude, coordinate.longitude
                );
                return Some(ResolvedLocation {
                    coordinate,
                    accuracy: AccuracyTier::Cached,
                });
            }
            Ok(None) => {}
            Err(e) => warn!("Failed to read last-known fix: {}", e),
        }

        self.fresh_fix().await
    }

    /// Fresh read only, skipping the cache. Successful fixes are persisted so
    /// the next invocation can short-circuit.
    pub async fn fresh_fix(&self) -> Option<ResolvedLocation> {
        let bound = self.fresh_timeout;
        let read = self.source.current_position(self.fresh_accuracy);

        match with_timeout_or(read, bound, || {
            warn!("Fresh position read timed out after {:?}", bound)
        })
        .await
        {
            Ok(Ok(coordinate)) => {
                if let Err(e) = self.cache.store(&coordinate).await {
                    warn!("Failed to persist fix: {}", e);
                }
                Some(ResolvedLocation {
                    coordinate,
                    accuracy: AccuracyTier::Fresh,
                })
            }
            Ok(Err(e)) => {
                warn!("Fresh position read failed: {}", e);
                None
            }
            Err(_) => None,
        }
    }
}
