// Capture-and-describe pipeline
//
// Steps run strictly in sequence: location, place, landmark, inference. Each
// context step may come back absent and the flow keeps going with whatever it
// has; only an unreadable image aborts a capture. The inference call is the
// last step, and its failure degrades to a fixed message so the flow still
// ends in a report.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use std::path::Path;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{Result, VantageError};
use crate::geocode::PlaceResolver;
use crate::inference::{build_scene_prompt, OpenRouterDescriber, SceneDescriber};
use crate::location::{AccuracyTier, Coordinate, LocationResolver, ResolvedLocation};
use crate::wiki::{LandmarkSource, WikiClient};

/// Shown in place of a description when the inference call fails.
pub const DESCRIPTION_UNAVAILABLE: &str = "Scene description is unavailable right now.";

/// Best-effort context assembled around a capture. Every field tolerates
/// absence.
#[derive(Debug, Clone, Default)]
pub struct SceneContext {
    pub location: Option<ResolvedLocation>,
    pub place: Option<String>,
    pub landmark: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SceneReport {
    pub description: String,
    pub context: SceneContext,
}

/// At most one capture-and-analyze sequence runs at a time; a trigger while
/// one is in flight is dropped, not queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CaptureState {
    Idle,
    InFlight,
}

pub struct CapturePipeline {
    state: CaptureState,
    locations: LocationResolver,
    places: PlaceResolver,
    landmarks: Box<dyn LandmarkSource>,
    describer: Box<dyn SceneDescriber>,
}

impl CapturePipeline {
    pub fn new(config: &Config) -> Self {
        Self {
            state: CaptureState::Idle,
            locations: LocationResolver::new(&config.location),
            places: PlaceResolver::new(&config.geocode),
            landmarks: Box::new(WikiClient::new(&config.landmark)),
            describer: Box::new(OpenRouterDescriber::new(&config.inference)),
        }
    }

    pub fn with_parts(
        locations: LocationResolver,
        places: PlaceResolver,
        landmarks: Box<dyn LandmarkSource>,
        describer: Box<dyn SceneDescriber>,
    ) -> Self {
        Self {
            state: CaptureState::Idle,
            locations,
            places,
            landmarks,
            describer,
        }
    }

    /// Run the capture flow for an already-taken photo. `Ok(None)` means a
    /// capture was already in flight and this trigger was dropped.
    pub async fn analyze(
        &mut self,
        image_path: &Path,
        coordinate_override: Option<Coordinate>,
    ) -> Result<Option<SceneReport>> {
        if self.state == CaptureState::InFlight {
            warn!("Capture already in flight; ignoring trigger");
            return Ok(None);
        }

        self.state = CaptureState::InFlight;
        let result = self.run_capture(image_path, coordinate_override).await;
        self.state = CaptureState::Idle;

        result.map(Some)
    }

    async fn run_capture(
        &self,
        image_path: &Path,
        coordinate_override: Option<Coordinate>,
    ) -> Result<SceneReport> {
        if !image_path.exists() {
            return Err(VantageError::FileNotFound(image_path.display().to_string()));
        }

        let image = tokio::fs::read(image_path).await?;
        let image_b64 = BASE64.encode(&image);
        info!(
            "Analyzing image: {} ({} bytes)",
            image_path.display(),
            image.len()
        );

        let location = match coordinate_override {
            Some(coordinate) => Some(ResolvedLocation {
                coordinate,
                accuracy: AccuracyTier::Fresh,
            }),
            None => self.locations.resolve().await,
        };
        if location.is_none() {
            warn!("No location available; describing without coordinates");
        }

        let place = match &location {
            Some(resolved) => self.places.resolve(resolved.coordinate).await,
            None => None,
        };

        let landmark = match &location {
            Some(resolved) => self.landmarks.nearest_title(resolved.coordinate).await,
            None => None,
        };

        let context = SceneContext {
            location,
            place,
            landmark,
        };

        let prompt = build_scene_prompt(&context);
        let description = match self.describer.describe(&prompt, &image_b64).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Scene description failed: {}", e);
                DESCRIPTION_UNAVAILABLE.to_string()
            }
        };

        Ok(SceneReport {
            description,
            context,
        })
    }

    #[cfg(test)]
    fn mark_in_flight(&mut self) {
        self.state = CaptureState::InFlight;
    }
}
