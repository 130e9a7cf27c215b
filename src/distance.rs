//! Walking distance annotation with a straight-line fallback

use crate::geo::{format_distance, haversine_meters};
use crate::provider::MapServiceClient;
use crate::types::{Coordinates, Location, WalkingInfo};
use std::sync::Arc;
use tracing::{debug, warn};

/// Average walking speed, 4.8 km/h
pub const WALKING_METERS_PER_MINUTE: f64 = 80.0;

pub const APPROX_PREFIX: &str = "approx.";

pub struct DistanceResolver {
    client: Arc<dyn MapServiceClient>,
}

impl DistanceResolver {
    pub fn new(client: Arc<dyn MapServiceClient>) -> Self {
        Self { client }
    }

    /// Provider walking route if available, otherwise a haversine estimate.
    /// Never fails.
    pub async fn resolve(&self, origin: &Location, destination: Coordinates) -> WalkingInfo {
        match self.client.route(origin.coordinates(), destination).await {
            Ok(info) => {
                debug!("Walking route: {} / {}", info.distance_text, info.duration_text);
                info
            }
            Err(e) => {
                warn!("Walking route failed, using straight-line estimate: {}", e);
                estimate_walking(origin.coordinates(), destination)
            }
        }
    }
}

/// Straight-line estimate, marked approximate
pub fn estimate_walking(origin: Coordinates, destination: Coordinates) -> WalkingInfo {
    let meters = haversine_meters(origin, destination);
    let minutes = (meters / WALKING_METERS_PER_MINUTE).round() as i64;

    WalkingInfo {
        distance_text: format!("{} {}", APPROX_PREFIX, format_distance(meters)),
        duration_text: format!("{} {} min", APPROX_PREFIX, minutes),
        approximate: true,
    }
}
