//! Restaurant picker: search, filter, weighted draw, distance annotation

use crate::address::label_location;
use crate::buildings::{describe_filters, BuildingAggregator, DEFAULT_MAX_CONCURRENT};
use crate::distance::DistanceResolver;
use crate::error::{PickError, PickResult};
use crate::filter::{filter_candidates, CandidateFilter};
use crate::geo::{maps_url, sample_point};
use crate::provider::{LocationProvider, MapServiceClient, NearbyQuery, NoLocation};
use crate::selection::{candidate_weight, select_weighted, DecayFactor};
use crate::types::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;
use tracing::{debug, info};

/// Main picker (thread-safe via Arc)
pub struct RestaurantPicker {
    client: Arc<dyn MapServiceClient>,
    buildings: BuildingAggregator,
    distance: DistanceResolver,
    location: Box<dyn LocationProvider>,
    decay: DecayFactor,
    rng: Mutex<ChaCha8Rng>,
}

pub type SharedPicker = Arc<RestaurantPicker>;

impl RestaurantPicker {
    pub fn new(client: Arc<dyn MapServiceClient>, decay: DecayFactor, building_fanout: usize) -> Self {
        Self {
            buildings: BuildingAggregator::new(client.clone(), building_fanout),
            distance: DistanceResolver::new(client.clone()),
            client,
            location: Box::new(NoLocation),
            decay,
            rng: Mutex::new(ChaCha8Rng::from_rng(&mut rand::rng())),
        }
    }

    /// Picker with default decay and fan-out
    pub fn new_simple(client: Arc<dyn MapServiceClient>) -> Self {
        Self::new(client, DecayFactor::default(), DEFAULT_MAX_CONCURRENT)
    }

    pub fn with_location_provider(mut self, provider: Box<dyn LocationProvider>) -> Self {
        self.location = provider;
        self
    }

    /// Make every random choice reproducible
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(ChaCha8Rng::seed_from_u64(seed));
        self
    }

    pub fn shared(self) -> SharedPicker {
        Arc::new(self)
    }

    pub fn provider_name(&self) -> &'static str {
        self.client.name()
    }

    pub fn decay(&self) -> DecayFactor {
        self.decay
    }

    // Never held across an await
    fn rng(&self) -> MutexGuard<'_, ChaCha8Rng> {
        self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Main entry point: pick one restaurant.
    ///
    /// The returned history is the request's history with the chosen id
    /// counted once more; on error nothing is returned, so the caller's
    /// history is untouched.
    pub async fn pick(&self, req: PickRequest) -> PickResult<PickOutcome> {
        let start = Instant::now();

        info!(
            "Picking restaurant: origin=({:.5}, {:.5}), mode={}, radius={}m, min_rating={}, open_only={}",
            req.origin.lat,
            req.origin.lng,
            mode_name(&req.mode),
            req.settings.radius_meters,
            req.settings.min_rating,
            req.settings.open_only
        );

        let candidates = match &req.mode {
            SearchMode::Radius => self.radius_candidates(&req.origin, &req.settings).await?,
            SearchMode::Buildings { buildings } => {
                self.buildings
                    .find_candidates_in_buildings(buildings, req.settings.min_rating, req.settings.open_only)
                    .await?
            }
        };

        let chosen = {
            let mut rng = self.rng();
            select_weighted(&candidates, &req.history, self.decay, &mut *rng)?
        };

        info!(
            "Selected '{}' ({}) from {} candidates, weight {:.3}",
            chosen.name,
            chosen.id,
            candidates.len(),
            candidate_weight(&chosen, &req.history, self.decay)
        );

        let walking = match chosen.coordinates {
            Some(dest) => Some(self.distance.resolve(&req.origin, dest).await),
            None => None,
        };

        let history = req.history.with_selection(&chosen.id);
        let result = SelectionResult {
            maps_url: maps_url(&chosen),
            distance_is_approximate: walking.as_ref().map(|w| w.approximate).unwrap_or(false),
            walking_distance_text: walking.as_ref().map(|w| w.distance_text.clone()),
            walking_duration_text: walking.map(|w| w.duration_text),
            candidate: chosen,
        };

        debug!("Pick finished in {}ms", start.elapsed().as_millis());

        Ok(PickOutcome { result, history })
    }

    /// Search from a randomized origin inside the radius, then pull results
    /// back to the true origin.
    async fn radius_candidates(&self, origin: &Location, settings: &SearchSettings) -> PickResult<Vec<Candidate>> {
        let search_origin = {
            let mut rng = self.rng();
            sample_point(origin, settings.radius_meters, &mut *rng)
        };
        debug!("Randomized search origin ({:.5}, {:.5})", search_origin.lat, search_origin.lng);

        let raw = self
            .client
            .nearby_search(&NearbyQuery {
                origin: search_origin.coordinates(),
                radius_meters: Some(settings.radius_meters),
                place_type: "restaurant".to_string(),
                open_now: settings.open_only,
            })
            .await?;

        let found = raw.len();
        let filter = CandidateFilter::new(settings.min_rating, settings.open_only)
            .within(origin.clone(), settings.radius_meters);
        let kept = filter_candidates(raw, &filter);

        info!("Radius search: {} results, {} after filters", found, kept.len());

        if kept.is_empty() {
            return Err(PickError::NoCandidatesMatched {
                scope: describe_filters(
                    &format!("within {}m", settings.radius_meters.round() as i64),
                    settings.min_rating,
                    settings.open_only,
                ),
            });
        }

        Ok(kept)
    }

    /// Anchor buildings around `origin` for building mode
    pub async fn discover_buildings(&self, origin: &Location, radius_meters: f64) -> PickResult<Vec<Building>> {
        self.buildings.discover_buildings(origin, radius_meters).await
    }

    /// Attach a readable address; failure leaves the location unlabeled
    pub async fn label(&self, location: Location) -> Location {
        label_location(self.client.as_ref(), location).await
    }

    /// Use `origin` if given, otherwise ask the location provider
    pub async fn resolve_origin(&self, origin: Option<Location>) -> PickResult<Location> {
        match origin {
            Some(loc) => Ok(loc),
            None => self.location.current_location().await,
        }
    }
}

fn mode_name(mode: &SearchMode) -> &'static str {
    match mode {
        SearchMode::Radius => "radius",
        SearchMode::Buildings { .. } => "buildings",
    }
}
