//! Capabilities consumed from the outside world: the mapping provider and
//! the device location source

use crate::error::{PickError, PickResult};
use crate::types::{Candidate, Coordinates, Location, WalkingInfo};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Proximity/type search
#[derive(Debug, Clone, PartialEq)]
pub struct NearbyQuery {
    pub origin: Coordinates,
    pub radius_meters: Option<f64>,
    pub place_type: String,
    pub open_now: bool,
}

/// Free-text search biased toward an origin
#[derive(Debug, Clone, PartialEq)]
pub struct TextQuery {
    pub query: String,
    pub origin: Coordinates,
    pub radius_meters: f64,
    pub place_type: Option<String>,
}

/// Mapping provider (places search, walking directions, reverse geocoding)
#[async_trait]
pub trait MapServiceClient: Send + Sync {
    fn name(&self) -> &'static str;

    async fn nearby_search(&self, query: &NearbyQuery) -> PickResult<Vec<Candidate>>;

    async fn text_search(&self, query: &TextQuery) -> PickResult<Vec<Candidate>>;

    /// Walking route between two points
    async fn route(&self, origin: Coordinates, destination: Coordinates) -> PickResult<WalkingInfo>;

    async fn geocode(&self, location: Coordinates) -> PickResult<String>;
}

/// Source of the user's current position
#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn current_location(&self) -> PickResult<Location>;
}

/// Always reports the same position
pub struct FixedLocation(pub Location);

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn current_location(&self) -> PickResult<Location> {
        Ok(self.0.clone())
    }
}

/// Reports that no location source is configured
pub struct NoLocation;

#[async_trait]
impl LocationProvider for NoLocation {
    async fn current_location(&self) -> PickResult<Location> {
        Err(PickError::lookup("geolocation", "no location source configured"))
    }
}

/// Named positions for running without a device location
pub const DEBUG_LOCATIONS: [(&str, f64, f64); 4] = [
    ("tokyo_station", 35.6809799, 139.7621861),
    ("kyobashi_station", 35.6764499, 139.7685946),
    ("shibuya_station", 35.6580339, 139.6990609),
    ("osaka_umeda_station", 34.7039445, 135.497523),
];

pub fn debug_location(name: &str) -> Option<Location> {
    DEBUG_LOCATIONS
        .iter()
        .find(|(n, _, _)| *n == name)
        .map(|(_, lat, lng)| Location::new(*lat, *lng))
}

/// In-memory provider for tests and offline runs.
///
/// Nearby results are keyed by place type, text results by query string.
/// Tracks how many calls are in flight at once.
#[derive(Default)]
pub struct MockMapClient {
    nearby: HashMap<String, Vec<Candidate>>,
    text: HashMap<String, Vec<Candidate>>,
    failing_nearby: HashSet<String>,
    failing_text: HashSet<String>,
    route: Option<WalkingInfo>,
    address: Option<String>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    calls: Mutex<Vec<String>>,
}

impl MockMapClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_nearby(mut self, place_type: &str, candidates: Vec<Candidate>) -> Self {
        self.nearby.insert(place_type.to_string(), candidates);
        self
    }

    pub fn with_text(mut self, query: &str, candidates: Vec<Candidate>) -> Self {
        self.text.insert(query.to_string(), candidates);
        self
    }

    pub fn failing_nearby(mut self, place_type: &str) -> Self {
        self.failing_nearby.insert(place_type.to_string());
        self
    }

    pub fn failing_text(mut self, query: &str) -> Self {
        self.failing_text.insert(query.to_string());
        self
    }

    pub fn with_route(mut self, info: WalkingInfo) -> Self {
        self.route = Some(info);
        self
    }

    pub fn with_address(mut self, address: &str) -> Self {
        self.address = Some(address.to_string());
        self
    }

    /// Highest number of simultaneous calls observed
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Log of calls, e.g. `nearby:restaurant` or `text:Mall cafe`
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    async fn enter(&self, call: String) {
        {
            let mut calls = self.calls.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            calls.push(call);
        }
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        // Let other branches make progress while this one is "in flight"
        for _ in 0..3 {
            tokio::task::yield_now().await;
        }
    }

    fn exit(&self) {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl MapServiceClient for MockMapClient {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn nearby_search(&self, query: &NearbyQuery) -> PickResult<Vec<Candidate>> {
        self.enter(format!("nearby:{}", query.place_type)).await;
        let res = if self.failing_nearby.contains(&query.place_type) {
            Err(PickError::lookup("nearby_search", "UNKNOWN_ERROR"))
        } else {
            Ok(self.nearby.get(&query.place_type).cloned().unwrap_or_default())
        };
        self.exit();
        res
    }

    async fn text_search(&self, query: &TextQuery) -> PickResult<Vec<Candidate>> {
        self.enter(format!("text:{}", query.query)).await;
        let res = if self.failing_text.contains(&query.query) {
            Err(PickError::lookup("text_search", "OVER_QUERY_LIMIT"))
        } else {
            Ok(self.text.get(&query.query).cloned().unwrap_or_default())
        };
        self.exit();
        res
    }

    async fn route(&self, _origin: Coordinates, _destination: Coordinates) -> PickResult<WalkingInfo> {
        self.enter("route".to_string()).await;
        let res = self
            .route
            .clone()
            .ok_or_else(|| PickError::lookup("route", "ZERO_RESULTS"));
        self.exit();
        res
    }

    async fn geocode(&self, _location: Coordinates) -> PickResult<String> {
        self.enter("geocode".to_string()).await;
        let res = self
            .address
            .clone()
            .ok_or_else(|| PickError::lookup("geocode", "ZERO_RESULTS"));
        self.exit();
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_location_lookup() {
        let loc = debug_location("shibuya_station").unwrap();
        assert!((loc.lat - 35.658).abs() < 0.001);
        assert!(debug_location("atlantis").is_none());
    }

    #[test]
    fn test_location_providers() {
        let here = debug_location("tokyo_station").unwrap();
        let fixed = FixedLocation(here.clone());
        let got = tokio_test::assert_ok!(tokio_test::block_on(fixed.current_location()));
        assert_eq!(got, here);

        let err = tokio_test::assert_err!(tokio_test::block_on(NoLocation.current_location()));
        assert!(matches!(err, PickError::ExternalLookupFailed { operation: "geolocation", .. }));
    }

    #[tokio::test]
    async fn test_mock_failures_and_defaults() {
        let client = MockMapClient::new().failing_text("bad");
        let origin = Coordinates { lat: 0.0, lng: 0.0 };

        let q = TextQuery {
            query: "bad".to_string(),
            origin,
            radius_meters: 50.0,
            place_type: None,
        };
        assert!(client.text_search(&q).await.is_err());

        let q = NearbyQuery {
            origin,
            radius_meters: None,
            place_type: "cafe".to_string(),
            open_now: false,
        };
        assert!(client.nearby_search(&q).await.unwrap().is_empty());
        assert!(client.route(origin, origin).await.is_err());
        assert_eq!(client.calls().len(), 3);
    }
}
