//! HTTP client for the Google Maps web services (Places, Directions, Geocoding)

use crate::error::{PickError, PickResult};
use crate::provider::{MapServiceClient, NearbyQuery, TextQuery};
use crate::types::{Candidate, Coordinates, WalkingInfo};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;

pub const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api";

/// Envelope shared by the Places and Geocoding responses
#[derive(Debug, Deserialize)]
struct ResultsResponse<T> {
    status: String,
    #[serde(default = "Vec::new")]
    results: Vec<T>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaceResult {
    place_id: String,
    name: String,
    #[serde(default)]
    rating: Option<f32>,
    #[serde(default)]
    vicinity: Option<String>,
    #[serde(default)]
    formatted_address: Option<String>,
    #[serde(default)]
    geometry: Option<Geometry>,
    #[serde(default)]
    opening_hours: Option<OpeningHours>,
    #[serde(default)]
    types: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct OpeningHours {
    #[serde(default)]
    open_now: Option<bool>,
    #[serde(default)]
    weekday_text: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    formatted_address: String,
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    status: String,
    #[serde(default)]
    routes: Vec<Route>,
}

#[derive(Debug, Deserialize)]
struct Route {
    legs: Vec<Leg>,
}

#[derive(Debug, Deserialize)]
struct Leg {
    #[serde(default)]
    distance: Option<TextValue>,
    #[serde(default)]
    duration: Option<TextValue>,
}

#[derive(Debug, Deserialize)]
struct TextValue {
    text: String,
}

impl From<PlaceResult> for Candidate {
    fn from(p: PlaceResult) -> Self {
        let (open_now, weekday_hours) = match p.opening_hours {
            Some(h) => (h.open_now, h.weekday_text),
            None => (None, Vec::new()),
        };
        Candidate {
            id: p.place_id,
            name: p.name,
            rating: p.rating,
            coordinates: p.geometry.map(|g| Coordinates { lat: g.location.lat, lng: g.location.lng }),
            open_now,
            vicinity: p.vicinity,
            formatted_address: p.formatted_address,
            weekday_hours,
            types: p.types,
        }
    }
}

/// Google Maps client
pub struct GoogleMapsClient {
    base_url: String,
    api_key: String,
    language: String,
    region: String,
    client: reqwest::Client,
}

impl GoogleMapsClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            language: "ja".to_string(),
            region: "JP".to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_locale(mut self, language: impl Into<String>, region: impl Into<String>) -> Self {
        self.language = language.into();
        self.region = region.into();
        self
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        path: &str,
        params: &[(&str, String)],
    ) -> PickResult<T> {
        let url = format!("{}/{}", self.base_url, path);
        tracing::debug!("{} -> {}", operation, url);

        let mut query: Vec<(&str, String)> = params.to_vec();
        query.push(("key", self.api_key.clone()));

        let response = self
            .client
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|e| PickError::lookup(operation, e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PickError::lookup(operation, e.to_string()))?;

        if !status.is_success() {
            return Err(PickError::lookup(operation, format!("HTTP {}: {}", status, body)));
        }

        serde_json::from_str(&body)
            .map_err(|e| PickError::lookup(operation, format!("invalid response: {} (body: {:.200})", e, body)))
    }

    async fn search_places(
        &self,
        operation: &'static str,
        path: &str,
        params: &[(&str, String)],
    ) -> PickResult<Vec<Candidate>> {
        let resp: ResultsResponse<PlaceResult> = self.get_json(operation, path, params).await?;

        match resp.status.as_str() {
            "OK" => {}
            "ZERO_RESULTS" => return Ok(Vec::new()),
            other => {
                let detail = resp.error_message.map(|m| format!("{}: {}", other, m));
                return Err(PickError::lookup(operation, detail.unwrap_or_else(|| other.to_string())));
            }
        }

        let candidates: Vec<Candidate> = resp.results.into_iter().map(Candidate::from).collect();
        tracing::info!("{}: {} places", operation, candidates.len());
        Ok(candidates)
    }
}

fn latlng(c: Coordinates) -> String {
    format!("{},{}", c.lat, c.lng)
}

#[async_trait]
impl MapServiceClient for GoogleMapsClient {
    fn name(&self) -> &'static str {
        "google_maps"
    }

    async fn nearby_search(&self, query: &NearbyQuery) -> PickResult<Vec<Candidate>> {
        let mut params = vec![
            ("location", latlng(query.origin)),
            ("type", query.place_type.clone()),
            ("language", self.language.clone()),
        ];
        match query.radius_meters {
            Some(r) => params.push(("radius", format!("{}", r.round() as i64))),
            None => params.push(("rankby", "distance".to_string())),
        }
        if query.open_now {
            params.push(("opennow", "true".to_string()));
        }

        self.search_places("nearby_search", "place/nearbysearch/json", &params).await
    }

    async fn text_search(&self, query: &TextQuery) -> PickResult<Vec<Candidate>> {
        let mut params = vec![
            ("query", query.query.clone()),
            ("location", latlng(query.origin)),
            ("radius", format!("{}", query.radius_meters.round() as i64)),
            ("language", self.language.clone()),
            ("region", self.region.clone()),
        ];
        if let Some(ref t) = query.place_type {
            params.push(("type", t.clone()));
        }

        self.search_places("text_search", "place/textsearch/json", &params).await
    }

    async fn route(&self, origin: Coordinates, destination: Coordinates) -> PickResult<WalkingInfo> {
        let params = [
            ("origin", latlng(origin)),
            ("destination", latlng(destination)),
            ("mode", "walking".to_string()),
            ("units", "metric".to_string()),
            ("language", self.language.clone()),
            ("region", self.region.clone()),
        ];
        let resp: DirectionsResponse = self.get_json("route", "directions/json", &params).await?;

        if resp.status != "OK" {
            return Err(PickError::lookup("route", resp.status));
        }

        let leg = resp
            .routes
            .into_iter()
            .next()
            .and_then(|r| r.legs.into_iter().next())
            .ok_or_else(|| PickError::lookup("route", "no route found"))?;

        Ok(WalkingInfo {
            distance_text: leg.distance.map(|d| d.text).unwrap_or_else(|| "unknown".to_string()),
            duration_text: leg.duration.map(|d| d.text).unwrap_or_else(|| "unknown".to_string()),
            approximate: false,
        })
    }

    async fn geocode(&self, location: Coordinates) -> PickResult<String> {
        let params = [
            ("latlng", latlng(location)),
            ("language", self.language.clone()),
            ("region", self.region.clone()),
        ];
        let resp: ResultsResponse<GeocodeResult> = self.get_json("geocode", "geocode/json", &params).await?;

        if resp.status != "OK" {
            return Err(PickError::lookup("geocode", resp.status));
        }

        resp.results
            .into_iter()
            .next()
            .map(|r| r.formatted_address)
            .ok_or_else(|| PickError::lookup("geocode", "no address"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TOKYO: Coordinates = Coordinates { lat: 35.681, lng: 139.767 };

    #[tokio::test]
    async fn test_nearby_search_parses_places() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/place/nearbysearch/json"))
            .and(query_param("type", "restaurant"))
            .and(query_param("radius", "500"))
            .and(query_param("opennow", "true"))
            .and(query_param("key", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "OK",
                "results": [{
                    "place_id": "p1",
                    "name": "Tonkatsu Maisen",
                    "rating": 4.3,
                    "vicinity": "Jingumae 4-8-5",
                    "geometry": {"location": {"lat": 35.668, "lng": 139.709}},
                    "opening_hours": {"open_now": true, "weekday_text": ["Monday: 11:00-22:00"]},
                    "types": ["restaurant", "food"]
                }, {
                    "place_id": "p2",
                    "name": "No Details"
                }]
            })))
            .mount(&server)
            .await;

        let client = GoogleMapsClient::new(server.uri(), "test-key");
        let out = client
            .nearby_search(&NearbyQuery {
                origin: TOKYO,
                radius_meters: Some(500.0),
                place_type: "restaurant".to_string(),
                open_now: true,
            })
            .await
            .unwrap();

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].id, "p1");
        assert_eq!(out[0].rating, Some(4.3));
        assert_eq!(out[0].open_now, Some(true));
        assert_eq!(out[0].weekday_hours.len(), 1);
        assert_eq!(out[0].coordinates, Some(Coordinates { lat: 35.668, lng: 139.709 }));
        assert!(out[1].rating.is_none());
        assert!(out[1].coordinates.is_none());
    }

    #[tokio::test]
    async fn test_zero_results_is_empty() {
        let server = MockServer::start().await;
        Mock::given(path("/place/textsearch/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ZERO_RESULTS", "results": []})))
            .mount(&server)
            .await;

        let client = GoogleMapsClient::new(server.uri(), "k");
        let out = client
            .text_search(&TextQuery {
                query: "Marunouchi Building cafe".to_string(),
                origin: TOKYO,
                radius_meters: 50.0,
                place_type: Some("restaurant".to_string()),
            })
            .await
            .unwrap();
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_denied_status_is_lookup_failure() {
        let server = MockServer::start().await;
        Mock::given(path("/place/nearbysearch/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "REQUEST_DENIED",
                "error_message": "The provided API key is invalid."
            })))
            .mount(&server)
            .await;

        let client = GoogleMapsClient::new(server.uri(), "bad");
        let err = client
            .nearby_search(&NearbyQuery {
                origin: TOKYO,
                radius_meters: None,
                place_type: "restaurant".to_string(),
                open_now: false,
            })
            .await
            .unwrap_err();

        match err {
            PickError::ExternalLookupFailed { operation, status } => {
                assert_eq!(operation, "nearby_search");
                assert!(status.starts_with("REQUEST_DENIED"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_route_walking() {
        let server = MockServer::start().await;
        Mock::given(path("/directions/json"))
            .and(query_param("mode", "walking"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "OK",
                "routes": [{"legs": [{
                    "distance": {"text": "1.2 km", "value": 1200},
                    "duration": {"text": "16 mins", "value": 960}
                }]}]
            })))
            .mount(&server)
            .await;

        let client = GoogleMapsClient::new(server.uri(), "k");
        let info = client.route(TOKYO, Coordinates { lat: 35.676, lng: 139.768 }).await.unwrap();
        assert_eq!(info.distance_text, "1.2 km");
        assert_eq!(info.duration_text, "16 mins");
        assert!(!info.approximate);
    }

    #[tokio::test]
    async fn test_http_error_surfaces() {
        let server = MockServer::start().await;
        Mock::given(path("/geocode/json"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = GoogleMapsClient::new(server.uri(), "k");
        let err = client.geocode(TOKYO).await.unwrap_err();
        assert!(err.to_string().contains("geocode"));
    }

    #[tokio::test]
    async fn test_malformed_body_is_lookup_failure() {
        let server = MockServer::start().await;
        Mock::given(path("/place/textsearch/json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;

        let client = GoogleMapsClient::new(server.uri(), "k");
        let query = TextQuery {
            query: "Marunouchi Building cafe".to_string(),
            origin: TOKYO,
            radius_meters: 50.0,
            place_type: None,
        };
        match client.text_search(&query).await {
            Err(PickError::ExternalLookupFailed { operation, status }) => {
                assert_eq!(operation, "text_search");
                assert!(status.contains("invalid response"));
                assert!(status.contains("maintenance"));
            }
            other => panic!("expected lookup failure, got {:?}", other),
        }
    }
}
