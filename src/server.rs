//! HTTP server for restaurant picking

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::{
    Building, Location, PickError, PickOutcome, PickRequest, RestaurantPicker, SearchMode, SearchSettings,
    SelectionHistory,
};

/// Pick request as sent by the UI. The caller owns `history` and gets the
/// updated copy back in the response.
///
/// `mode` is tagged inline: `{"mode": "radius"}` or
/// `{"mode": "buildings", "buildings": [...]}`.
#[derive(Debug, Deserialize)]
pub struct PickRequestHttp {
    pub origin: Option<Location>,
    #[serde(flatten)]
    pub mode: SearchMode,
    #[serde(default)]
    pub settings: SearchSettings,
    #[serde(default)]
    pub history: SelectionHistory,
}

#[derive(Debug, Deserialize)]
pub struct BuildingsRequestHttp {
    pub origin: Option<Location>,
    pub radius_meters: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct AddressRequestHttp {
    pub origin: Option<Location>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub details: Option<String>,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub provider: String,
}

type HttpError = (StatusCode, Json<ErrorResponse>);

/// Status code for each failure kind
pub fn error_status(e: &PickError) -> StatusCode {
    match e {
        PickError::NoCandidatesMatched { .. } => StatusCode::NOT_FOUND,
        PickError::NoBuildingsSelected | PickError::InvalidDecayFactor(_) => StatusCode::BAD_REQUEST,
        PickError::ExternalLookupFailed { .. } => StatusCode::BAD_GATEWAY,
    }
}

fn to_http_error(e: PickError) -> HttpError {
    let status = error_status(&e);
    if status.is_server_error() {
        error!("Request failed: {:?}", e);
    } else {
        warn!("Request rejected: {}", e);
    }
    let error = match e {
        PickError::NoCandidatesMatched { .. } => "No restaurants matched",
        PickError::NoBuildingsSelected => "No buildings selected",
        PickError::ExternalLookupFailed { .. } => "Map service lookup failed",
        PickError::InvalidDecayFactor(_) => "Invalid configuration",
    };
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
            details: Some(e.to_string()),
        }),
    )
}

fn bad_request(details: String) -> HttpError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: "Invalid request".to_string(),
            details: Some(details),
        }),
    )
}

/// Pick handler
async fn pick_handler(
    State(picker): State<Arc<RestaurantPicker>>,
    Json(req): Json<PickRequestHttp>,
) -> Result<Json<PickOutcome>, HttpError> {
    info!(
        "Received pick request: mode={}, history_size={}",
        match &req.mode {
            SearchMode::Radius => "radius".to_string(),
            SearchMode::Buildings { buildings } => format!("buildings({})", buildings.len()),
        },
        req.history.len()
    );

    if !(req.settings.radius_meters > 0.0) {
        return Err(bad_request(format!("radius_meters must be positive, got {}", req.settings.radius_meters)));
    }

    let origin = picker.resolve_origin(req.origin).await.map_err(to_http_error)?;

    let outcome = picker
        .pick(PickRequest {
            origin,
            mode: req.mode,
            settings: req.settings,
            history: req.history,
        })
        .await
        .map_err(to_http_error)?;

    Ok(Json(outcome))
}

async fn buildings_handler(
    State(picker): State<Arc<RestaurantPicker>>,
    Json(req): Json<BuildingsRequestHttp>,
) -> Result<Json<Vec<Building>>, HttpError> {
    let radius = req.radius_meters.unwrap_or_else(|| SearchSettings::default().radius_meters);
    if !(radius > 0.0) {
        return Err(bad_request(format!("radius_meters must be positive, got {}", radius)));
    }

    let origin = picker.resolve_origin(req.origin).await.map_err(to_http_error)?;
    let buildings = picker.discover_buildings(&origin, radius).await.map_err(to_http_error)?;
    Ok(Json(buildings))
}

async fn address_handler(
    State(picker): State<Arc<RestaurantPicker>>,
    Json(req): Json<AddressRequestHttp>,
) -> Result<Json<Location>, HttpError> {
    let origin = picker.resolve_origin(req.origin).await.map_err(to_http_error)?;
    Ok(Json(picker.label(origin).await))
}

/// Health check handler
async fn health_handler(State(picker): State<Arc<RestaurantPicker>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "platepick".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        provider: picker.provider_name().to_string(),
    })
}

/// Create and configure the HTTP server
pub fn create_router(picker: Arc<RestaurantPicker>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/pick", post(pick_handler))
        .route("/buildings", post(buildings_handler))
        .route("/address", post(address_handler))
        .with_state(picker)
}

/// Run the HTTP server
pub async fn run_server(picker: Arc<RestaurantPicker>, port: u16) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{}", port);
    info!("Starting platepick server on {}", addr);

    let app = create_router(picker);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Candidate, Coordinates, MockMapClient, WalkingInfo};
    use serde_json::{json, Value};

    #[test]
    fn test_error_status_mapping() {
        let none = PickError::NoCandidatesMatched { scope: "within 300m".to_string() };
        assert_eq!(error_status(&none), StatusCode::NOT_FOUND);
        assert_eq!(error_status(&PickError::NoBuildingsSelected), StatusCode::BAD_REQUEST);
        assert_eq!(error_status(&PickError::lookup("route", "DENIED")), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_pick_request_defaults() {
        let req: PickRequestHttp =
            serde_json::from_str(r#"{"mode": "radius", "origin": {"lat": 35.0, "lng": 139.0}}"#).unwrap();
        assert!(matches!(req.mode, SearchMode::Radius));
        assert_eq!(req.settings.radius_meters, 1000.0);
        assert!(req.history.is_empty());

        let req: PickRequestHttp = serde_json::from_str(
            r#"{"mode": "buildings", "buildings": [], "history": {"abc": 2}, "settings": {"open_only": true}}"#,
        )
        .unwrap();
        assert!(matches!(req.mode, SearchMode::Buildings { ref buildings } if buildings.is_empty()));
        assert_eq!(req.history.count("abc"), 2);
        assert!(req.settings.open_only);
        assert_eq!(req.settings.min_rating, 3.5);
    }

    #[test]
    fn test_pick_request_needs_mode() {
        let res: Result<PickRequestHttp, _> = serde_json::from_str(r#"{"origin": {"lat": 35.0, "lng": 139.0}}"#);
        assert!(res.is_err());
        let res: Result<PickRequestHttp, _> = serde_json::from_str(r#"{"mode": "teleport"}"#);
        assert!(res.is_err());
    }

    #[test]
    fn test_http_error_body() {
        let (status, Json(body)) = to_http_error(PickError::NoBuildingsSelected);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.error, "No buildings selected");
        assert!(body.details.unwrap().contains("no buildings"));
    }

    fn diner(id: &str, lat: f64, lng: f64, vicinity: &str, types: &[&str]) -> Candidate {
        Candidate {
            id: id.to_string(),
            name: format!("Place {}", id),
            rating: Some(4.4),
            coordinates: Some(Coordinates { lat, lng }),
            open_now: Some(true),
            vicinity: Some(vicinity.to_string()),
            types: types.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        }
    }

    /// Serve the router on an ephemeral port and return its base URL
    async fn spawn_app() -> String {
        let client = MockMapClient::new()
            .with_nearby("restaurant", vec![diner("r1", 35.6812, 139.7671, "Marunouchi Building 5F", &["restaurant"])])
            .with_nearby("shopping_mall", vec![diner("mall", 35.6812, 139.7672, "Marunouchi", &["shopping_mall"])])
            .with_route(WalkingInfo {
                distance_text: "10 m".to_string(),
                duration_text: "1 min".to_string(),
                approximate: false,
            });
        let picker = RestaurantPicker::new_simple(Arc::new(client)).with_seed(9).shared();
        let app = create_router(picker);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[tokio::test]
    async fn test_pick_route_radius_mode() {
        let base = spawn_app().await;
        let resp = reqwest::Client::new()
            .post(format!("{}/pick", base))
            .json(&json!({
                "mode": "radius",
                "origin": {"lat": 35.6812, "lng": 139.7671},
                "history": {"r1": 1}
            }))
            .send()
            .await
            .unwrap();

        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["result"]["candidate"]["id"], "r1");
        assert_eq!(body["history"]["r1"], 2);
    }

    #[tokio::test]
    async fn test_pick_route_building_mode() {
        let base = spawn_app().await;
        let client = reqwest::Client::new();

        let resp = client
            .post(format!("{}/buildings", base))
            .json(&json!({"origin": {"lat": 35.6812, "lng": 139.7671}, "radius_meters": 500.0}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        let buildings: Value = resp.json().await.unwrap();
        assert_eq!(buildings[0]["id"], "mall");

        let resp = client
            .post(format!("{}/pick", base))
            .json(&json!({
                "mode": "buildings",
                "origin": {"lat": 35.6812, "lng": 139.7671},
                "buildings": buildings
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["history"]["r1"], 1);

        let resp = client
            .post(format!("{}/pick", base))
            .json(&json!({"mode": "buildings", "origin": {"lat": 35.6812, "lng": 139.7671}, "buildings": []}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);
    }
}
