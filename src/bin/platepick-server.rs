//! platepick HTTP server binary

use platepick::{FixedLocation, GoogleMapsClient, MapServiceClient, PickerConfig, RestaurantPicker};
use std::sync::Arc;

mod server {
    pub use platepick::server::*;
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    println!("platepick - random restaurant picker");
    println!("   Version: {}", env!("CARGO_PKG_VERSION"));
    println!();

    let config = PickerConfig::from_env()?;

    // Check for --use-real flag
    let use_real = std::env::args().any(|arg| arg == "--use-real");

    let client: Arc<dyn MapServiceClient> = if use_real {
        let api_key = config
            .maps_api_key
            .clone()
            .ok_or_else(|| anyhow::anyhow!("PLATEPICK_MAPS_API_KEY must be set with --use-real"))?;
        println!("✓ Mode: Google Maps ({})", config.maps_base_url);
        Arc::new(
            GoogleMapsClient::new(config.maps_base_url.clone(), api_key)
                .with_locale(config.language.clone(), config.region.clone()),
        )
    } else {
        println!("✓ Mode: MOCK map service (use --use-real for Google Maps)");
        Arc::new(fixtures::mock_client())
    };

    let mut picker = RestaurantPicker::new(client, config.decay, config.building_fanout);
    if let Some(loc) = config.debug_location.clone() {
        println!("✓ Debug location: ({}, {})", loc.lat, loc.lng);
        picker = picker.with_location_provider(Box::new(FixedLocation(loc)));
    }

    println!("✓ Decay factor: {}", config.decay.value());
    println!("✓ Building fan-out: {}", config.building_fanout);
    println!("✓ Starting HTTP server on port {}...", config.port);
    println!();

    server::run_server(picker.shared(), config.port).await?;

    Ok(())
}

/// Offline data around Tokyo Station
mod fixtures {
    use platepick::{Candidate, Coordinates, MockMapClient, WalkingInfo};

    fn place(id: &str, name: &str, rating: f32, lat: f64, lng: f64, vicinity: &str, types: &[&str]) -> Candidate {
        Candidate {
            id: id.to_string(),
            name: name.to_string(),
            rating: Some(rating),
            coordinates: Some(Coordinates { lat, lng }),
            open_now: Some(true),
            vicinity: Some(vicinity.to_string()),
            formatted_address: None,
            weekday_hours: vec![],
            types: types.iter().map(|t| t.to_string()).collect(),
        }
    }

    pub fn mock_client() -> MockMapClient {
        let restaurants = vec![
            place("mock-sushi", "Sushi Tsubomi", 4.4, 35.6809, 139.7655, "Marunouchi Building 35F", &["restaurant"]),
            place("mock-ramen", "Rokurinsha", 4.1, 35.6805, 139.7690, "Tokyo Station Ramen Street", &["restaurant"]),
            place("mock-tonkatsu", "Katsukura", 3.9, 35.6820, 139.7640, "Shin-Marunouchi Building 5F", &["restaurant"]),
            place("mock-cafe", "Marunouchi Cafe", 3.6, 35.6790, 139.7660, "Marunouchi 2-chome", &["cafe", "restaurant"]),
            place("mock-soba", "Kanda Matsuya", 4.3, 35.6930, 139.7700, "Kanda Sudacho", &["restaurant"]),
        ];

        let buildings = vec![
            place("mock-marubiru", "Marunouchi Building", 4.2, 35.6810, 139.7640, "2-4-1 Marunouchi", &["shopping_mall"]),
            place("mock-daimaru", "Daimaru Tokyo", 4.0, 35.6818, 139.7680, "1-9-1 Marunouchi", &["department_store"]),
        ];
        let stations = vec![
            place("mock-tokyo-st", "Tokyo Station", 4.3, 35.6812, 139.7671, "Marunouchi", &["train_station"]),
        ];

        MockMapClient::new()
            .with_nearby("restaurant", restaurants.clone())
            .with_nearby("shopping_mall", buildings.clone())
            .with_nearby("department_store", buildings)
            .with_nearby("train_station", stations)
            .with_text("Marunouchi Building restaurant", restaurants.clone())
            .with_text("Tokyo Station restaurant", restaurants)
            .with_route(WalkingInfo {
                distance_text: "350 m".to_string(),
                duration_text: "5 mins".to_string(),
                approximate: false,
            })
            .with_address("日本、〒100-0005 東京都千代田区丸の内１丁目")
    }
}
