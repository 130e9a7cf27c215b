//! Human-readable labels for a location via reverse geocoding

use crate::provider::MapServiceClient;
use crate::types::Location;
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, warn};

static POSTAL_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"〒\d{3}-\d{4}\s*").expect("valid regex"));
static COUNTRY_PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^日本、").expect("valid regex"));
static COUNTRY_EN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Japan,?\s*").expect("valid regex"));

/// Strip postal code and country noise from a provider address
pub fn clean_address(raw: &str) -> String {
    let s = POSTAL_CODE.replace(raw, "");
    let s = COUNTRY_PREFIX.replace(&s, "");
    let s = COUNTRY_EN.replace(&s, "");
    s.trim().to_string()
}

/// Attach an address to `location`. Lookup failures leave it unlabeled.
pub async fn label_location(client: &dyn MapServiceClient, location: Location) -> Location {
    match client.geocode(location.coordinates()).await {
        Ok(raw) => {
            let cleaned = clean_address(&raw);
            debug!("Geocoded ({}, {}) -> {}", location.lat, location.lng, cleaned);
            if cleaned.is_empty() {
                location
            } else {
                Location { address: Some(cleaned), ..location }
            }
        }
        Err(e) => {
            warn!("Reverse geocoding failed: {}", e);
            location
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockMapClient;

    #[test]
    fn test_clean_japanese_address() {
        assert_eq!(clean_address("日本、〒100-0005 東京都千代田区丸の内１丁目"), "東京都千代田区丸の内１丁目");
        assert_eq!(clean_address("〒150-0043 東京都渋谷区道玄坂"), "東京都渋谷区道玄坂");
    }

    #[test]
    fn test_clean_english_address() {
        assert_eq!(clean_address("1 Chome Marunouchi, Chiyoda City, Tokyo 100-0005, Japan"),
            "1 Chome Marunouchi, Chiyoda City, Tokyo 100-0005,");
        assert_eq!(clean_address("Japan, Tokyo"), "Tokyo");
    }

    #[tokio::test]
    async fn test_label_location() {
        let client = MockMapClient::new().with_address("日本、〒100-0005 東京都千代田区丸の内");
        let labeled = label_location(&client, Location::new(35.68, 139.76)).await;
        assert_eq!(labeled.address.as_deref(), Some("東京都千代田区丸の内"));

        let unlabeled = label_location(&MockMapClient::new(), Location::new(35.68, 139.76)).await;
        assert!(unlabeled.address.is_none());
    }
}
