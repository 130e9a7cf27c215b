//! platepick - random restaurant picker
//!
//! Picks one restaurant near a location with:
//! - Randomized search origins to escape provider ranking bias
//! - Rating / open-now / radius filtering
//! - Building-scoped search with bounded fan-out
//! - History-weighted draws so repeat picks become less likely
//! - Walking distance with a straight-line fallback

pub mod types;
pub mod error;
pub mod geo;
pub mod filter;
pub mod selection;
pub mod provider;
pub mod google_client;
pub mod buildings;
pub mod distance;
pub mod address;
pub mod config;
pub mod picker;
pub mod server;

pub use types::*;
pub use error::{PickError, PickResult};
pub use picker::{RestaurantPicker, SharedPicker};
pub use provider::{LocationProvider, MapServiceClient, MockMapClient, FixedLocation};
pub use google_client::GoogleMapsClient;
pub use selection::DecayFactor;
pub use config::PickerConfig;
