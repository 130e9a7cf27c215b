//! Core type definitions for restaurant picking

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A point on the globe, optionally labeled with a human-readable address
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lng: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl Location {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng, address: None }
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates { lat: self.lat, lng: self.lng }
    }
}

/// Bare lat/lng pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl From<Coordinates> for Location {
    fn from(c: Coordinates) -> Self {
        Location::new(c.lat, c.lng)
    }
}

/// Raw place returned by a provider search
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,               // provider place id, dedup key
    pub name: String,
    #[serde(default)]
    pub rating: Option<f32>,
    #[serde(default)]
    pub coordinates: Option<Coordinates>,
    #[serde(default)]
    pub open_now: Option<bool>,
    #[serde(default)]
    pub vicinity: Option<String>,
    #[serde(default)]
    pub formatted_address: Option<String>,
    #[serde(default)]
    pub weekday_hours: Vec<String>,
    #[serde(default)]
    pub types: Vec<String>,
}

/// Anchor building chosen by the user for a building-scoped search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Building {
    pub id: String,
    pub name: String,
    pub location: Coordinates,
    pub vicinity: String,
    #[serde(default)]
    pub category_tags: Vec<String>,
}

impl Building {
    pub fn kind(&self) -> BuildingKind {
        BuildingKind::from_tags(&self.category_tags)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingKind {
    ShoppingMall,
    DepartmentStore,
    Station,
    Other,
}

impl BuildingKind {
    pub fn from_tags(tags: &[String]) -> Self {
        let has = |t: &str| tags.iter().any(|x| x == t);
        if has("shopping_mall") {
            BuildingKind::ShoppingMall
        } else if has("department_store") {
            BuildingKind::DepartmentStore
        } else if has("train_station") {
            BuildingKind::Station
        } else {
            BuildingKind::Other
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BuildingKind::ShoppingMall => "shopping mall",
            BuildingKind::DepartmentStore => "department store",
            BuildingKind::Station => "station",
            BuildingKind::Other => "building",
        }
    }
}

/// Per-session count of how often each candidate id has been chosen.
///
/// Treated as a value: a completed selection produces a new history via
/// [`SelectionHistory::with_selection`] and the caller replaces its copy.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SelectionHistory {
    counts: HashMap<String, u32>,
}

impl SelectionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, id: &str) -> u32 {
        self.counts.get(id).copied().unwrap_or(0)
    }

    /// History with `id` counted once more
    pub fn with_selection(&self, id: &str) -> Self {
        let mut counts = self.counts.clone();
        let count = counts.entry(id.to_string()).or_insert(0);
        *count = count.saturating_add(1);
        Self { counts }
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl FromIterator<(String, u32)> for SelectionHistory {
    fn from_iter<T: IntoIterator<Item = (String, u32)>>(iter: T) -> Self {
        Self { counts: iter.into_iter().collect() }
    }
}

/// Walking distance/duration annotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalkingInfo {
    pub distance_text: String,
    pub duration_text: String,
    /// True when computed from straight-line distance instead of a route
    pub approximate: bool,
}

/// Final answer of one pick
#[derive(Debug, Clone, Serialize)]
pub struct SelectionResult {
    pub candidate: Candidate,
    pub walking_distance_text: Option<String>,
    pub walking_duration_text: Option<String>,
    pub distance_is_approximate: bool,
    pub maps_url: String,
}

/// User-facing search knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSettings {
    #[serde(default = "default_radius")]
    pub radius_meters: f64,
    #[serde(default = "default_min_rating")]
    pub min_rating: f32,
    #[serde(default)]
    pub open_only: bool,
}

fn default_radius() -> f64 {
    1000.0
}

fn default_min_rating() -> f32 {
    3.5
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            radius_meters: default_radius(),
            min_rating: default_min_rating(),
            open_only: false,
        }
    }
}

/// Radius choices offered to users
pub const RADIUS_PRESETS_METERS: [f64; 6] = [300.0, 500.0, 750.0, 1000.0, 2000.0, 5000.0];

/// Where the candidate pool comes from
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SearchMode {
    Radius,
    Buildings { buildings: Vec<Building> },
}

impl Default for SearchMode {
    fn default() -> Self {
        SearchMode::Radius
    }
}

/// One selection call
#[derive(Debug, Clone)]
pub struct PickRequest {
    pub origin: Location,
    pub mode: SearchMode,
    pub settings: SearchSettings,
    pub history: SelectionHistory,
}

/// Selection plus the history the caller should keep from now on
#[derive(Debug, Clone, Serialize)]
pub struct PickOutcome {
    pub result: SelectionResult,
    pub history: SelectionHistory,
}
