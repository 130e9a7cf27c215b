//! Environment-driven configuration

use crate::buildings::DEFAULT_MAX_CONCURRENT;
use crate::google_client::DEFAULT_BASE_URL;
use crate::provider::debug_location;
use crate::selection::{DecayFactor, DEFAULT_DECAY_FACTOR};
use crate::types::Location;
use anyhow::{Context, Result};
use std::collections::HashMap;

pub const DEFAULT_PORT: u16 = 8090;

#[derive(Debug, Clone)]
pub struct PickerConfig {
    pub maps_api_key: Option<String>,
    pub maps_base_url: String,
    pub language: String,
    pub region: String,
    pub decay: DecayFactor,
    pub building_fanout: usize,
    pub port: u16,
    pub debug_location: Option<Location>,
}

impl Default for PickerConfig {
    fn default() -> Self {
        Self {
            maps_api_key: None,
            maps_base_url: DEFAULT_BASE_URL.to_string(),
            language: "ja".to_string(),
            region: "JP".to_string(),
            decay: DecayFactor::default(),
            building_fanout: DEFAULT_MAX_CONCURRENT,
            port: DEFAULT_PORT,
            debug_location: None,
        }
    }
}

impl PickerConfig {
    /// Read `PLATEPICK_*` variables from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_vars(std::env::vars().collect())
    }

    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self> {
        let get = |name: &str| vars.get(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let decay = match get("PLATEPICK_DECAY_FACTOR") {
            Some(raw) => {
                let value: f64 = raw.parse().with_context(|| format!("PLATEPICK_DECAY_FACTOR is not a number: {}", raw))?;
                DecayFactor::new(value)?
            }
            None => DecayFactor::new(DEFAULT_DECAY_FACTOR)?,
        };

        let building_fanout = match get("PLATEPICK_BUILDING_FANOUT") {
            Some(raw) => raw
                .parse::<usize>()
                .with_context(|| format!("PLATEPICK_BUILDING_FANOUT is not a count: {}", raw))?
                .max(1),
            None => defaults.building_fanout,
        };

        let port = match get("PLATEPICK_PORT") {
            Some(raw) => raw.parse().with_context(|| format!("PLATEPICK_PORT is not a port: {}", raw))?,
            None => defaults.port,
        };

        let debug_location = match get("PLATEPICK_DEBUG_LOCATION") {
            Some(name) => {
                let loc = debug_location(&name);
                if loc.is_none() {
                    tracing::warn!("Unknown debug location '{}', ignoring", name);
                }
                loc
            }
            None => None,
        };

        Ok(Self {
            maps_api_key: get("PLATEPICK_MAPS_API_KEY"),
            maps_base_url: get("PLATEPICK_MAPS_BASE_URL").unwrap_or(defaults.maps_base_url),
            language: get("PLATEPICK_LANGUAGE").unwrap_or(defaults.language),
            region: get("PLATEPICK_REGION").unwrap_or(defaults.region),
            decay,
            building_fanout,
            port,
            debug_location,
        })
    }
}
