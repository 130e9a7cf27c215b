//! Building-scoped candidate search and building discovery

use crate::error::{PickError, PickResult};
use crate::filter::{filter_candidates, CandidateFilter};
use crate::geo::haversine_meters;
use crate::provider::{MapServiceClient, NearbyQuery, TextQuery};
use crate::types::{Building, Candidate, Location};
use futures::stream::{self, StreamExt};
use futures::FutureExt;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Place types that identify a building worth anchoring a search on
pub const BUILDING_CATEGORIES: [&str; 3] = ["shopping_mall", "department_store", "train_station"];

/// Hints appended to the building name for text search
pub const CUISINE_HINTS: [&str; 3] = ["restaurant", "cafe", "food"];

/// Restaurant lookups around a building stay this close to it
pub const BUILDING_SEARCH_RADIUS_METERS: f64 = 50.0;

/// A result this close to the building's coordinates counts as inside
pub const INSIDE_PROXIMITY_METERS: f64 = 20.0;

pub const DEFAULT_MAX_CONCURRENT: usize = 3;

#[derive(Debug, Clone, Copy)]
enum BranchQuery {
    Nearby,
    Text(&'static str),
}

/// Fans a search out over buildings with a cap on in-flight provider calls
pub struct BuildingAggregator {
    client: Arc<dyn MapServiceClient>,
    max_concurrent: usize,
}

impl BuildingAggregator {
    pub fn new(client: Arc<dyn MapServiceClient>, max_concurrent: usize) -> Self {
        Self {
            client,
            max_concurrent: max_concurrent.max(1),
        }
    }

    /// Restaurants inside any of `buildings`, deduplicated by id (first seen
    /// wins) and filtered by rating/open status.
    pub async fn find_candidates_in_buildings(
        &self,
        buildings: &[Building],
        min_rating: f32,
        open_only: bool,
    ) -> PickResult<Vec<Candidate>> {
        if buildings.is_empty() {
            return Err(PickError::NoBuildingsSelected);
        }

        let branches: Vec<(Building, BranchQuery)> = buildings
            .iter()
            .flat_map(|b| {
                std::iter::once((b.clone(), BranchQuery::Nearby))
                    .chain(CUISINE_HINTS.into_iter().map(move |hint| (b.clone(), BranchQuery::Text(hint))))
            })
            .collect();

        debug!("Building search: {} branches, max {} in flight", branches.len(), self.max_concurrent);

        // Branch futures own their inputs so the whole search stays `Send`.
        // `buffered` keeps branch order so dedup is first-seen by branch.
        let client = self.client.clone();
        let per_branch: Vec<Vec<Candidate>> = stream::iter(branches)
            .map(move |(building, query)| run_branch(client.clone(), building, query, open_only).boxed())
            .buffered(self.max_concurrent)
            .collect()
            .await;

        let merged = dedup_by_id(per_branch.into_iter().flatten());
        if merged.is_empty() {
            return Err(PickError::NoCandidatesMatched {
                scope: format!("nothing found in {} selected buildings", buildings.len()),
            });
        }

        let found = merged.len();
        let filtered = filter_candidates(merged, &CandidateFilter::new(min_rating, open_only));
        info!("Building search: {} unique restaurants, {} after filters", found, filtered.len());

        if filtered.is_empty() {
            return Err(PickError::NoCandidatesMatched {
                scope: describe_filters("in the selected buildings", min_rating, open_only),
            });
        }

        Ok(filtered)
    }

    /// Buildings of the known categories around `origin`, nearest first
    pub async fn discover_buildings(&self, origin: &Location, radius_meters: f64) -> PickResult<Vec<Building>> {
        let here = origin.coordinates();
        let client = self.client.clone();
        let lookups: Vec<futures::future::BoxFuture<'static, (&'static str, PickResult<Vec<Candidate>>)>> = BUILDING_CATEGORIES
            .into_iter()
            .map(move |category| {
                let client = client.clone();
                async move {
                    let res = client
                        .nearby_search(&NearbyQuery {
                            origin: here,
                            radius_meters: Some(radius_meters),
                            place_type: category.to_string(),
                            open_now: false,
                        })
                        .await;
                    (category, res)
                }
                .boxed()
            })
            .collect();
        let per_category: Vec<(&'static str, PickResult<Vec<Candidate>>)> =
            stream::iter(lookups).buffered(self.max_concurrent).collect().await;

        let mut order: Vec<String> = Vec::new();
        let mut by_id: HashMap<String, Building> = HashMap::new();
        let mut failures = 0;

        for (category, res) in per_category {
            let places = match res {
                Ok(p) => p,
                Err(e) => {
                    warn!("Building discovery for {} failed: {}", category, e);
                    failures += 1;
                    continue;
                }
            };

            for place in places {
                let Some(location) = place.coordinates else { continue };
                by_id
                    .entry(place.id.clone())
                    .and_modify(|b| {
                        if !b.category_tags.iter().any(|t| t == category) {
                            b.category_tags.push(category.to_string());
                        }
                    })
                    .or_insert_with(|| {
                        order.push(place.id.clone());
                        Building {
                            id: place.id.clone(),
                            name: place.name.clone(),
                            location,
                            vicinity: place.vicinity.clone().unwrap_or_default(),
                            category_tags: vec![category.to_string()],
                        }
                    });
            }
        }

        if failures == BUILDING_CATEGORIES.len() {
            return Err(PickError::lookup("nearby_search", "all building category searches failed"));
        }

        let mut buildings: Vec<Building> = order.into_iter().filter_map(|id| by_id.remove(&id)).collect();
        buildings.sort_by(|a, b| {
            haversine_meters(here, a.location).total_cmp(&haversine_meters(here, b.location))
        });

        info!("Discovered {} buildings within {}m", buildings.len(), radius_meters);
        Ok(buildings)
    }
}

/// One provider lookup for a building, keeping only results inside it
async fn run_branch(
    client: Arc<dyn MapServiceClient>,
    building: Building,
    query: BranchQuery,
    open_only: bool,
) -> Vec<Candidate> {
    let res = match query {
        BranchQuery::Nearby => {
            client
                .nearby_search(&NearbyQuery {
                    origin: building.location,
                    radius_meters: Some(BUILDING_SEARCH_RADIUS_METERS),
                    place_type: "restaurant".to_string(),
                    open_now: open_only,
                })
                .await
        }
        BranchQuery::Text(hint) => {
            client
                .text_search(&TextQuery {
                    query: building_query(&building, hint),
                    origin: building.location,
                    radius_meters: BUILDING_SEARCH_RADIUS_METERS,
                    place_type: Some("restaurant".to_string()),
                })
                .await
        }
    };

    match res {
        Ok(cands) => cands.into_iter().filter(|c| is_inside(&building, c)).collect(),
        Err(e) => {
            warn!("Building branch {:?} for '{}' failed: {}", query, building.name, e);
            Vec::new()
        }
    }
}

/// Text query for restaurants in a building
pub fn building_query(building: &Building, hint: &str) -> String {
    format!("{} {}", building.name, hint)
}

/// Whether a search result belongs to the building: its address names the
/// building, or it sits within [`INSIDE_PROXIMITY_METERS`] of it.
pub fn is_inside(building: &Building, cand: &Candidate) -> bool {
    let name = building.name.trim().to_lowercase();
    let named = !name.is_empty()
        && [&cand.formatted_address, &cand.vicinity]
            .iter()
            .any(|s| s.as_deref().is_some_and(|s| s.to_lowercase().contains(&name)));

    let close = cand
        .coordinates
        .is_some_and(|c| haversine_meters(building.location, c) <= INSIDE_PROXIMITY_METERS);

    named || close
}

/// Drop repeated ids, keeping the first occurrence
pub fn dedup_by_id(candidates: impl IntoIterator<Item = Candidate>) -> Vec<Candidate> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|c| seen.insert(c.id.clone()))
        .collect()
}

pub(crate) fn describe_filters(scope: &str, min_rating: f32, open_only: bool) -> String {
    if open_only {
        format!("no restaurant rated {:.1} or higher and open now {}", min_rating, scope)
    } else {
        format!("no restaurant rated {:.1} or higher {}", min_rating, scope)
    }
}
