//! Rating / open-now / radius predicates over raw provider results

use crate::geo::haversine_meters;
use crate::types::{Candidate, Location};

/// Options for [`filter_candidates`]
#[derive(Debug, Clone)]
pub struct CandidateFilter {
    pub min_rating: f32,
    pub open_only: bool,
    /// Re-constrain results to a radius around the true search origin
    pub radius_check: Option<(Location, f64)>,
}

impl CandidateFilter {
    pub fn new(min_rating: f32, open_only: bool) -> Self {
        Self { min_rating, open_only, radius_check: None }
    }

    pub fn within(mut self, origin: Location, radius_meters: f64) -> Self {
        self.radius_check = Some((origin, radius_meters));
        self
    }

    pub fn accepts(&self, cand: &Candidate) -> bool {
        match cand.rating {
            Some(r) if r >= self.min_rating => {}
            _ => return false,
        }

        // Unknown opening status counts as closed
        if self.open_only && cand.open_now != Some(true) {
            return false;
        }

        if let Some((ref origin, radius)) = self.radius_check {
            match cand.coordinates {
                Some(c) if haversine_meters(origin.coordinates(), c) <= radius => {}
                _ => return false,
            }
        }

        true
    }
}

/// Keep candidates passing every predicate, preserving order
pub fn filter_candidates(candidates: Vec<Candidate>, filter: &CandidateFilter) -> Vec<Candidate> {
    let before = candidates.len();
    let kept: Vec<Candidate> = candidates.into_iter().filter(|c| filter.accepts(c)).collect();
    tracing::debug!("Filter kept {}/{} candidates", kept.len(), before);
    kept
}
