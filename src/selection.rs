//! History-weighted random draw over filtered candidates

use crate::error::{PickError, PickResult};
use crate::types::{Candidate, SelectionHistory};
use rand::seq::{IndexedRandom, SliceRandom};
use rand::Rng;

/// Per-selection multiplicative penalty on a candidate's draw weight
pub const DEFAULT_DECAY_FACTOR: f64 = 0.5;

/// Decay factor validated to lie strictly inside (0, 1)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecayFactor(f64);

impl DecayFactor {
    pub fn new(value: f64) -> PickResult<Self> {
        if value > 0.0 && value < 1.0 {
            Ok(Self(value))
        } else {
            Err(PickError::InvalidDecayFactor(value))
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// `decay ^ times_chosen`
    pub fn weight(&self, times_chosen: u32) -> f64 {
        self.0.powf(f64::from(times_chosen))
    }
}

impl Default for DecayFactor {
    fn default() -> Self {
        Self(DEFAULT_DECAY_FACTOR)
    }
}

/// Draw weight of a candidate given the session history
pub fn candidate_weight(cand: &Candidate, history: &SelectionHistory, decay: DecayFactor) -> f64 {
    decay.weight(history.count(&cand.id))
}

/// Draw one candidate with probability proportional to `decay ^ count`.
///
/// The pool is shuffled first so provider ranking order cannot bias ties.
pub fn select_weighted<R: Rng + ?Sized>(
    candidates: &[Candidate],
    history: &SelectionHistory,
    decay: DecayFactor,
    rng: &mut R,
) -> PickResult<Candidate> {
    if candidates.is_empty() {
        return Err(PickError::NoCandidatesMatched {
            scope: "empty candidate pool".to_string(),
        });
    }

    let mut pool: Vec<&Candidate> = candidates.iter().collect();
    pool.shuffle(rng);

    let weighted: Vec<(&Candidate, f64)> = pool
        .into_iter()
        .map(|c| (c, candidate_weight(c, history, decay)))
        .collect();

    let total: f64 = weighted.iter().map(|(_, w)| w).sum();

    // Very large counts can underflow every weight to zero
    if total > 0.0 && total.is_finite() {
        let mut remaining = rng.random_range(0.0..total);

        for (cand, weight) in &weighted {
            remaining -= weight;
            if remaining <= 0.0 {
                tracing::debug!("Selected {} (weight {:.4} of {:.4})", cand.id, weight, total);
                return Ok((*cand).clone());
            }
        }
    }

    // Zero total, or float drift exhausted the walk
    tracing::debug!("Weighted walk exhausted, falling back to uniform choice");
    let fallback = candidates
        .choose(rng)
        .ok_or_else(|| PickError::NoCandidatesMatched { scope: "empty candidate pool".to_string() })?;
    Ok(fallback.clone())
}
