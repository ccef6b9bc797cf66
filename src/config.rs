//! Run configuration.

use serde::{Deserialize, Serialize};

/// Knobs for a matching run. Missing fields fall back to [`Default`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Minimum applicant slots to pre-allocate. Zero sizes the registry
    /// from the population alone.
    pub applicant_capacity: usize,
    /// Minimum residency slots to pre-allocate
    pub residency_capacity: usize,
    /// Check invariants and stability once the queue drains and fail the
    /// run with `MatchError::InvariantViolation` if anything is off
    pub verify: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            applicant_capacity: 0,
            residency_capacity: 0,
            verify: cfg!(debug_assertions),
        }
    }
}

impl MatchConfig {
    /// Config sized for a known population
    pub fn for_population(applicants: usize, residencies: usize) -> Self {
        Self {
            applicant_capacity: applicants,
            residency_capacity: residencies,
            ..Self::default()
        }
    }

    pub fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }
}
