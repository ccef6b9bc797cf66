//! Verification of a matching: bookkeeping invariants and stability.
//!
//! These checks read the registry only. They are used by the engine's
//! optional post-run verification and by the test suites.

use std::fmt;

use thiserror::Error;

use crate::registry::Registry;

/// An applicant/residency pair that would both rather be matched to each other
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockingPair {
    pub applicant: String,
    pub residency: String,
}

impl fmt::Display for BlockingPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} and {}", self.applicant, self.residency)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    #[error("residency {residency} holds {assigned} applicants but has {total} positions")]
    OverCapacity {
        residency: String,
        assigned: usize,
        total: u32,
    },

    #[error("residency {residency} reports {available} open positions, expected {expected}")]
    PositionsMismatch {
        residency: String,
        available: u32,
        expected: u32,
    },

    #[error("applicant {applicant} points at {residency} which does not hold them")]
    DanglingMatch { applicant: String, residency: String },

    #[error("residency {residency} holds {applicant} who is not matched to it")]
    OrphanedAssignment { applicant: String, residency: String },

    #[error("applicant {applicant} is matched to {residency} without mutual ranking")]
    Unacceptable { applicant: String, residency: String },

    #[error("residency {residency} caches a stale worst accepted entry")]
    StaleWorst { residency: String },

    #[error("blocking pair: {0}")]
    Blocking(BlockingPair),
}

/// Check the bookkeeping invariants of every entity.
///
/// Holds at every point of a run, not only at the end.
pub fn check_invariants(registry: &Registry) -> Vec<Violation> {
    let mut violations = Vec::new();

    for (id, residency) in registry.residencies() {
        let assigned = residency.assigned_applicants().len();
        let total = residency.total_positions();

        if assigned > total as usize {
            violations.push(Violation::OverCapacity {
                residency: residency.name().to_owned(),
                assigned,
                total,
            });
        } else if residency.positions_available() as usize != total as usize - assigned {
            violations.push(Violation::PositionsMismatch {
                residency: residency.name().to_owned(),
                available: residency.positions_available(),
                expected: total - assigned as u32,
            });
        }

        let expected_worst = residency
            .assigned_applicants()
            .values()
            .copied()
            .max_by_key(|a| a.rank);
        if residency.worst_accepted() != expected_worst {
            violations.push(Violation::StaleWorst {
                residency: residency.name().to_owned(),
            });
        }

        for (name, assignment) in residency.assigned_applicants() {
            let applicant = registry.applicant(assignment.applicant);
            if applicant.name() != name || applicant.tentative_match() != Some(id) {
                violations.push(Violation::OrphanedAssignment {
                    applicant: name.clone(),
                    residency: residency.name().to_owned(),
                });
            }
        }
    }

    for (_, applicant) in registry.applicants() {
        let Some(matched) = applicant.tentative_match() else {
            continue;
        };
        let residency = registry.residency(matched);

        if !residency.holds(applicant.name()) {
            violations.push(Violation::DanglingMatch {
                applicant: applicant.name().to_owned(),
                residency: residency.name().to_owned(),
            });
        }
        if residency.rank_of(applicant.name()).is_none()
            || applicant.preference_rank(residency.name()).is_none()
        {
            violations.push(Violation::Unacceptable {
                applicant: applicant.name().to_owned(),
                residency: residency.name().to_owned(),
            });
        }
    }

    violations
}

/// Find every blocking pair in the current matching.
///
/// A pair blocks when the applicant ranks the residency above its current
/// match (or is unmatched) and the residency ranks the applicant and
/// either has a free position or ranks the applicant above its worst holder.
pub fn blocking_pairs(registry: &Registry) -> Vec<BlockingPair> {
    let mut pairs = Vec::new();

    for (_, applicant) in registry.applicants() {
        let current = applicant
            .tentative_match()
            .map(|r| registry.residency(r).name());

        for preferred in applicant.preference_order() {
            if Some(preferred.as_str()) == current {
                break;
            }
            let Some(residency) = registry.residency_by_name(preferred) else {
                continue;
            };
            let Some(rank) = residency.rank_of(applicant.name()) else {
                continue;
            };
            if residency.total_positions() == 0 {
                continue;
            }

            let blocks = if residency.is_full() {
                residency.worst_accepted().is_some_and(|w| rank < w.rank)
            } else {
                true
            };
            if blocks {
                pairs.push(BlockingPair {
                    applicant: applicant.name().to_owned(),
                    residency: residency.name().to_owned(),
                });
            }
        }
    }

    pairs.sort();
    pairs.dedup();
    pairs
}

/// Run every check, returning the first violation found.
pub fn verify(registry: &Registry) -> Result<(), Violation> {
    if let Some(violation) = check_invariants(registry).into_iter().next() {
        return Err(violation);
    }
    match blocking_pairs(registry).into_iter().next() {
        Some(pair) => Err(Violation::Blocking(pair)),
        None => Ok(()),
    }
}
