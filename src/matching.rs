//! Matching Engine - the two state transitions of deferred acceptance.
//!
//! 1. PROPOSE: an unmatched applicant asks a residency for a seat; a full
//!    residency may bump its worst holder to make room
//! 2. RELEASE: an applicant leaves a residency and strikes it for good

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use tracing::trace;

use crate::entity::{ApplicantId, Assignment, ResidencyId};
use crate::event::{ProposalOutcome, RejectReason};
use crate::registry::Registry;

/// The matching engine core. Owns the registry exclusively, so every
/// transition sees a consistent applicant/residency pair.
pub struct MatchingEngine {
    pub registry: Registry,
}

impl MatchingEngine {
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }

    /// Give the registry back once the run is over
    pub fn into_registry(self) -> Registry {
        self.registry
    }

    /// Propose `applicant` to `residency`.
    ///
    /// Returns the displaced incumbent, if the proposal bumped one.
    /// A rejected proposal returns `None` and changes nothing.
    #[inline]
    pub fn propose(&mut self, applicant: ApplicantId, residency: ResidencyId) -> Option<ApplicantId> {
        self.try_propose(applicant, residency).displaced()
    }

    /// Propose `applicant` to `residency`, reporting why it failed if it did.
    ///
    /// # Algorithm
    /// 1. Reject if the residency does not rank the applicant
    /// 2. Reject if the residency was struck from the applicant's choices
    /// 3. Reject if the applicant is already matched
    /// 4. If full, reject unless the applicant beats the worst holder,
    ///    in which case the worst holder is released
    /// 5. Accept
    ///
    /// # Panics
    /// Panics if a full residency has no cached worst holder. That state
    /// cannot arise through this engine's transitions.
    pub fn try_propose(&mut self, applicant: ApplicantId, residency: ResidencyId) -> ProposalOutcome {
        let (a, r) = self.registry.pair_mut(applicant, residency);

        let Some(rank) = r.rank_of(a.name()) else {
            return ProposalOutcome::Rejected(RejectReason::Unranked);
        };
        if !a.still_wants(r.name()) {
            return ProposalOutcome::Rejected(RejectReason::NotAChoice);
        }
        if a.is_matched() {
            return ProposalOutcome::Rejected(RejectReason::AlreadyMatched);
        }
        if r.total_positions() == 0 {
            return ProposalOutcome::Rejected(RejectReason::NoCapacity);
        }

        let mut displaced = None;
        if r.is_full() {
            let Some(worst) = r.worst_accepted() else {
                unreachable!("residency {} is full but has no worst accepted entry", r.name());
            };
            if rank >= worst.rank {
                return ProposalOutcome::Rejected(RejectReason::OutRanked);
            }
            displaced = Some(worst.applicant);
        }

        if let Some(incumbent) = displaced {
            let released = self.release(incumbent, residency);
            debug_assert!(released, "worst accepted entry is not a holder");
        }

        let (a, r) = self.registry.pair_mut(applicant, residency);
        a.tentative_match = Some(residency);
        r.positions_available -= 1;
        r.assigned_applicants
            .insert(a.name().to_owned(), Assignment { applicant, rank });
        r.refresh_worst();

        trace!(
            applicant = a.name(),
            residency = r.name(),
            rank,
            positions_available = r.positions_available(),
            "accepted"
        );

        ProposalOutcome::Accepted { rank, displaced }
    }

    /// Remove `applicant` from `residency`.
    ///
    /// Frees one position, clears the tentative match and strikes the
    /// residency from the applicant's remaining choices permanently.
    ///
    /// Returns `false` and changes nothing if `residency` does not hold
    /// `applicant`.
    pub fn release(&mut self, applicant: ApplicantId, residency: ResidencyId) -> bool {
        let (a, r) = self.registry.pair_mut(applicant, residency);
        let on_roster = r
            .assigned_applicants
            .get(a.name())
            .is_some_and(|held| held.applicant == applicant);
        if !on_roster || a.tentative_match != Some(residency) {
            trace!(applicant = a.name(), residency = r.name(), "release ignored, not a holder");
            return false;
        }

        r.positions_available += 1;
        r.assigned_applicants.remove(a.name());
        r.refresh_worst();

        a.tentative_match = None;
        a.strike(r.name());

        trace!(applicant = a.name(), residency = r.name(), "released");
        true
    }

    /// Number of applicants currently holding a tentative match
    pub fn matched_count(&self) -> usize {
        self.registry
            .applicants()
            .filter(|(_, a)| a.is_matched())
            .count()
    }

    /// Compute a hash of the current assignment for determinism testing.
    ///
    /// Depends only on names, so two registries built in different orders
    /// hash equal when they hold the same matching.
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        for (applicant, residency) in self.registry.assignments() {
            applicant.hash(&mut hasher);
            residency.hash(&mut hasher);
        }

        let mut rosters: Vec<_> = self
            .registry
            .residencies()
            .map(|(_, r)| (r.name(), r.positions_available()))
            .collect();
        rosters.sort_unstable();
        rosters.hash(&mut hasher);

        hasher.finish()
    }
}
