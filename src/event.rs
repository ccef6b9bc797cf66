//! Proposal outcomes produced by the matching engine.
//!
//! Every proposal either lands (possibly displacing an incumbent) or is
//! rejected for one of a small set of expected reasons. Rejections are
//! normal outcomes and leave all state untouched.

use crate::entity::{ApplicantId, Rank};

/// Why a proposal had no effect
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RejectReason {
    /// The residency does not rank the applicant
    Unranked = 0,
    /// The residency is no longer among the applicant's remaining choices
    NotAChoice = 1,
    /// The applicant already holds a tentative match
    AlreadyMatched = 2,
    /// The residency has no positions at all
    NoCapacity = 3,
    /// The residency is full and its worst holder ranks at least as well
    OutRanked = 4,
}

/// Result of a single proposal
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProposalOutcome {
    /// Applicant tentatively accepted at `rank`
    Accepted {
        rank: Rank,
        /// Incumbent evicted to make room, if the residency was full
        displaced: Option<ApplicantId>,
    },
    /// Proposal was a no-op
    Rejected(RejectReason),
}

impl ProposalOutcome {
    #[inline]
    pub fn is_accepted(&self) -> bool {
        matches!(self, ProposalOutcome::Accepted { .. })
    }

    /// The applicant bumped by this proposal, if any
    #[inline]
    pub fn displaced(&self) -> Option<ApplicantId> {
        match *self {
            ProposalOutcome::Accepted { displaced, .. } => displaced,
            ProposalOutcome::Rejected(_) => None,
        }
    }

    #[inline]
    pub fn reject_reason(&self) -> Option<RejectReason> {
        match *self {
            ProposalOutcome::Rejected(reason) => Some(reason),
            ProposalOutcome::Accepted { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepted_accessors() {
        let outcome = ProposalOutcome::Accepted {
            rank: 1,
            displaced: Some(ApplicantId(7)),
        };
        assert!(outcome.is_accepted());
        assert_eq!(outcome.displaced(), Some(ApplicantId(7)));
        assert_eq!(outcome.reject_reason(), None);
    }

    #[test]
    fn test_rejected_accessors() {
        let outcome = ProposalOutcome::Rejected(RejectReason::OutRanked);
        assert!(!outcome.is_accepted());
        assert_eq!(outcome.displaced(), None);
        assert_eq!(outcome.reject_reason(), Some(RejectReason::OutRanked));
    }
}
