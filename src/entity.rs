//! Applicant and Residency entities.
//!
//! Both are plain state holders. Cross references between them are
//! handles into the [`Registry`](crate::registry::Registry), never owning
//! pointers, so an applicant and the residency holding it can both be
//! mutated during a run.

use rustc_hash::FxHashMap;
use std::fmt;

/// Position of an applicant within a residency's ranking (0 = most preferred).
pub type Rank = u32;

/// Stable handle to an applicant inside a registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ApplicantId(pub(crate) u32);

/// Stable handle to a residency inside a registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResidencyId(pub(crate) u32);

impl ApplicantId {
    /// Raw slot index in the registry.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl ResidencyId {
    /// Raw slot index in the registry.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ApplicantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "applicant#{}", self.0)
    }
}

impl fmt::Display for ResidencyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "residency#{}", self.0)
    }
}

// ============================================================================
// Applicant
// ============================================================================

/// One side of the market: ranks residencies and proposes to them.
#[derive(Clone, Debug)]
pub struct Applicant {
    name: String,
    /// Original ranking, best first. Never mutated.
    preference_order: Vec<String>,
    /// Residencies not yet struck, consumed front to back.
    pub(crate) remaining_choices: Vec<String>,
    /// Residency currently holding this applicant
    pub(crate) tentative_match: Option<ResidencyId>,
}

impl Applicant {
    /// Create an unmatched applicant from its ranked residency names.
    pub fn new<S, I>(name: impl Into<String>, preferences: I) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = S>,
    {
        let preference_order: Vec<String> = preferences.into_iter().map(Into::into).collect();
        Self {
            name: name.into(),
            remaining_choices: preference_order.clone(),
            preference_order,
            tentative_match: None,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn preference_order(&self) -> &[String] {
        &self.preference_order
    }

    #[inline]
    pub fn remaining_choices(&self) -> &[String] {
        &self.remaining_choices
    }

    #[inline]
    pub fn tentative_match(&self) -> Option<ResidencyId> {
        self.tentative_match
    }

    #[inline]
    pub fn is_matched(&self) -> bool {
        self.tentative_match.is_some()
    }

    /// Returns true if `residency` is still among the remaining choices.
    #[inline]
    pub fn still_wants(&self, residency: &str) -> bool {
        self.remaining_choices.iter().any(|r| r == residency)
    }

    /// Position of `residency` in the original preference order.
    pub fn preference_rank(&self, residency: &str) -> Option<Rank> {
        self.preference_order
            .iter()
            .position(|r| r == residency)
            .map(|p| p as Rank)
    }

    /// Permanently strike every occurrence of `residency` from the
    /// remaining choices.
    pub(crate) fn strike(&mut self, residency: &str) {
        self.remaining_choices.retain(|r| r != residency);
    }
}

// ============================================================================
// Residency
// ============================================================================

/// A roster entry: who holds the seat and how the residency ranked them.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Assignment {
    pub applicant: ApplicantId,
    pub rank: Rank,
}

/// The other side of the market: ranks applicants and holds up to
/// `total_positions` of them at a time.
#[derive(Clone, Debug)]
pub struct Residency {
    name: String,
    /// Ranked applicant names, best first. Unlisted applicants are unacceptable.
    applicant_ranking: Vec<String>,
    /// Name -> rank, built once so proposals never scan the ranking.
    rank_index: FxHashMap<String, Rank>,
    total_positions: u32,
    pub(crate) positions_available: u32,
    /// Current roster keyed by applicant name
    pub(crate) assigned_applicants: FxHashMap<String, Assignment>,
    /// Largest-rank roster entry. `Some` whenever the roster is non-empty.
    pub(crate) worst_accepted: Option<Assignment>,
}

impl Residency {
    /// Create an empty residency from its ranked applicant names and capacity.
    ///
    /// A name listed more than once keeps its first (best) rank.
    pub fn new<S, I>(name: impl Into<String>, ranking: I, total_positions: u32) -> Self
    where
        S: Into<String>,
        I: IntoIterator<Item = S>,
    {
        let applicant_ranking: Vec<String> = ranking.into_iter().map(Into::into).collect();

        let mut rank_index =
            FxHashMap::with_capacity_and_hasher(applicant_ranking.len(), Default::default());
        for (rank, applicant) in applicant_ranking.iter().enumerate() {
            rank_index.entry(applicant.clone()).or_insert(rank as Rank);
        }

        Self {
            name: name.into(),
            applicant_ranking,
            rank_index,
            total_positions,
            positions_available: total_positions,
            assigned_applicants: FxHashMap::with_capacity_and_hasher(
                total_positions as usize,
                Default::default(),
            ),
            worst_accepted: None,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn applicant_ranking(&self) -> &[String] {
        &self.applicant_ranking
    }

    /// O(1) rank lookup. `None` means the applicant is unacceptable.
    #[inline]
    pub fn rank_of(&self, applicant: &str) -> Option<Rank> {
        self.rank_index.get(applicant).copied()
    }

    #[inline]
    pub fn total_positions(&self) -> u32 {
        self.total_positions
    }

    #[inline]
    pub fn positions_available(&self) -> u32 {
        self.positions_available
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.positions_available == 0
    }

    #[inline]
    pub fn assigned_applicants(&self) -> &FxHashMap<String, Assignment> {
        &self.assigned_applicants
    }

    #[inline]
    pub fn holds(&self, applicant: &str) -> bool {
        self.assigned_applicants.contains_key(applicant)
    }

    #[inline]
    pub fn worst_accepted(&self) -> Option<Assignment> {
        self.worst_accepted
    }

    /// Roster names sorted best rank first.
    pub fn roster(&self) -> Vec<&str> {
        let mut entries: Vec<_> = self.assigned_applicants.iter().collect();
        entries.sort_by_key(|(_, a)| a.rank);
        entries.into_iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Recompute the cached worst entry from the roster.
    pub(crate) fn refresh_worst(&mut self) {
        self.worst_accepted = self
            .assigned_applicants
            .values()
            .copied()
            .max_by_key(|a| a.rank);
    }
}
