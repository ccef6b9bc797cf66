//! Engine - drives a matching run to completion.
//!
//! Wraps the matching engine with the work queue: unmatched applicants
//! are popped front to back, propose down their remaining choices, and
//! anyone bumped along the way rejoins at the back.

use std::collections::VecDeque;

use tracing::{debug, trace, warn};

use crate::config::MatchConfig;
use crate::entity::{Applicant, ApplicantId, Residency};
use crate::error::{MatchError, Result};
use crate::event::ProposalOutcome;
use crate::matching::MatchingEngine;
use crate::registry::Registry;
use crate::stability;

/// Counters collected over one run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MatchStats {
    /// Proposals handed to the matching engine
    pub proposals: u64,
    /// Proposals that produced a tentative match
    pub accepted: u64,
    /// Proposals that were no-ops
    pub rejected: u64,
    /// Incumbents bumped and re-enqueued
    pub evictions: u64,
    /// Applicants matched when the queue drained
    pub matched: usize,
    /// Applicants left unmatched when the queue drained
    pub unmatched: usize,
    /// Applicants never enqueued because they rank nothing
    pub idle_applicants: usize,
    /// Residencies skipped because they have no positions
    pub closed_residencies: usize,
}

impl MatchStats {
    #[inline]
    fn record(&mut self, outcome: &ProposalOutcome) {
        self.proposals += 1;
        match outcome {
            ProposalOutcome::Accepted { displaced, .. } => {
                self.accepted += 1;
                if displaced.is_some() {
                    self.evictions += 1;
                }
            }
            ProposalOutcome::Rejected(_) => self.rejected += 1,
        }
    }
}

/// The run orchestrator. Owns the matching engine (and so the registry)
/// for the lifetime of the run.
pub struct Engine {
    /// The underlying matching engine
    pub matcher: MatchingEngine,
    config: MatchConfig,
}

impl Engine {
    /// Create an engine over an existing registry with default config.
    pub fn new(registry: Registry) -> Self {
        Self::with_config(registry, MatchConfig::default())
    }

    pub fn with_config(registry: Registry, config: MatchConfig) -> Self {
        Self {
            matcher: MatchingEngine::new(registry),
            config,
        }
    }

    /// Register both populations into a registry sized from the
    /// populations, or from `config` if it asks for more.
    pub fn from_populations<A, R>(applicants: A, residencies: R, config: MatchConfig) -> Result<Self>
    where
        A: IntoIterator<Item = Applicant>,
        R: IntoIterator<Item = Residency>,
    {
        let registry = Registry::from_populations_with_capacity(
            applicants,
            residencies,
            config.applicant_capacity,
            config.residency_capacity,
        )?;
        Ok(Self::with_config(registry, config))
    }

    #[inline]
    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    #[inline]
    pub fn registry(&self) -> &Registry {
        &self.matcher.registry
    }

    pub fn into_registry(self) -> Registry {
        self.matcher.into_registry()
    }

    /// Run the match with applicants queued in registration order.
    pub fn run(&mut self) -> Result<MatchStats> {
        let order: Vec<ApplicantId> = self.matcher.registry.applicant_ids().collect();
        self.run_with_order(order)
    }

    /// Run the match with the initial queue in the given order.
    ///
    /// `order` only decides who goes first. Repeated or foreign handles
    /// are dropped, and every registered applicant missing from `order`
    /// is queued after it in registration order.
    ///
    /// Fails with [`MatchError::UnknownResidency`] before touching any
    /// state if an applicant ranks a residency that is not registered.
    pub fn run_with_order<I>(&mut self, order: I) -> Result<MatchStats>
    where
        I: IntoIterator<Item = ApplicantId>,
    {
        self.matcher.registry.validate_references()?;

        let mut stats = MatchStats::default();
        let registry = &self.matcher.registry;

        let mut seen = vec![false; registry.applicant_count()];
        let first: Vec<ApplicantId> = order
            .into_iter()
            .filter(|id| match seen.get_mut(id.index()) {
                Some(slot) if !*slot => {
                    *slot = true;
                    true
                }
                _ => false,
            })
            .collect();
        let rest: Vec<ApplicantId> = registry.applicant_ids().filter(|id| !seen[id.index()]).collect();
        if !rest.is_empty() {
            trace!(missing = rest.len(), "appending applicants absent from the given order");
        }

        let mut queue: VecDeque<ApplicantId> = VecDeque::with_capacity(registry.applicant_count());
        for id in first.into_iter().chain(rest) {
            if registry.applicant(id).preference_order().is_empty() {
                stats.idle_applicants += 1;
            } else {
                queue.push_back(id);
            }
        }
        stats.closed_residencies = registry
            .residencies()
            .filter(|(_, r)| r.total_positions() == 0)
            .count();

        debug!(
            applicants = queue.len(),
            residencies = registry.residency_count() - stats.closed_residencies,
            "starting match run"
        );

        while let Some(id) = queue.pop_front() {
            if self.matcher.registry.applicant(id).is_matched() {
                continue;
            }
            self.propose_down_choices(id, &mut queue, &mut stats)?;
        }

        for (_, applicant) in self.matcher.registry.applicants() {
            if applicant.is_matched() {
                stats.matched += 1;
            } else {
                stats.unmatched += 1;
            }
        }

        debug!(
            proposals = stats.proposals,
            evictions = stats.evictions,
            matched = stats.matched,
            unmatched = stats.unmatched,
            "match run complete"
        );

        if self.config.verify {
            if let Err(violation) = stability::verify(&self.matcher.registry) {
                warn!(%violation, "matching failed verification");
                return Err(MatchError::InvariantViolation(violation));
            }
        }

        Ok(stats)
    }

    /// Walk one applicant's remaining choices until a proposal lands or
    /// the list runs out.
    fn propose_down_choices(
        &mut self,
        id: ApplicantId,
        queue: &mut VecDeque<ApplicantId>,
        stats: &mut MatchStats,
    ) -> Result<()> {
        // The proposer is unmatched, so nothing strikes its choices while
        // it walks them.
        let mut cursor = 0;
        loop {
            let registry = &self.matcher.registry;
            let applicant = registry.applicant(id);
            let Some(choice) = applicant.remaining_choices().get(cursor) else {
                break;
            };
            let residency = registry.residency_id(choice).ok_or_else(|| {
                MatchError::UnknownResidency {
                    applicant: applicant.name().to_owned(),
                    residency: choice.clone(),
                }
            })?;
            cursor += 1;

            if registry.residency(residency).total_positions() == 0 {
                continue;
            }

            let outcome = self.matcher.try_propose(id, residency);
            stats.record(&outcome);

            match outcome {
                ProposalOutcome::Accepted { displaced, .. } => {
                    if let Some(bumped) = displaced {
                        trace!(%bumped, by = %id, %residency, "re-enqueue displaced applicant");
                        queue.push_back(bumped);
                    }
                    break;
                }
                ProposalOutcome::Rejected(reason) => {
                    trace!(applicant = %id, %residency, ?reason, "proposal rejected");
                }
            }
        }
        Ok(())
    }

    /// Compute state hash for determinism testing.
    #[inline]
    pub fn state_hash(&self) -> u64 {
        self.matcher.state_hash()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(Registry::new())
    }
}

/// Run a match over `registry` in place.
///
/// Results are read back from each applicant's tentative match and each
/// residency's assigned applicants.
pub fn run_match(registry: &mut Registry) -> Result<()> {
    let mut engine = Engine::new(std::mem::take(registry));
    let result = engine.run();
    *registry = engine.into_registry();
    result.map(|_| ())
}
