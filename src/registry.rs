//! Registry - arena that owns every entity of a matching run.
//!
//! Applicants and residencies live in two contiguous vectors and are
//! addressed by `u32` handles. Names resolve to handles through
//! `FxHashMap` indexes built at registration, which is also where name
//! uniqueness is enforced.

use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::fmt;

use crate::entity::{Applicant, ApplicantId, Residency, ResidencyId};
use crate::error::{MatchError, Result};

pub struct Registry {
    applicants: Vec<Applicant>,
    residencies: Vec<Residency>,
    applicant_index: FxHashMap<String, ApplicantId>,
    residency_index: FxHashMap<String, ResidencyId>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::with_capacity(0, 0)
    }

    /// Create an empty registry with pre-allocated slots
    pub fn with_capacity(applicants: usize, residencies: usize) -> Self {
        Self {
            applicants: Vec::with_capacity(applicants),
            residencies: Vec::with_capacity(residencies),
            applicant_index: FxHashMap::with_capacity_and_hasher(applicants, Default::default()),
            residency_index: FxHashMap::with_capacity_and_hasher(residencies, Default::default()),
        }
    }

    /// Build a registry from both populations, rejecting duplicate names.
    ///
    /// Registration order is preserved; it is also the initial queue order
    /// of a run.
    pub fn from_populations<A, R>(applicants: A, residencies: R) -> Result<Self>
    where
        A: IntoIterator<Item = Applicant>,
        R: IntoIterator<Item = Residency>,
    {
        Self::from_populations_with_capacity(applicants, residencies, 0, 0)
    }

    /// Like [`Registry::from_populations`], reserving at least the given
    /// number of slots on top of what the iterators report.
    pub fn from_populations_with_capacity<A, R>(
        applicants: A,
        residencies: R,
        applicant_capacity: usize,
        residency_capacity: usize,
    ) -> Result<Self>
    where
        A: IntoIterator<Item = Applicant>,
        R: IntoIterator<Item = Residency>,
    {
        let applicants = applicants.into_iter();
        let residencies = residencies.into_iter();
        let mut registry = Self::with_capacity(
            applicant_capacity.max(applicants.size_hint().0),
            residency_capacity.max(residencies.size_hint().0),
        );

        for residency in residencies {
            registry.add_residency(residency)?;
        }
        for applicant in applicants {
            registry.add_applicant(applicant)?;
        }
        Ok(registry)
    }

    // ========================================================================
    // Registration
    // ========================================================================

    pub fn add_applicant(&mut self, applicant: Applicant) -> Result<ApplicantId> {
        if self.applicant_index.contains_key(applicant.name()) {
            return Err(MatchError::DuplicateApplicant(applicant.name().to_owned()));
        }
        let id = ApplicantId(self.applicants.len() as u32);
        self.applicant_index.insert(applicant.name().to_owned(), id);
        self.applicants.push(applicant);
        Ok(id)
    }

    pub fn add_residency(&mut self, residency: Residency) -> Result<ResidencyId> {
        if self.residency_index.contains_key(residency.name()) {
            return Err(MatchError::DuplicateResidency(residency.name().to_owned()));
        }
        let id = ResidencyId(self.residencies.len() as u32);
        self.residency_index.insert(residency.name().to_owned(), id);
        self.residencies.push(residency);
        Ok(id)
    }

    /// Check that every residency an applicant ranks is registered.
    pub fn validate_references(&self) -> Result<()> {
        for applicant in &self.applicants {
            for residency in applicant.preference_order() {
                if !self.residency_index.contains_key(residency) {
                    return Err(MatchError::UnknownResidency {
                        applicant: applicant.name().to_owned(),
                        residency: residency.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    #[inline]
    pub fn applicant_id(&self, name: &str) -> Option<ApplicantId> {
        self.applicant_index.get(name).copied()
    }

    #[inline]
    pub fn residency_id(&self, name: &str) -> Option<ResidencyId> {
        self.residency_index.get(name).copied()
    }

    /// # Panics
    /// Panics if `id` was not issued by this registry.
    #[inline]
    pub fn applicant(&self, id: ApplicantId) -> &Applicant {
        &self.applicants[id.index()]
    }

    #[inline]
    pub fn applicant_mut(&mut self, id: ApplicantId) -> &mut Applicant {
        &mut self.applicants[id.index()]
    }

    /// # Panics
    /// Panics if `id` was not issued by this registry.
    #[inline]
    pub fn residency(&self, id: ResidencyId) -> &Residency {
        &self.residencies[id.index()]
    }

    #[inline]
    pub fn residency_mut(&mut self, id: ResidencyId) -> &mut Residency {
        &mut self.residencies[id.index()]
    }

    /// Mutable access to both sides of a pairing at once.
    #[inline]
    pub(crate) fn pair_mut(
        &mut self,
        applicant: ApplicantId,
        residency: ResidencyId,
    ) -> (&mut Applicant, &mut Residency) {
        (
            &mut self.applicants[applicant.index()],
            &mut self.residencies[residency.index()],
        )
    }

    pub fn applicant_by_name(&self, name: &str) -> Option<&Applicant> {
        self.applicant_id(name).map(|id| self.applicant(id))
    }

    pub fn residency_by_name(&self, name: &str) -> Option<&Residency> {
        self.residency_id(name).map(|id| self.residency(id))
    }

    pub fn applicant_ids(&self) -> impl Iterator<Item = ApplicantId> {
        (0..self.applicants.len() as u32).map(ApplicantId)
    }

    pub fn residency_ids(&self) -> impl Iterator<Item = ResidencyId> {
        (0..self.residencies.len() as u32).map(ResidencyId)
    }

    pub fn applicants(&self) -> impl Iterator<Item = (ApplicantId, &Applicant)> {
        self.applicant_ids().zip(self.applicants.iter())
    }

    pub fn residencies(&self) -> impl Iterator<Item = (ResidencyId, &Residency)> {
        self.residency_ids().zip(self.residencies.iter())
    }

    #[inline]
    pub fn applicant_count(&self) -> usize {
        self.applicants.len()
    }

    #[inline]
    pub fn residency_count(&self) -> usize {
        self.residencies.len()
    }

    // ========================================================================
    // Results
    // ========================================================================

    /// Name of the residency currently holding `applicant`, if any.
    pub fn match_of(&self, applicant: &str) -> Option<&str> {
        self.applicant_by_name(applicant)?
            .tentative_match()
            .map(|r| self.residency(r).name())
    }

    /// Applicant name -> matched residency name, ordered by applicant name.
    pub fn assignments(&self) -> BTreeMap<String, Option<String>> {
        self.applicants
            .iter()
            .map(|a| {
                let residency = a
                    .tentative_match()
                    .map(|r| self.residency(r).name().to_owned());
                (a.name().to_owned(), residency)
            })
            .collect()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("applicants", &self.applicants.len())
            .field("residencies", &self.residencies.len())
            .finish()
    }
}
