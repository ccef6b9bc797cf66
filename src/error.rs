//! Error types for registration and matching runs.
//!
//! Expected proposal rejections are not errors; they surface as
//! [`ProposalOutcome::Rejected`](crate::event::ProposalOutcome::Rejected).

use thiserror::Error;

use crate::stability::Violation;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatchError {
    #[error("duplicate applicant name: {0}")]
    DuplicateApplicant(String),

    #[error("duplicate residency name: {0}")]
    DuplicateResidency(String),

    #[error("applicant {applicant} ranks unknown residency {residency}")]
    UnknownResidency { applicant: String, residency: String },

    #[error("invariant violated after matching: {0}")]
    InvariantViolation(Violation),
}

pub type Result<T> = std::result::Result<T, MatchError>;
