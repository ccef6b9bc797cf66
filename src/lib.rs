//! # Residency-Match
//!
//! A capacitated deferred-acceptance (Gale-Shapley) matching engine for
//! two-sided markets with quotas: applicants propose, residencies hold up
//! to their capacity and bump their least preferred holder when someone
//! better arrives.
//!
//! ## Design Principles
//!
//! - **Single-Writer**: one engine owns the registry exclusively (no locks)
//! - **Handles, not pointers**: applicants and residencies reference each
//!   other through `u32` handles into an arena
//! - **O(1) rank lookup**: each residency indexes its ranking once at construction
//! - **Rejections are outcomes**: only malformed input is an error
//!
//! ## Architecture
//!
//! ```text
//! [Work Queue] --> [Engine] --> [MatchingEngine::propose] --> [Registry]
//!      ^                                 |
//!      +------- displaced applicant -----+
//! ```

pub mod config;
pub mod engine;
pub mod entity;
pub mod error;
pub mod event;
pub mod matching;
pub mod registry;
pub mod stability;

// Re-exports for convenience
pub use config::MatchConfig;
pub use engine::{run_match, Engine, MatchStats};
pub use entity::{Applicant, ApplicantId, Assignment, Rank, Residency, ResidencyId};
pub use error::MatchError;
pub use event::{ProposalOutcome, RejectReason};
pub use matching::MatchingEngine;
pub use registry::Registry;
pub use stability::{blocking_pairs, check_invariants, verify, BlockingPair, Violation};
