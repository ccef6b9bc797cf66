//! Stress Tests - Push the engine to its limits.
//!
//! These tests verify correctness under extreme conditions:
//! - Large markets near full capacity
//! - Worst-case eviction chains at a single residency
//! - Degenerate markets (nothing acceptable, no capacity, unlimited capacity)

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use residency_match::{blocking_pairs, check_invariants, Applicant, Engine, MatchConfig, Residency};

fn names(prefix: &str, count: usize) -> Vec<String> {
    (0..count).map(|i| format!("{prefix}{i}")).collect()
}

fn run(applicants: Vec<Applicant>, residencies: Vec<Residency>) -> Engine {
    let config = MatchConfig::for_population(applicants.len(), residencies.len()).with_verify(true);
    let mut engine = Engine::from_populations(applicants, residencies, config).unwrap();
    engine.run().unwrap();
    engine
}

// ============================================================================
// Capacity Stress Tests
// ============================================================================

#[test]
fn test_large_market_is_stable() {
    const APPLICANTS: usize = 3_000;
    const RESIDENCIES: usize = 150;
    const SEATS: u32 = 18;
    let mut rng = ChaCha8Rng::seed_from_u64(0x5EED);

    let applicant_names = names("A", APPLICANTS);
    let residency_names = names("R", RESIDENCIES);

    let applicants: Vec<Applicant> = applicant_names
        .iter()
        .map(|name| {
            let prefs: Vec<String> = residency_names.choose_multiple(&mut rng, 15).cloned().collect();
            Applicant::new(name.clone(), prefs)
        })
        .collect();
    let residencies: Vec<Residency> = residency_names
        .iter()
        .map(|name| {
            let mut ranking = applicant_names.clone();
            ranking.shuffle(&mut rng);
            Residency::new(name.clone(), ranking, SEATS)
        })
        .collect();

    let engine = run(applicants, residencies);
    let registry = engine.registry();

    assert!(check_invariants(registry).is_empty());
    assert!(blocking_pairs(registry).is_empty());

    let filled: usize = registry
        .residencies()
        .map(|(_, r)| r.assigned_applicants().len())
        .sum();
    assert!(filled <= RESIDENCIES * SEATS as usize);
    assert_eq!(filled, engine.matcher.matched_count());
}

#[test]
fn test_capacity_exactly_matches_demand() {
    const COUNT: usize = 500;
    let applicant_names = names("A", COUNT);

    let applicants = applicant_names
        .iter()
        .map(|name| Applicant::new(name.clone(), ["Only"]))
        .collect();
    let residencies = vec![Residency::new("Only", applicant_names.clone(), COUNT as u32)];

    let engine = run(applicants, residencies);
    let only = engine.registry().residency_by_name("Only").unwrap();

    assert_eq!(only.assigned_applicants().len(), COUNT);
    assert_eq!(only.positions_available(), 0);
    assert_eq!(only.worst_accepted().map(|w| w.rank), Some(COUNT as u32 - 1));
}

// ============================================================================
// Eviction Chains
// ============================================================================

#[test]
fn test_worst_case_eviction_chain() {
    // Applicants arrive worst first, so every arrival bumps the holder.
    const COUNT: usize = 1_000;
    let applicant_names = names("A", COUNT);

    let applicants: Vec<Applicant> = applicant_names
        .iter()
        .rev()
        .map(|name| Applicant::new(name.clone(), ["Hot", "Fallback"]))
        .collect();
    let residencies = vec![
        Residency::new("Hot", applicant_names.clone(), 1),
        Residency::new("Fallback", applicant_names.clone(), 1),
    ];

    let config = MatchConfig::default().with_verify(true);
    let mut engine = Engine::from_populations(applicants, residencies, config).unwrap();
    let stats = engine.run().unwrap();
    let registry = engine.registry();

    assert_eq!(registry.match_of("A0"), Some("Hot"));
    assert_eq!(registry.match_of("A1"), Some("Fallback"));
    assert_eq!(stats.matched, 2);
    assert_eq!(stats.unmatched, COUNT - 2);
    assert!(stats.evictions >= (COUNT - 1) as u64);
}

#[test]
fn test_shared_preferences_serial_dictatorship() {
    // Everyone agrees on everything: the best applicants fill the best
    // residencies in order.
    const APPLICANTS: usize = 60;
    const RESIDENCIES: usize = 6;
    const SEATS: u32 = 5;
    let applicant_names = names("A", APPLICANTS);
    let residency_names = names("R", RESIDENCIES);

    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let mut arrival = applicant_names.clone();
    arrival.shuffle(&mut rng);

    let applicants = arrival
        .iter()
        .map(|name| Applicant::new(name.clone(), residency_names.clone()))
        .collect();
    let residencies = residency_names
        .iter()
        .map(|name| Residency::new(name.clone(), applicant_names.clone(), SEATS))
        .collect();

    let engine = run(applicants, residencies);
    let registry = engine.registry();

    for (i, name) in applicant_names.iter().enumerate() {
        let expected = residency_names.get(i / SEATS as usize).map(String::as_str);
        assert_eq!(registry.match_of(name), expected, "applicant {}", name);
    }
}

// ============================================================================
// Degenerate Markets
// ============================================================================

#[test]
fn test_nothing_acceptable() {
    let applicant_names = names("A", 100);
    let applicants: Vec<Applicant> = applicant_names
        .iter()
        .map(|name| Applicant::new(name.clone(), ["R0", "R1"]))
        .collect();
    let residencies = vec![
        Residency::new("R0", Vec::<String>::new(), 10),
        Residency::new("R1", ["Stranger"], 10),
    ];

    let mut engine = Engine::from_populations(applicants, residencies, MatchConfig::default()).unwrap();
    let stats = engine.run().unwrap();

    assert_eq!(stats.matched, 0);
    assert_eq!(stats.accepted, 0);
    assert_eq!(stats.rejected, 200);
    // Rejection without acceptance strikes nothing
    let first = engine.registry().applicant_by_name("A0").unwrap();
    assert_eq!(first.remaining_choices(), ["R0", "R1"]);
}

#[test]
fn test_all_residencies_closed() {
    let applicant_names = names("A", 50);
    let applicants: Vec<Applicant> = applicant_names
        .iter()
        .map(|name| Applicant::new(name.clone(), ["R0", "R1"]))
        .collect();
    let residencies = vec![
        Residency::new("R0", applicant_names.clone(), 0),
        Residency::new("R1", applicant_names.clone(), 0),
    ];

    let mut engine = Engine::from_populations(applicants, residencies, MatchConfig::default()).unwrap();
    let stats = engine.run().unwrap();

    assert_eq!(stats.proposals, 0);
    assert_eq!(stats.closed_residencies, 2);
    assert_eq!(stats.unmatched, 50);
}

#[test]
fn test_unlimited_capacity_gives_everyone_first_choice() {
    const APPLICANTS: usize = 1_000;
    let applicant_names = names("A", APPLICANTS);
    let residency_names = names("R", 10);
    let mut rng = ChaCha8Rng::seed_from_u64(5);

    let applicants: Vec<Applicant> = applicant_names
        .iter()
        .map(|name| {
            let mut prefs = residency_names.clone();
            prefs.shuffle(&mut rng);
            Applicant::new(name.clone(), prefs)
        })
        .collect();
    let firsts: Vec<String> = applicants.iter().map(|a| a.preference_order()[0].clone()).collect();
    let residencies = residency_names
        .iter()
        .map(|name| Residency::new(name.clone(), applicant_names.clone(), APPLICANTS as u32))
        .collect();

    let engine = run(applicants, residencies);

    for (name, first) in applicant_names.iter().zip(&firsts) {
        assert_eq!(engine.registry().match_of(name), Some(first.as_str()));
    }
}
