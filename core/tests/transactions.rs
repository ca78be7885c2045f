//! Transaction generator tests.
//!
//! Covers: edge shape, fraud-report timing, sticky propagation,
//! monotonic compromise within a run, and determinism.

use cardfraud_core::{
    config::GenerateParams,
    engine::FraudEngine,
    error::{SimError, SimResult},
    model::Label,
    population::init_population,
    rng::{RngBank, RngSlot},
    store::GraphStore,
    transaction_generator::TransactionGenerator,
};
use std::collections::HashSet;

fn populated(cards: u64, pos: u64) -> SimResult<GraphStore> {
    let mut store = GraphStore::in_memory()?;
    store.migrate()?;
    store.ensure_indexes()?;
    init_population(&mut store, cards, pos)?;
    Ok(store)
}

#[test]
fn every_transaction_has_one_using_and_one_at_edge() -> SimResult<()> {
    let mut store = populated(12, 4)?;
    store.set_compromised(Label::Pos, 1, true)?;
    let mut rng = RngBank::new(5).for_slot(RngSlot::Transaction);

    let stats = TransactionGenerator::new(&mut store, 12, 4, 0.5)?.run(150, &mut rng)?;
    assert_eq!(stats.transactions, 150);

    let txs = store.transactions()?;
    assert_eq!(txs.len(), 150);
    assert!(txs.iter().enumerate().all(|(i, t)| t.id == i as i64));

    let edges = store.transaction_edge_counts()?;
    assert_eq!(edges.len(), 150);
    assert!(edges.iter().all(|&(_, using, at)| using == 1 && at == 1));

    let links = store.transaction_links()?;
    assert_eq!(links.len(), 150);
    assert!(links.iter().all(|l| (0..12).contains(&l.card_id) && (0..4).contains(&l.pos_id)));
    assert_eq!(store.relationship_count()?, 300);
    Ok(())
}

#[test]
fn freshly_compromised_card_does_not_report_in_the_same_step() -> SimResult<()> {
    let mut store = populated(1, 1)?;
    store.set_compromised(Label::Pos, 0, true)?;

    let first = store.record_transaction(0, 0, 0, true)?;
    assert!(!first.card_was_compromised);
    assert!(first.card_newly_compromised);
    assert!(!first.fraud_reported);

    let second = store.record_transaction(1, 0, 0, true)?;
    assert!(second.card_was_compromised);
    assert!(!second.card_newly_compromised);
    assert!(second.fraud_reported);

    assert_eq!(store.fraudulent_transaction_ids()?, vec![1]);
    Ok(())
}

#[test]
fn failed_report_trial_leaves_transaction_unreported() -> SimResult<()> {
    let mut store = populated(1, 1)?;
    store.set_compromised(Label::Card, 0, true)?;
    let outcome = store.record_transaction(0, 0, 0, false)?;
    assert!(outcome.card_was_compromised);
    assert!(!outcome.fraud_reported);
    Ok(())
}

#[test]
fn clean_device_never_cleans_a_compromised_card() -> SimResult<()> {
    let mut store = populated(1, 2)?;
    store.set_compromised(Label::Pos, 0, true)?;

    store.record_transaction(0, 0, 0, false)?;
    let at_clean = store.record_transaction(1, 0, 1, false)?;

    assert!(!at_clean.pos_compromised);
    assert!(at_clean.card_was_compromised);
    assert_eq!(store.card(0)?.map(|c| c.compromised), Some(true));
    Ok(())
}

#[test]
fn compromise_is_monotonic_within_a_run() -> SimResult<()> {
    let mut store = populated(20, 6)?;
    for id in [0, 3] {
        store.set_compromised(Label::Pos, id, true)?;
    }
    let mut rng = RngBank::new(77).for_slot(RngSlot::Transaction);
    let mut generator = TransactionGenerator::new(&mut store, 20, 6, 0.3)?;

    let mut seen_compromised = HashSet::new();
    for _ in 0..300 {
        let outcome = generator.step(&mut rng)?;
        if seen_compromised.contains(&outcome.card_id) {
            assert!(outcome.card_was_compromised, "card {} was cleaned", outcome.card_id);
        }
        if outcome.card_was_compromised || outcome.pos_compromised {
            seen_compromised.insert(outcome.card_id);
        }
    }

    let now: HashSet<i64> = store.compromised_ids(Label::Card)?.into_iter().collect();
    assert_eq!(now, seen_compromised);
    Ok(())
}

#[test]
fn certain_reporting_flags_every_precompromised_transaction() -> SimResult<()> {
    let mut store = populated(8, 4)?;
    store.set_compromised(Label::Pos, 2, true)?;
    let mut rng = RngBank::new(3).for_slot(RngSlot::Transaction);
    let mut generator = TransactionGenerator::new(&mut store, 8, 4, 1.0)?;

    for _ in 0..120 {
        let outcome = generator.step(&mut rng)?;
        assert_eq!(outcome.fraud_reported, outcome.card_was_compromised);
    }
    Ok(())
}

#[test]
fn zero_probability_never_reports() -> SimResult<()> {
    let mut store = populated(8, 4)?;
    store.set_compromised(Label::Pos, 0, true)?;
    let mut rng = RngBank::new(3).for_slot(RngSlot::Transaction);

    let stats = TransactionGenerator::new(&mut store, 8, 4, 0.0)?.run(120, &mut rng)?;
    assert_eq!(stats.fraud_reported, 0);
    assert!(store.fraudulent_transaction_ids()?.is_empty());
    Ok(())
}

#[test]
fn out_of_range_probability_is_rejected() -> SimResult<()> {
    let mut store = populated(1, 1)?;
    for p in [-0.01, 1.01, f64::NAN] {
        let err = TransactionGenerator::new(&mut store, 1, 1, p).err();
        assert!(matches!(err, Some(SimError::InvalidParameter { .. })), "accepted {p}");
    }
    Ok(())
}

#[test]
fn missing_card_is_reported_and_nothing_is_written() -> SimResult<()> {
    let mut store = populated(2, 2)?;
    let err = store.record_transaction(0, 9, 0, true).unwrap_err();
    assert!(matches!(err, SimError::NodeNotFound { label: Label::Card, id: 9 }));
    assert_eq!(store.node_count(Label::Transaction)?, 0);
    assert_eq!(store.relationship_count()?, 0);
    Ok(())
}

#[test]
fn transactions_without_population_are_invalid() -> SimResult<()> {
    let mut engine = FraudEngine::build_test()?;
    let params = GenerateParams {
        card_count: 0,
        pos_count: 3,
        tx_count: 10,
        fraud_count: 1,
        report_probability: 0.5,
        seed: None,
    };
    let err = engine.generate_data(&params).unwrap_err();
    assert!(matches!(err, SimError::InvalidParameter { .. }));
    Ok(())
}

#[test]
fn same_seed_produces_identical_graphs() -> SimResult<()> {
    let params = GenerateParams {
        card_count: 30,
        pos_count: 10,
        tx_count: 400,
        fraud_count: 3,
        report_probability: 0.4,
        seed: Some(0xDEAD_BEEF),
    };
    let mut a = FraudEngine::build_test()?;
    let mut b = FraudEngine::build_test()?;
    let report_a = a.generate_data(&params)?;
    let report_b = b.generate_data(&params)?;

    assert_eq!(report_a.compromised_pos, report_b.compromised_pos);
    assert_eq!(report_a.stats, report_b.stats);
    assert_eq!(a.store().transaction_links()?, b.store().transaction_links()?);
    assert_eq!(a.store().transactions()?, b.store().transactions()?);
    assert_eq!(a.store().cards()?, b.store().cards()?);

    let other = GenerateParams { seed: Some(1), ..params };
    let mut c = FraudEngine::build_test()?;
    c.generate_data(&other)?;
    assert_ne!(a.store().transaction_links()?, c.store().transaction_links()?);
    Ok(())
}
