//! Population initializer tests.

use cardfraud_core::{
    config::GenerateParams,
    engine::FraudEngine,
    error::SimResult,
    model::Label,
    population::init_population,
    store::GraphStore,
};

fn empty_store() -> SimResult<GraphStore> {
    let mut store = GraphStore::in_memory()?;
    store.migrate()?;
    store.ensure_indexes()?;
    Ok(store)
}

#[test]
fn creates_dense_uncompromised_ids() -> SimResult<()> {
    let mut store = empty_store()?;
    init_population(&mut store, 7, 3)?;

    let cards = store.cards()?;
    assert_eq!(cards.len(), 7);
    assert!(cards.iter().enumerate().all(|(i, c)| c.id == i as i64 && !c.compromised));

    let devices = store.pos_devices()?;
    assert_eq!(devices.len(), 3);
    assert!(devices.iter().enumerate().all(|(i, p)| p.id == i as i64 && !p.compromised));

    assert_eq!(store.node_count(Label::Transaction)?, 0);
    assert_eq!(store.relationship_count()?, 0);
    Ok(())
}

#[test]
fn zero_counts_create_nothing() -> SimResult<()> {
    let mut store = empty_store()?;
    init_population(&mut store, 0, 0)?;
    assert_eq!(store.node_count(Label::Card)?, 0);
    assert_eq!(store.node_count(Label::Pos)?, 0);
    Ok(())
}

#[test]
fn second_init_without_drop_duplicates_ids() -> SimResult<()> {
    let mut store = empty_store()?;
    init_population(&mut store, 3, 2)?;
    init_population(&mut store, 3, 2)?;
    assert_eq!(store.node_count(Label::Card)?, 6);
    assert_eq!(store.node_count(Label::Pos)?, 4);
    Ok(())
}

#[test]
fn no_fraud_means_nothing_compromised() -> SimResult<()> {
    let mut engine = FraudEngine::build_test()?;
    for (cards, pos) in [(0, 0), (1, 1), (25, 4), (40, 40)] {
        let params = GenerateParams {
            card_count: cards,
            pos_count: pos,
            tx_count: if cards > 0 && pos > 0 { 200 } else { 0 },
            fraud_count: 0,
            report_probability: 1.0,
            seed: Some(cards * 31 + pos),
        };
        engine.generate_data(&params)?;

        assert_eq!(engine.store().node_count(Label::Card)?, cards);
        assert_eq!(engine.store().node_count(Label::Pos)?, pos);
        assert!(engine.store().compromised_ids(Label::Card)?.is_empty());
        assert!(engine.store().compromised_ids(Label::Pos)?.is_empty());
        assert!(engine.fraudulent_transactions()?.ids.is_empty());
    }
    Ok(())
}

#[test]
fn regeneration_replaces_the_previous_graph() -> SimResult<()> {
    let mut engine = FraudEngine::build_test()?;
    let mut params = engine.config().defaults.clone();
    engine.generate_data(&params)?;

    params.card_count = 4;
    params.pos_count = 2;
    params.tx_count = 9;
    params.fraud_count = 1;
    engine.generate_data(&params)?;

    assert_eq!(engine.store().node_count(Label::Card)?, 4);
    assert_eq!(engine.store().node_count(Label::Pos)?, 2);
    assert_eq!(engine.store().node_count(Label::Transaction)?, 9);
    assert_eq!(engine.store().relationship_count()?, 18);
    assert_eq!(engine.store().runs()?.len(), 2);
    Ok(())
}
