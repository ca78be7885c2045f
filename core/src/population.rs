//! Population initializer: the initial Card and POS devices.

use crate::{
    error::SimResult,
    model::{CardNode, Label, PosNode},
    store::GraphStore,
};
use std::time::Instant;

/// Create `card_count` cards and `pos_count` POS devices with dense ids
/// starting at 0, all uncompromised.
///
/// Run against an empty graph only: a second call without a drop creates
/// duplicate ids.
pub fn init_population(store: &mut GraphStore, card_count: u64, pos_count: u64) -> SimResult<()> {
    log::info!("Initializing {card_count} cards and {pos_count} POS devices");
    let start = Instant::now();

    let cards: Vec<CardNode> = (0..card_count as i64)
        .map(|id| CardNode { id, compromised: false })
        .collect();
    store.create_nodes(Label::Card, &cards)?;

    let devices: Vec<PosNode> = (0..pos_count as i64)
        .map(|id| PosNode { id, compromised: false })
        .collect();
    store.create_nodes(Label::Pos, &devices)?;

    log::info!("Initialized population in {:.2} sec", start.elapsed().as_secs_f64());
    Ok(())
}
