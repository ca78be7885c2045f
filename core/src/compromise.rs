//! Compromise selector: seeds the run with compromised POS devices.

use crate::{
    error::{SimError, SimResult},
    model::Label,
    rng::SimRng,
    store::GraphStore,
    types::PosId,
};
use std::time::Instant;

/// Pick `fraud_count` distinct POS ids uniformly from `[0, pos_count)`
/// and mark each compromised. Returns the ids, ascending.
///
/// Assumes every device starts clean; prior state is not consulted.
pub fn compromise_pos_devices(
    store:       &mut GraphStore,
    pos_count:   u64,
    fraud_count: u64,
    rng:         &mut SimRng,
) -> SimResult<Vec<PosId>> {
    if fraud_count > pos_count {
        return Err(SimError::invalid(format!(
            "There can't be more frauds than devices ({fraud_count} > {pos_count})"
        )));
    }

    log::info!("Compromising {fraud_count} out of {pos_count} POS devices");
    let start = Instant::now();

    let picked: Vec<PosId> = rng
        .sample_distinct(pos_count as usize, fraud_count as usize)
        .into_iter()
        .map(|i| i as PosId)
        .collect();

    for &pos_id in &picked {
        store.set_compromised(Label::Pos, pos_id, true)?;
        log::debug!("Point of sale {pos_id} is compromised");
    }

    log::info!("Compromisation took {:.2} sec", start.elapsed().as_secs_f64());
    Ok(picked)
}
