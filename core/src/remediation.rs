//! Remediation engine: reverses compromise rooted at one POS device.
//!
//! Known limitation: the reset is blanket. A card that was also used at a
//! different, still-compromised device is cleared as well, and so are the
//! fraud flags of every transaction on that card.

use crate::{
    error::SimResult,
    store::{GraphStore, RemediationCounts},
    types::PosId,
};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemediationReport {
    pub pos_id:   PosId,
    pub counts:   RemediationCounts,
    pub duration: Duration,
}

pub fn resolve_pos(store: &mut GraphStore, pos_id: PosId) -> SimResult<RemediationReport> {
    let start = Instant::now();
    let counts = store.resolve_pos(pos_id)?;
    let duration = start.elapsed();

    log::info!(
        "Point of sale {pos_id} resolved in {:.2} sec (was compromised: {}, {} cards, {} transactions cleared)",
        duration.as_secs_f64(),
        counts.pos_was_compromised,
        counts.cards_cleared,
        counts.transactions_cleared,
    );
    Ok(RemediationReport { pos_id, counts, duration })
}
