//! Fraud query engine: read-only analytics over the accumulated graph.
//!
//! None of these mutate state. An empty graph yields empty results.

use crate::{
    error::SimResult,
    model::{PosFraudCount, PosGraphChain},
    store::GraphStore,
    types::{PosId, TxId},
};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FraudulentTransactions {
    pub duration: Duration,
    pub ids:      Vec<TxId>,
}

/// POS devices connected to more than one reported fraud through shared
/// cards, ordered by connected-fraud count, highest first.
pub fn compromised_pos(store: &GraphStore) -> SimResult<Vec<PosFraudCount>> {
    log::info!("Getting compromised Point Of Sale ids");
    let start = Instant::now();

    let ranked = store.suspicious_pos()?;

    log::info!(
        "Found {} POS with more than one connected fraud in {:.2} sec",
        ranked.len(),
        start.elapsed().as_secs_f64()
    );
    Ok(ranked)
}

pub fn fraudulent_transactions(store: &GraphStore) -> SimResult<FraudulentTransactions> {
    log::info!("Getting fraudulent transactions");
    let start = Instant::now();

    let ids = store.fraudulent_transaction_ids()?;
    let duration = start.elapsed();

    log::info!(
        "Found {} fraudulent transactions in {:.2} sec",
        ids.len(),
        duration.as_secs_f64()
    );
    Ok(FraudulentTransactions { duration, ids })
}

/// Chains linking reported frauds elsewhere to transactions at `pos_id`.
pub fn pos_graph(store: &GraphStore, pos_id: PosId) -> SimResult<Vec<PosGraphChain>> {
    log::info!("Fetching fraud subgraph around POS {pos_id}");
    let chains = store.pos_graph(pos_id)?;
    log::debug!("POS {pos_id}: {} chains", chains.len());
    Ok(chains)
}
