//! Transaction generator: the simulation step.
//!
//! For every synthetic transaction:
//!   1. draw a card and a POS device uniformly, with replacement,
//!   2. draw the fraud-report trial,
//!   3. record the transaction atomically in the store, which decides
//!      `fraudReported` from the card state *before* propagation and then
//!      spreads POS compromise onto the card.
//!
//! Draws never depend on graph state, so a seed fixes the whole sequence
//! of (card, POS, trial) triples regardless of what the graph contains.
//!
//! No retries: a store failure aborts the run and leaves the transactions
//! recorded so far in place.

use crate::{
    config::validate_report_probability,
    error::{SimError, SimResult},
    model::TransactionOutcome,
    rng::SimRng,
    store::GraphStore,
    types::TxId,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Totals for one generation loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationStats {
    pub transactions:      u64,
    pub fraud_reported:    u64,
    pub cards_compromised: u64,
}

pub struct TransactionGenerator<'a> {
    store:              &'a mut GraphStore,
    card_count:         u64,
    pos_count:          u64,
    report_probability: f64,
    next_id:            TxId,
}

impl<'a> TransactionGenerator<'a> {
    pub fn new(
        store:              &'a mut GraphStore,
        card_count:         u64,
        pos_count:          u64,
        report_probability: f64,
    ) -> SimResult<Self> {
        validate_report_probability(report_probability)?;
        Ok(Self {
            store,
            card_count,
            pos_count,
            report_probability,
            next_id: 0,
        })
    }

    /// Record one transaction.
    pub fn step(&mut self, rng: &mut SimRng) -> SimResult<TransactionOutcome> {
        if self.card_count == 0 || self.pos_count == 0 {
            return Err(SimError::invalid(format!(
                "cannot draw a transaction from {} cards and {} POS devices",
                self.card_count, self.pos_count
            )));
        }
        let card_id = rng.next_below(self.card_count) as i64;
        let pos_id = rng.next_below(self.pos_count) as i64;
        let report_trial = rng.chance(self.report_probability);

        let outcome = self
            .store
            .record_transaction(self.next_id, card_id, pos_id, report_trial)?;
        self.next_id += 1;

        if outcome.card_newly_compromised {
            log::debug!("Card {card_id} compromised at POS {pos_id}");
        }
        Ok(outcome)
    }

    /// Record `tx_count` transactions.
    pub fn run(&mut self, tx_count: u64, rng: &mut SimRng) -> SimResult<GenerationStats> {
        log::info!("Creating {tx_count} transactions");
        let start = Instant::now();

        let mut stats = GenerationStats::default();
        for _ in 0..tx_count {
            let outcome = self.step(rng)?;
            stats.transactions += 1;
            stats.fraud_reported += u64::from(outcome.fraud_reported);
            stats.cards_compromised += u64::from(outcome.card_newly_compromised);
        }

        log::info!(
            "Created {} transactions in {:.2} sec ({} reported, {} cards compromised)",
            stats.transactions,
            start.elapsed().as_secs_f64(),
            stats.fraud_reported,
            stats.cards_compromised,
        );
        Ok(stats)
    }
}
