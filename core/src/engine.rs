//! The fraud simulation engine: the surface the runner talks to.
//!
//! GENERATION ORDER (fixed, never reordered):
//!   1. Validate parameters      (nothing written on failure)
//!   2. Drop the graph
//!   3. Recreate indexes
//!   4. Population initializer
//!   5. Compromise selector
//!   6. Transaction generator
//!   7. Append the run ledger entry
//!
//! RULES:
//!   - The engine owns the only store handle and never lends it out
//!     mutably. Writes take `&mut self`, so one engine is always the
//!     sole writer of its graph.
//!   - All randomness flows through the RngBank of the run.
//!   - No retries. A failure leaves whatever partial graph existed.

use crate::{
    compromise::compromise_pos_devices,
    config::{GenerateParams, SimConfig},
    error::SimResult,
    fraud_query::{self, FraudulentTransactions},
    model::{PosFraudCount, PosGraphChain},
    population::init_population,
    remediation::{self, RemediationReport},
    rng::{RngBank, RngSlot},
    store::{GraphStore, RunRecord},
    transaction_generator::{GenerationStats, TransactionGenerator},
    types::{PosId, RunId},
};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Result of one generate-data run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationReport {
    pub run_id:          RunId,
    pub seed:            u64,
    pub duration:        Duration,
    pub compromised_pos: Vec<PosId>,
    pub stats:           GenerationStats,
}

pub struct FraudEngine {
    store:  GraphStore,
    config: SimConfig,
}

impl FraudEngine {
    /// Wrap an opened store: apply migrations and make sure the graph
    /// indexes exist.
    pub fn new(mut store: GraphStore, config: SimConfig) -> SimResult<Self> {
        store.migrate()?;
        store.ensure_indexes()?;
        Ok(Self { store, config })
    }

    /// Open the store named by the configuration.
    pub fn open(config: SimConfig) -> SimResult<Self> {
        let store = if config.db_path == ":memory:" {
            GraphStore::in_memory()?
        } else {
            GraphStore::open(&config.db_path)?
        };
        log::info!("Graph store opened at {}", config.db_path);
        Self::new(store, config)
    }

    /// In-memory engine with the test configuration.
    pub fn build_test() -> SimResult<Self> {
        Self::new(GraphStore::in_memory()?, SimConfig::default_test())
    }

    /// Read-only view of the graph. Writes only happen through the
    /// engine's own `&mut self` methods:
    ///
    /// ```compile_fail
    /// use cardfraud_core::{engine::FraudEngine, model::Label};
    ///
    /// let engine = FraudEngine::build_test().unwrap();
    /// engine.store().set_compromised(Label::Pos, 0, true).unwrap();
    /// ```
    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Replace the graph with a freshly simulated one.
    pub fn generate_data(&mut self, params: &GenerateParams) -> SimResult<GenerationReport> {
        params.validate()?;

        let seed = params.seed.unwrap_or(self.config.seed);
        let run_id = Uuid::new_v4().to_string();
        let started_at = chrono::Utc::now().to_rfc3339();
        let start = Instant::now();
        log::info!("Generation run {run_id} started (seed {seed})");

        let bank = RngBank::new(seed);

        self.store.drop_database()?;
        self.store.ensure_indexes()?;
        init_population(&mut self.store, params.card_count, params.pos_count)?;

        let mut rng = bank.for_slot(RngSlot::Compromise);
        let compromised_pos =
            compromise_pos_devices(&mut self.store, params.pos_count, params.fraud_count, &mut rng)?;

        let mut rng = bank.for_slot(RngSlot::Transaction);
        let stats = TransactionGenerator::new(
            &mut self.store,
            params.card_count,
            params.pos_count,
            params.report_probability,
        )?
        .run(params.tx_count, &mut rng)?;

        let duration = start.elapsed();
        self.store.insert_run(&RunRecord {
            run_id: run_id.clone(),
            seed,
            params: serde_json::to_string(params)?,
            started_at,
            duration_ms: duration.as_millis() as u64,
            compromised_pos: compromised_pos.len() as u64,
            fraud_reported_count: stats.fraud_reported,
        })?;

        log::info!(
            "Generation run {run_id} finished in {:.2} sec",
            duration.as_secs_f64()
        );
        Ok(GenerationReport {
            run_id,
            seed,
            duration,
            compromised_pos,
            stats,
        })
    }

    /// Clear compromise rooted at `pos_id`.
    pub fn resolve_pos(&mut self, pos_id: PosId) -> SimResult<RemediationReport> {
        remediation::resolve_pos(&mut self.store, pos_id)
    }

    pub fn compromised_pos(&self) -> SimResult<Vec<PosFraudCount>> {
        fraud_query::compromised_pos(&self.store)
    }

    pub fn fraudulent_transactions(&self) -> SimResult<FraudulentTransactions> {
        fraud_query::fraudulent_transactions(&self.store)
    }

    pub fn pos_graph(&self, pos_id: PosId) -> SimResult<Vec<PosGraphChain>> {
        fraud_query::pos_graph(&self.store, pos_id)
    }

    pub fn latest_run(&self) -> SimResult<Option<RunRecord>> {
        self.store.latest_run()
    }

    /// Release the store handle.
    pub fn shutdown(self) -> SimResult<()> {
        log::info!("Closing graph store");
        self.store.close()
    }
}
