//! Store methods for the generation run ledger.

use crate::{error::SimResult, types::RunId};
use rusqlite::{params, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use super::GraphStore;

/// One completed generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id:               RunId,
    pub seed:                 u64,
    /// The generation parameters as JSON.
    pub params:               String,
    /// RFC 3339 wall-clock start time.
    pub started_at:           String,
    pub duration_ms:          u64,
    pub compromised_pos:      u64,
    pub fraud_reported_count: u64,
}

impl RunRecord {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            run_id:               row.get(0)?,
            seed:                 row.get::<_, i64>(1)? as u64,
            params:               row.get(2)?,
            started_at:           row.get(3)?,
            duration_ms:          row.get::<_, i64>(4)? as u64,
            compromised_pos:      row.get::<_, i64>(5)? as u64,
            fraud_reported_count: row.get::<_, i64>(6)? as u64,
        })
    }
}

impl GraphStore {
    pub fn insert_run(&mut self, run: &RunRecord) -> SimResult<()> {
        self.conn.execute(
            "INSERT INTO generation_run
                (run_id, seed, params, started_at, duration_ms, compromised_pos, fraud_reported_count)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                run.run_id,
                run.seed as i64,
                run.params,
                run.started_at,
                run.duration_ms as i64,
                run.compromised_pos as i64,
                run.fraud_reported_count as i64,
            ],
        )?;
        Ok(())
    }

    /// All recorded runs, oldest first.
    pub fn runs(&self) -> SimResult<Vec<RunRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT run_id, seed, params, started_at, duration_ms, compromised_pos, fraud_reported_count
             FROM generation_run ORDER BY rowid ASC",
        )?;
        let runs = stmt
            .query_map([], RunRecord::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(runs)
    }

    pub fn latest_run(&self) -> SimResult<Option<RunRecord>> {
        Ok(self
            .conn
            .query_row(
                "SELECT run_id, seed, params, started_at, duration_ms, compromised_pos, fraud_reported_count
                 FROM generation_run ORDER BY rowid DESC LIMIT 1",
                [],
                RunRecord::from_row,
            )
            .optional()?)
    }
}
