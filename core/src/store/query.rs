//! Read-only fraud analytics over the transaction graph.
//!
//! Each query is one statement; rows are decoded into their record type
//! here and nowhere else.

use crate::{
    error::SimResult,
    model::{PosFraudCount, PosGraphChain},
    types::{PosId, TxId},
};
use rusqlite::params;

use super::GraphStore;

impl GraphStore {
    /// POS devices whose transactions share a card with more than one
    /// distinct reported fraud, most connected first (ties by POS id).
    pub fn suspicious_pos(&self) -> SimResult<Vec<PosFraudCount>> {
        let mut stmt = self.conn.prepare(
            "SELECT json_extract(p.props, '$.id') AS pos_id,
                    COUNT(DISTINCT t1.nid)       AS connected_frauds
             FROM node t1
             JOIN rel u1 ON u1.src = t1.nid AND u1.rel_type = 'Using'
             JOIN rel u2 ON u2.dst = u1.dst AND u2.rel_type = 'Using' AND u2.src <> t1.nid
             JOIN rel a2 ON a2.src = u2.src AND a2.rel_type = 'At'
             JOIN node p ON p.nid = a2.dst AND p.label = 'Pos'
             WHERE t1.label = 'Transaction'
               AND json_extract(t1.props, '$.fraudReported') = 1
             GROUP BY p.nid
             HAVING connected_frauds > 1
             ORDER BY connected_frauds DESC, pos_id ASC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(PosFraudCount {
                    pos_id:           row.get(0)?,
                    connected_frauds: row.get::<_, i64>(1)? as u64,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Ids of every transaction with `fraudReported = true`, ascending.
    pub fn fraudulent_transaction_ids(&self) -> SimResult<Vec<TxId>> {
        let mut stmt = self.conn.prepare(
            "SELECT json_extract(props, '$.id') FROM node
             WHERE label = 'Transaction'
               AND json_extract(props, '$.fraudReported') = 1
             ORDER BY json_extract(props, '$.id')",
        )?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<TxId>, _>>()?;
        Ok(ids)
    }

    /// Every chain `p1 <-At- t1 -Using-> c <-Using- t2 -At-> p2` where `t1`
    /// is a reported fraud, `t2` a different transaction and `p2.id = pos_id`.
    pub fn pos_graph(&self, pos_id: PosId) -> SimResult<Vec<PosGraphChain>> {
        let mut stmt = self.conn.prepare(
            "SELECT p1.props, t1.props, c.props, t2.props, p2.props
             FROM node p2
             JOIN rel a2  ON a2.dst = p2.nid AND a2.rel_type = 'At'
             JOIN node t2 ON t2.nid = a2.src AND t2.label = 'Transaction'
             JOIN rel u2  ON u2.src = t2.nid AND u2.rel_type = 'Using'
             JOIN node c  ON c.nid = u2.dst AND c.label = 'Card'
             JOIN rel u1  ON u1.dst = c.nid AND u1.rel_type = 'Using' AND u1.rid <> u2.rid
             JOIN node t1 ON t1.nid = u1.src AND t1.label = 'Transaction'
             JOIN rel a1  ON a1.src = t1.nid AND a1.rel_type = 'At'
             JOIN node p1 ON p1.nid = a1.dst AND p1.label = 'Pos'
             WHERE p2.label = 'Pos'
               AND json_extract(p2.props, '$.id') = ?1
               AND json_extract(t1.props, '$.fraudReported') = 1
             ORDER BY t1.nid, t2.nid",
        )?;
        let raw = stmt
            .query_map(params![pos_id], |row| {
                Ok([
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ])
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut chains = Vec::with_capacity(raw.len());
        for [p1, t1, c, t2, p2] in raw {
            chains.push(PosGraphChain {
                p1: serde_json::from_str(&p1)?,
                t1: serde_json::from_str(&t1)?,
                c:  serde_json::from_str(&c)?,
                t2: serde_json::from_str(&t2)?,
                p2: serde_json::from_str(&p2)?,
            });
        }
        Ok(chains)
    }

    /// Number of transactions currently flagged as reported fraud.
    pub fn fraud_reported_count(&self) -> SimResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM node
             WHERE label = 'Transaction'
               AND json_extract(props, '$.fraudReported') = 1",
            [],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }
}
