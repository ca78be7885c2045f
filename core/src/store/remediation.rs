//! Store methods for POS remediation.

use crate::{
    error::{SimError, SimResult},
    model::{Label, PosNode},
    types::PosId,
};
use rusqlite::params;
use serde::{Deserialize, Serialize};

use super::{find_node, json_bool, GraphStore};

/// Flags actually flipped by a remediation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemediationCounts {
    pub pos_was_compromised:  bool,
    pub cards_cleared:        u64,
    pub transactions_cleared: u64,
}

impl GraphStore {
    /// Clear compromise rooted at POS `pos_id`, as one store transaction:
    ///   - the POS itself,
    ///   - every card used at it,
    ///   - every transaction at it or using one of those cards.
    ///
    /// Cards are cleared even when another still-compromised device also
    /// touched them. Unknown ids fail without writing anything.
    pub fn resolve_pos(&mut self, pos_id: PosId) -> SimResult<RemediationCounts> {
        let tx = self.conn.transaction()?;

        let (pos_nid, props) = find_node(&tx, Label::Pos, pos_id)?
            .ok_or_else(|| SimError::invalid(format!("unknown POS device {pos_id}")))?;
        let pos: PosNode = serde_json::from_str(&props)?;

        tx.execute(
            "UPDATE node SET props = json_set(props, '$.compromised', json(?2))
             WHERE nid = ?1",
            params![pos_nid, json_bool(false)],
        )?;

        let cards_cleared = tx.execute(
            "UPDATE node SET props = json_set(props, '$.compromised', json(?2))
             WHERE json_extract(props, '$.compromised') = 1
               AND nid IN (
                   SELECT u.dst FROM rel a
                   JOIN rel u ON u.src = a.src AND u.rel_type = 'Using'
                   WHERE a.dst = ?1 AND a.rel_type = 'At'
               )",
            params![pos_nid, json_bool(false)],
        )?;

        // Transactions at the device are a subset of the transactions
        // using its cards, since each of them used one of those cards.
        let transactions_cleared = tx.execute(
            "UPDATE node SET props = json_set(props, '$.fraudReported', json(?2))
             WHERE json_extract(props, '$.fraudReported') = 1
               AND nid IN (
                   SELECT other.src FROM rel a
                   JOIN rel u     ON u.src = a.src AND u.rel_type = 'Using'
                   JOIN rel other ON other.dst = u.dst AND other.rel_type = 'Using'
                   WHERE a.dst = ?1 AND a.rel_type = 'At'
               )",
            params![pos_nid, json_bool(false)],
        )?;

        tx.commit()?;

        Ok(RemediationCounts {
            pos_was_compromised: pos.compromised,
            cards_cleared: cards_cleared as u64,
            transactions_cleared: transactions_cleared as u64,
        })
    }
}
