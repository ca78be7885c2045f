//! Recording a single card transaction.

use crate::{
    error::{SimError, SimResult},
    model::{
        CardNode, Label, PosNode, RelType, TransactionLink, TransactionNode, TransactionOutcome,
    },
    types::{CardId, PosId, TxId},
};
use rusqlite::params;

use super::{find_node, json_bool, GraphStore};

impl GraphStore {
    /// Create transaction `tx_id` linking `card_id` and `pos_id`, as one
    /// store transaction:
    ///   1. read the card and POS `compromised` flags,
    ///   2. create the Transaction with
    ///      `fraudReported = card.compromised AND report_trial`,
    ///   3. create `Using` and `At`,
    ///   4. propagate: `card.compromised = card.compromised OR pos.compromised`.
    ///
    /// The fraud flag reads the card state from step 1, so a card
    /// compromised by this very transaction cannot report it.
    pub fn record_transaction(
        &mut self,
        tx_id:        TxId,
        card_id:      CardId,
        pos_id:       PosId,
        report_trial: bool,
    ) -> SimResult<TransactionOutcome> {
        let tx = self.conn.transaction()?;

        let (card_nid, card_props) = find_node(&tx, Label::Card, card_id)?
            .ok_or(SimError::NodeNotFound { label: Label::Card, id: card_id })?;
        let (pos_nid, pos_props) = find_node(&tx, Label::Pos, pos_id)?
            .ok_or(SimError::NodeNotFound { label: Label::Pos, id: pos_id })?;
        let card: CardNode = serde_json::from_str(&card_props)?;
        let pos: PosNode = serde_json::from_str(&pos_props)?;

        let fraud_reported = card.compromised && report_trial;
        let props = serde_json::to_string(&TransactionNode { id: tx_id, fraud_reported })?;
        tx.prepare_cached("INSERT INTO node (label, props) VALUES (?1, ?2)")?
            .execute(params![Label::Transaction.as_str(), props])?;
        let tx_nid = tx.last_insert_rowid();

        {
            let mut link = tx.prepare_cached(
                "INSERT INTO rel (rel_type, src, dst) VALUES (?1, ?2, ?3)",
            )?;
            link.execute(params![RelType::Using.as_str(), tx_nid, card_nid])?;
            link.execute(params![RelType::At.as_str(), tx_nid, pos_nid])?;
        }

        // Sticky: a clean device never cleans a compromised card.
        let card_newly_compromised = pos.compromised && !card.compromised;
        if card_newly_compromised {
            tx.prepare_cached(
                "UPDATE node SET props = json_set(props, '$.compromised', json(?2))
                 WHERE nid = ?1",
            )?
            .execute(params![card_nid, json_bool(true)])?;
        }

        tx.commit()?;

        Ok(TransactionOutcome {
            tx_id,
            card_id,
            pos_id,
            card_was_compromised: card.compromised,
            pos_compromised: pos.compromised,
            fraud_reported,
            card_newly_compromised,
        })
    }

    /// Every transaction with the card and POS it points at, ordered by id.
    pub fn transaction_links(&self) -> SimResult<Vec<TransactionLink>> {
        let mut stmt = self.conn.prepare(
            "SELECT json_extract(t.props, '$.id'),
                    json_extract(c.props, '$.id'),
                    json_extract(p.props, '$.id')
             FROM node t
             JOIN rel u  ON u.src = t.nid AND u.rel_type = 'Using'
             JOIN node c ON c.nid = u.dst AND c.label = 'Card'
             JOIN rel a  ON a.src = t.nid AND a.rel_type = 'At'
             JOIN node p ON p.nid = a.dst AND p.label = 'Pos'
             WHERE t.label = 'Transaction'
             ORDER BY json_extract(t.props, '$.id')",
        )?;
        let links = stmt
            .query_map([], |row| {
                Ok(TransactionLink {
                    tx_id:   row.get(0)?,
                    card_id: row.get(1)?,
                    pos_id:  row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(links)
    }

    /// Per transaction: (id, outgoing Using count, outgoing At count).
    pub fn transaction_edge_counts(&self) -> SimResult<Vec<(TxId, u64, u64)>> {
        let mut stmt = self.conn.prepare(
            "SELECT json_extract(t.props, '$.id'),
                    COUNT(CASE WHEN r.rel_type = 'Using' THEN 1 END),
                    COUNT(CASE WHEN r.rel_type = 'At' THEN 1 END)
             FROM node t
             LEFT JOIN rel r ON r.src = t.nid
             WHERE t.label = 'Transaction'
             GROUP BY t.nid
             ORDER BY json_extract(t.props, '$.id')",
        )?;
        let counts = stmt
            .query_map([], |row| {
                Ok((row.get(0)?, row.get::<_, i64>(1)? as u64, row.get::<_, i64>(2)? as u64))
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(counts)
    }
}
