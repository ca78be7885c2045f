//! Graph data model: labels, relationship types and node property sets.
//!
//! RULE: Node properties are stored exactly as these structs serialize.
//! Property names use the camelCase graph names (`fraudReported`), so a
//! record read back from the store decodes straight into its struct.

use crate::types::{CardId, PosId, TxId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Node labels. Closed set; statements never take a label from input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    Card,
    Pos,
    Transaction,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Card        => "Card",
            Self::Pos         => "Pos",
            Self::Transaction => "Transaction",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relationship types. Both point away from the Transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelType {
    /// Transaction → Card
    Using,
    /// Transaction → POS
    At,
}

impl RelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Using => "Using",
            Self::At    => "At",
        }
    }
}

// ── Property names ─────────────────────────────────────────────

pub const PROP_ID: &str = "id";
pub const PROP_COMPROMISED: &str = "compromised";
pub const PROP_FRAUD_REPORTED: &str = "fraudReported";

/// Indexes created on every fresh graph.
pub const GRAPH_INDEXES: [(Label, &str); 4] = [
    (Label::Card, PROP_ID),
    (Label::Pos, PROP_ID),
    (Label::Transaction, PROP_ID),
    (Label::Transaction, PROP_FRAUD_REPORTED),
];

// ── Node property sets ─────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardNode {
    pub id:          CardId,
    pub compromised: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PosNode {
    pub id:          PosId,
    pub compromised: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionNode {
    pub id:             TxId,
    pub fraud_reported: bool,
}

/// A transaction together with the card and POS its edges point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionLink {
    pub tx_id:   TxId,
    pub card_id: CardId,
    pub pos_id:  PosId,
}

// ── Query records ──────────────────────────────────────────────

/// One row of the ranked suspicious-POS query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PosFraudCount {
    pub pos_id:           PosId,
    pub connected_frauds: u64,
}

/// One chain `p1 <-At- t1 -Using-> c <-Using- t2 -At-> p2`,
/// where `t1` is a reported fraud and `p2` is the queried device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PosGraphChain {
    pub p1: PosNode,
    pub t1: TransactionNode,
    pub c:  CardNode,
    pub t2: TransactionNode,
    pub p2: PosNode,
}

/// What recording a single transaction did to the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOutcome {
    pub tx_id:                  TxId,
    pub card_id:                CardId,
    pub pos_id:                 PosId,
    /// Card state read before this transaction propagated anything.
    pub card_was_compromised:   bool,
    pub pos_compromised:        bool,
    pub fraud_reported:         bool,
    pub card_newly_compromised: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_properties_use_graph_names() {
        let json = serde_json::to_string(&TransactionNode { id: 3, fraud_reported: true }).unwrap();
        assert_eq!(json, r#"{"id":3,"fraudReported":true}"#);
    }

    #[test]
    fn index_properties_match_serialized_names() {
        let card = serde_json::to_value(CardNode { id: 0, compromised: false }).unwrap();
        assert!(card.get(PROP_ID).is_some());
        assert!(card.get(PROP_COMPROMISED).is_some());
        let tx = serde_json::to_value(TransactionNode { id: 0, fraud_reported: false }).unwrap();
        assert!(tx.get(PROP_FRAUD_REPORTED).is_some());
    }
}
