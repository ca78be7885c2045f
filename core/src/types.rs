//! Shared primitive types used across the entire simulation.

/// Identifier of a Card node. Dense, starting at 0.
pub type CardId = i64;

/// Identifier of a POS node. Dense, starting at 0.
pub type PosId = i64;

/// Identifier of a Transaction node. Assigned sequentially per run.
pub type TxId = i64;

/// The canonical generation run identifier.
pub type RunId = String;
