//! SQLite-backed property graph.
//!
//! RULE: Only the store talks to the database.
//! Components call store methods; they never execute SQL directly.
//!
//! Nodes live in `node(label, props)` with properties as a JSON object;
//! relationships in `rel(rel_type, src, dst)`. Every statement binds its
//! values as parameters. Labels, relationship types and property names
//! come from the closed sets in `model`, never from caller input.

use crate::{
    error::{SimError, SimResult},
    model::{CardNode, Label, PosNode, TransactionNode, GRAPH_INDEXES, PROP_COMPROMISED},
    types::{CardId, PosId, TxId},
};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{de::DeserializeOwned, Serialize};

mod query;
mod remediation;
mod run;
mod transaction;

pub use remediation::RemediationCounts;
pub use run::RunRecord;

/// Prefix of every property index the store creates. `drop_database`
/// removes exactly these.
const INDEX_PREFIX: &str = "idx_graph_";

/// Write methods take `&mut self`: whoever holds the store mutably is
/// its only writer. A shared borrow can only read.
///
/// ```compile_fail
/// use cardfraud_core::store::GraphStore;
///
/// fn remediate_through_shared(store: &GraphStore) {
///     let _ = store.resolve_pos(0);
/// }
/// ```
pub struct GraphStore {
    conn: Connection,
}

impl GraphStore {
    /// Open (or create) the graph database at `path`.
    pub fn open(path: &str) -> SimResult<Self> {
        let unavailable = |source| SimError::StoreUnavailable {
            path: path.to_string(),
            source,
        };
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )
        .map_err(unavailable)?;
        // WAL mode only matters for real files; in-memory databases ignore it.
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")
            .map_err(unavailable)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> SimResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&mut self) -> SimResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_graph.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/002_generation_run.sql"))?;
        Ok(())
    }

    /// Release the connection, surfacing any error from closing it.
    pub fn close(self) -> SimResult<()> {
        self.conn.close().map_err(|(_, e)| SimError::Database(e))
    }

    // ── Indexes ────────────────────────────────────────────────

    /// Create an index on `property` of nodes labelled `label`. Idempotent.
    pub fn create_index(&mut self, label: Label, property: &str) -> SimResult<()> {
        if property.is_empty()
            || !property.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(SimError::invalid(format!(
                "'{property}' is not a valid property name"
            )));
        }
        // Identifiers cannot be bound as parameters; both parts are checked above
        // or come from the closed Label set.
        let sql = format!(
            "CREATE INDEX IF NOT EXISTS {INDEX_PREFIX}{label}_{property}
             ON node (label, json_extract(props, '$.{property}'))",
            label = label.as_str(),
        );
        self.conn.execute_batch(&sql)?;
        Ok(())
    }

    /// Create every index the simulation queries rely on.
    pub fn ensure_indexes(&mut self) -> SimResult<()> {
        for (label, property) in GRAPH_INDEXES {
            self.create_index(label, property)?;
        }
        Ok(())
    }

    pub fn index_names(&self) -> SimResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master
             WHERE type = 'index' AND substr(name, 1, length(?1)) = ?1
             ORDER BY name",
        )?;
        let names = stmt
            .query_map(params![INDEX_PREFIX], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(names)
    }

    // ── Lifecycle ──────────────────────────────────────────────

    /// Remove every node, relationship and property index.
    /// The generation run ledger is not part of the graph and is kept.
    pub fn drop_database(&mut self) -> SimResult<()> {
        let indexes = self.index_names()?;
        let tx = self.conn.transaction()?;
        for name in &indexes {
            tx.execute_batch(&format!("DROP INDEX IF EXISTS \"{name}\""))?;
        }
        tx.execute("DELETE FROM rel", [])?;
        tx.execute("DELETE FROM node", [])?;
        tx.commit()?;
        log::debug!("Dropped graph ({} indexes)", indexes.len());
        Ok(())
    }

    // ── Nodes ──────────────────────────────────────────────────

    /// Bulk-create nodes with `label`, one per property set, in a single
    /// store transaction. Returns the number of nodes created.
    pub fn create_nodes<T: Serialize>(&mut self, label: Label, nodes: &[T]) -> SimResult<usize> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare("INSERT INTO node (label, props) VALUES (?1, ?2)")?;
            for node in nodes {
                let props = serde_json::to_string(node)?;
                stmt.execute(params![label.as_str(), props])?;
            }
        }
        tx.commit()?;
        Ok(nodes.len())
    }

    /// Set `compromised` on the Card or POS with `id`.
    pub fn set_compromised(&mut self, label: Label, id: i64, compromised: bool) -> SimResult<()> {
        let changed = self.conn.execute(
            "UPDATE node SET props = json_set(props, '$.compromised', json(?3))
             WHERE label = ?1 AND json_extract(props, '$.id') = ?2",
            params![label.as_str(), id, json_bool(compromised)],
        )?;
        if changed == 0 {
            return Err(SimError::NodeNotFound { label, id });
        }
        Ok(())
    }

    pub fn node_count(&self, label: Label) -> SimResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM node WHERE label = ?1",
            params![label.as_str()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    pub fn relationship_count(&self) -> SimResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM rel", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    pub fn card(&self, id: CardId) -> SimResult<Option<CardNode>> {
        node_props(&self.conn, Label::Card, id)
    }

    pub fn pos_device(&self, id: PosId) -> SimResult<Option<PosNode>> {
        node_props(&self.conn, Label::Pos, id)
    }

    pub fn transaction(&self, id: TxId) -> SimResult<Option<TransactionNode>> {
        node_props(&self.conn, Label::Transaction, id)
    }

    /// All cards, ordered by id.
    pub fn cards(&self) -> SimResult<Vec<CardNode>> {
        self.nodes_with_label(Label::Card)
    }

    /// All POS devices, ordered by id.
    pub fn pos_devices(&self) -> SimResult<Vec<PosNode>> {
        self.nodes_with_label(Label::Pos)
    }

    /// All transactions, ordered by id.
    pub fn transactions(&self) -> SimResult<Vec<TransactionNode>> {
        self.nodes_with_label(Label::Transaction)
    }

    /// Ids of compromised nodes with `label`, ascending.
    pub fn compromised_ids(&self, label: Label) -> SimResult<Vec<i64>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT json_extract(props, '$.id') FROM node
             WHERE label = ?1 AND json_extract(props, '$.{PROP_COMPROMISED}') = 1
             ORDER BY json_extract(props, '$.id')"
        ))?;
        let ids = stmt
            .query_map(params![label.as_str()], |row| row.get(0))?
            .collect::<Result<Vec<i64>, _>>()?;
        Ok(ids)
    }

    fn nodes_with_label<T: DeserializeOwned>(&self, label: Label) -> SimResult<Vec<T>> {
        let mut stmt = self.conn.prepare(
            "SELECT props FROM node WHERE label = ?1
             ORDER BY json_extract(props, '$.id')",
        )?;
        let rows = stmt
            .query_map(params![label.as_str()], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        rows.iter()
            .map(|props| serde_json::from_str(props).map_err(SimError::from))
            .collect()
    }
}

/// Look up a node's internal row id and raw property JSON.
/// Takes a plain connection so it also runs inside a store transaction.
pub(crate) fn find_node(
    conn: &Connection,
    label: Label,
    id: i64,
) -> SimResult<Option<(i64, String)>> {
    Ok(conn
        .query_row(
            "SELECT nid, props FROM node
             WHERE label = ?1 AND json_extract(props, '$.id') = ?2",
            params![label.as_str(), id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?)
}

fn node_props<T: DeserializeOwned>(conn: &Connection, label: Label, id: i64) -> SimResult<Option<T>> {
    match find_node(conn, label, id)? {
        Some((_, props)) => Ok(Some(serde_json::from_str(&props)?)),
        None => Ok(None),
    }
}

/// JSON literal for a boolean, bound through `json(?)` so json_set
/// stores a real JSON boolean rather than a string.
pub(crate) fn json_bool(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}
