use thiserror::Error;

use crate::model::Label;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Graph store at '{path}' is unavailable: {source}")]
    StoreUnavailable {
        path: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid parameter: {reason}")]
    InvalidParameter { reason: String },

    #[error("{label} node with id {id} not found")]
    NodeNotFound { label: Label, id: i64 },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SimError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidParameter { reason: reason.into() }
    }
}

pub type SimResult<T> = Result<T, SimError>;
