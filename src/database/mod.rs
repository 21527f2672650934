use crate::database::db_structs::Player;
use std::{collections::HashSet, path::PathBuf};
use thiserror::Error;

pub mod db;
pub mod db_structs;
pub mod json_store;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to connect to database: {0}")]
    Connection(#[source] tokio_postgres::Error),

    #[error("Database query failed: {0}")]
    Query(#[from] tokio_postgres::Error),

    #[error("Failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error
    },

    #[error("Failed to (de)serialize player records: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid player record {id}: {reason}")]
    InvalidRecord { id: String, reason: String },

    #[error("Duplicate player identifier {id}")]
    DuplicateId { id: String },

    #[error("Player {id} is not present in the store")]
    UnknownPlayer { id: String },

    #[error("Batch write-back failed, no records were changed: {0}")]
    WriteFailure(#[source] Box<StoreError>)
}

/// The persistent player collection. Records are validated when read, and
/// every mutating operation is all-or-nothing.
#[allow(async_fn_in_trait)]
pub trait PlayerStore {
    /// Reads every stored player.
    async fn get_players(&self) -> Result<Vec<Player>, StoreError>;

    /// Reads the players whose identifier is in `ids`. Identifiers with no
    /// record are simply absent from the result.
    async fn get_players_by_ids(&self, ids: &HashSet<String>) -> Result<Vec<Player>, StoreError>;

    /// Replaces the stored state of every given player as one batch.
    async fn write_back(&mut self, players: &[Player]) -> Result<(), StoreError>;

    /// Resets every player to default rating values, returning how many
    /// records were reset.
    async fn reset_players(&mut self) -> Result<usize, StoreError>;
}
