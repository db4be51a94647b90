use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taskboard_core::TaskboardResult;
use taskboard_domain::Board;
use uuid::Uuid;

/// Version of the on-disk envelope wrapping a board.
pub const FORMAT_VERSION: u32 = 1;

/// Metadata written alongside every persisted board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistenceMetadata {
    /// Version of the persistence format
    pub format_version: u32,
    /// ID of the process that performed the save
    pub instance_id: Uuid,
    /// When this data was saved
    pub saved_at: DateTime<Utc>,
}

impl PersistenceMetadata {
    pub fn new(instance_id: Uuid) -> Self {
        Self {
            format_version: FORMAT_VERSION,
            instance_id,
            saved_at: Utc::now(),
        }
    }
}

/// Storage adapter contract consumed by the board engine.
///
/// Saves are last-write-wins; there is no merge of concurrent writers.
#[async_trait]
pub trait BoardRepository: Send + Sync {
    /// Load a board, or a fresh default board if none was saved under `board_id`.
    async fn load_board(&self, board_id: &str) -> TaskboardResult<Board>;

    /// Persist a board snapshot. Write failures surface as `StorageFailure`.
    async fn save_board(&self, board: &Board) -> TaskboardResult<()>;
}

/// Trait for serialization/deserialization strategies
pub trait Serializer<T: Send + Sync>: Send + Sync {
    fn serialize(&self, data: &T) -> TaskboardResult<Vec<u8>>;

    fn deserialize(&self, bytes: &[u8]) -> TaskboardResult<T>;
}
