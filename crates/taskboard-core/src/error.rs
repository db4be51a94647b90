use thiserror::Error;

#[derive(Error, Debug)]
pub enum TaskboardError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Card not found: {0}")]
    CardNotFound(String),

    #[error("Note not found: {0}")]
    NoteNotFound(String),

    #[error("Column {column_id} still holds {card_count} card(s)")]
    ColumnNotEmpty { column_id: String, card_count: usize },

    #[error("Cannot delete the last remaining column")]
    CannotDeleteLastColumn,

    #[error("No free {namespace} hash after {attempts} attempts")]
    HashCollision { namespace: String, attempts: u32 },

    #[error("Storage failure: {0}")]
    StorageFailure(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl TaskboardError {
    /// Whether this error came from outside the pure core (storage medium or
    /// persisted bytes) rather than from a rejected mutation.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            TaskboardError::StorageFailure(_) | TaskboardError::Serialization(_)
        )
    }
}
