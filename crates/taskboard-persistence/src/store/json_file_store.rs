use crate::serialization::JsonSerializer;
use crate::store::atomic_writer::AtomicWriter;
use crate::traits::{BoardRepository, PersistenceMetadata, Serializer, FORMAT_VERSION};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use taskboard_core::{TaskboardError, TaskboardResult};
use taskboard_domain::{validate, Board};
use uuid::Uuid;

/// JSON file-based board repository.
///
/// Each board lives in its own `<dir>/<board_id>.json` file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
    instance_id: Uuid,
    default_columns: Vec<String>,
}

/// On-disk wrapper around a board snapshot
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonEnvelope {
    pub version: u32,
    pub metadata: PersistenceMetadata,
    pub board: Board,
}

impl JsonFileStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            instance_id: Uuid::new_v4(),
            default_columns: taskboard_core::AppConfig::default().default_columns,
        }
    }

    /// Columns seeded into a board that has never been saved.
    pub fn with_default_columns(mut self, columns: Vec<String>) -> Self {
        self.default_columns = columns;
        self
    }

    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn board_path(&self, board_id: &str) -> TaskboardResult<PathBuf> {
        Board::validate_id(board_id)?;
        Ok(self.dir.join(format!("{}.json", board_id)))
    }
}

#[async_trait::async_trait]
impl BoardRepository for JsonFileStore {
    async fn load_board(&self, board_id: &str) -> TaskboardResult<Board> {
        let path = self.board_path(board_id)?;

        let Some(bytes) = AtomicWriter::read_if_exists(&path).await? else {
            tracing::info!(
                "No saved board at {}, starting from defaults",
                path.display()
            );
            return Ok(Board::with_columns(board_id, &self.default_columns));
        };

        let envelope: JsonEnvelope = JsonSerializer.deserialize(&bytes)?;
        if envelope.version != FORMAT_VERSION {
            return Err(TaskboardError::Serialization(format!(
                "Unsupported format version: {}",
                envelope.version
            )));
        }
        if envelope.board.id != board_id {
            return Err(TaskboardError::Serialization(format!(
                "File {} holds board '{}'",
                path.display(),
                envelope.board.id
            )));
        }

        if let Err(violations) = validate(&envelope.board) {
            for violation in &violations {
                tracing::warn!("Loaded board '{}': {}", board_id, violation);
            }
        }

        tracing::info!("Loaded {} bytes from {}", bytes.len(), path.display());
        Ok(envelope.board)
    }

    async fn save_board(&self, board: &Board) -> TaskboardResult<()> {
        let path = self.board_path(&board.id)?;
        let envelope = JsonEnvelope {
            version: FORMAT_VERSION,
            metadata: PersistenceMetadata::new(self.instance_id),
            board: board.clone(),
        };

        let bytes = JsonSerializer.serialize(&envelope)?;
        AtomicWriter::write_atomic(&path, &bytes).await?;

        tracing::info!("Saved {} bytes to {}", bytes.len(), path.display());
        Ok(())
    }
}
