use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use taskboard_core::{AppConfig, TaskboardError, TaskboardResult};
use taskboard_domain::{
    resolve, Board, CardId, ColumnId, EntityStore, ExternalIdentityRegistry, HashNamespace,
};
use taskboard_persistence::{BoardSession, JsonFileStore, SaveReport};
use tokio::task::JoinHandle;
use uuid::Uuid;

/// One CLI invocation's view of a board: the session holding the snapshot,
/// the save worker persisting it, and the configured domain services.
pub struct CliContext {
    session: BoardSession,
    worker: JoinHandle<SaveReport>,
    pub store: EntityStore,
    pub registry: ExternalIdentityRegistry,
}

impl CliContext {
    pub async fn load(config: &AppConfig, data_dir: PathBuf, board_id: &str) -> TaskboardResult<Self> {
        let repo = Arc::new(
            JsonFileStore::new(data_dir).with_default_columns(config.default_columns.clone()),
        );
        let debounce = Duration::from_millis(config.save_debounce_ms);
        let (session, worker) = BoardSession::open(repo, board_id, debounce).await?;

        Ok(Self {
            session,
            worker,
            store: EntityStore::from_config(config),
            registry: ExternalIdentityRegistry::from_config(config),
        })
    }

    pub fn board(&self) -> &Board {
        self.session.board()
    }

    pub fn apply<F>(&mut self, f: F) -> TaskboardResult<()>
    where
        F: FnOnce(&Board) -> TaskboardResult<Board>,
    {
        self.session.apply(f)
    }

    pub fn apply_with<T, F>(&mut self, f: F) -> TaskboardResult<T>
    where
        F: FnOnce(&Board) -> TaskboardResult<(Board, T)>,
    {
        self.session.apply_with(f)
    }

    /// Give an entity a hash if it has none yet, returning the hash.
    pub fn ensure_hash(&mut self, namespace: HashNamespace, id: Uuid) -> TaskboardResult<String> {
        let registry = self.registry.clone();
        self.session
            .apply_with(|board| registry.ensure_hash(board, namespace, id, &mut rand::rng()))
    }

    /// Give every column and card a hash so all of them can be referenced.
    pub fn ensure_all_hashes(&mut self) -> TaskboardResult<()> {
        let columns = self.board().column_order.clone();
        let cards: Vec<CardId> = self.board().cards.keys().copied().collect();
        for id in columns {
            self.ensure_hash(HashNamespace::Column, id)?;
        }
        for id in cards {
            self.ensure_hash(HashNamespace::Card, id)?;
        }
        Ok(())
    }

    /// Resolve `col-xxxx` hashes, then column names.
    pub fn resolve_column(&self, reference: &str) -> TaskboardResult<ColumnId> {
        if HashNamespace::Column.accepts(reference) {
            return resolve(self.board(), HashNamespace::Column, reference);
        }
        self.board()
            .find_column_by_name(reference)
            .map(|column| column.id)
            .ok_or_else(|| TaskboardError::ColumnNotFound(reference.to_string()))
    }

    /// Resolve `card-xxxx` hashes, then internal ids.
    pub fn resolve_card(&self, reference: &str) -> TaskboardResult<CardId> {
        if HashNamespace::Card.accepts(reference) {
            return resolve(self.board(), HashNamespace::Card, reference);
        }
        let id = Uuid::parse_str(reference).map_err(|_| {
            TaskboardError::InvalidInput(format!(
                "'{}' is neither a card hash nor a card id",
                reference
            ))
        })?;
        self.board().require_card(id)?;
        Ok(id)
    }

    /// Flush pending saves and wait for the worker.
    pub async fn finish(mut self) -> anyhow::Result<()> {
        self.session.close_save_channel();
        let report = self.worker.await?;
        if !report.failures.is_empty() {
            anyhow::bail!("Failed to save board: {}", report.failures.join("; "));
        }
        tracing::debug!("Saved {} snapshot(s)", report.saved);
        Ok(())
    }
}
