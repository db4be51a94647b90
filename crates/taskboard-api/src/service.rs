use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use taskboard_core::{AppConfig, TaskboardError, TaskboardResult};
use taskboard_domain::{
    find_idempotent, move_card_to_end, record_idempotency_key, resolve, Board, CardId,
    CardPatch, ColumnId, EntityStore, ExternalIdentityRegistry, FieldUpdate, HashNamespace,
};
use taskboard_persistence::BoardRepository;

use crate::views::{
    BoardView, CardDetailView, CardView, ColumnView, CreateCardRequest, CreateColumnRequest,
    UpdateCardRequest,
};

/// Framework-free implementation of the external command surface.
///
/// Every call loads the board, applies pure mutations, and saves the result
/// before answering, so a response always reflects durable state. Calls on
/// the same board are serialised by a per-board async lock.
pub struct BoardService<R: ?Sized> {
    store: EntityStore,
    registry: ExternalIdentityRegistry,
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
    repo: Arc<R>,
}

impl<R: BoardRepository + ?Sized> BoardService<R> {
    pub fn new(repo: Arc<R>, store: EntityStore, registry: ExternalIdentityRegistry) -> Self {
        Self {
            store,
            registry,
            locks: Mutex::new(HashMap::new()),
            repo,
        }
    }

    pub fn from_config(repo: Arc<R>, config: &AppConfig) -> Self {
        Self::new(
            repo,
            EntityStore::from_config(config),
            ExternalIdentityRegistry::from_config(config),
        )
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repo
    }

    /// Lock for a board id that has already passed `Board::validate_id`.
    fn board_lock(&self, board_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        self.locks
            .lock()
            .entry(board_id.to_string())
            .or_default()
            .clone()
    }

    /// Load, mutate, and save one board while holding its lock.
    ///
    /// Nothing is written when the mutation fails or leaves the board equal.
    async fn mutate<T, F>(&self, board_id: &str, f: F) -> TaskboardResult<T>
    where
        F: FnOnce(&Board) -> TaskboardResult<(Board, T)> + Send,
        T: Send,
    {
        Board::validate_id(board_id)?;
        let lock = self.board_lock(board_id);
        let _guard = lock.lock().await;

        let board = self.repo.load_board(board_id).await?;
        let (next, value) = f(&board)?;
        if next != board {
            self.repo.save_board(&next).await?;
        }
        Ok(value)
    }

    pub async fn create_card(
        &self,
        board_id: &str,
        request: CreateCardRequest,
        idempotency_key: Option<String>,
    ) -> TaskboardResult<CardView> {
        self.mutate(board_id, move |board| {
            let key = idempotency_key.as_deref();
            if let Some(hash) = key.and_then(|k| find_idempotent(board, HashNamespace::Card, k)) {
                tracing::debug!("Replaying card create for idempotency key {:?}", key);
                let card_id = resolve(board, HashNamespace::Card, hash)?;
                return self.card_view(board, card_id);
            }

            let title = request
                .title
                .as_deref()
                .ok_or_else(|| TaskboardError::InvalidInput("title is required".to_string()))?;
            let column_id = self
                .target_column(
                    board,
                    request.column_hash.as_deref(),
                    request.column_name.as_deref(),
                )?
                .ok_or_else(|| {
                    TaskboardError::InvalidInput(
                        "columnHash or columnName is required".to_string(),
                    )
                })?;

            let (next, card_id) =
                self.store
                    .create_card(board, column_id, title, request.description.as_deref())?;
            let (next, view) = self.card_view(&next, card_id)?;
            let next = match key {
                Some(key) => {
                    record_idempotency_key(&next, HashNamespace::Card, key, &view.card_hash)
                }
                None => next,
            };
            Ok((next, view))
        })
        .await
    }

    /// Apply a partial update; a target column moves the card to its end.
    pub async fn update_card(
        &self,
        board_id: &str,
        card_hash: &str,
        request: UpdateCardRequest,
    ) -> TaskboardResult<CardView> {
        self.mutate(board_id, move |board| {
            let card_id = resolve(board, HashNamespace::Card, card_hash)?;
            let target = self.target_column(
                board,
                request.column_hash.as_deref(),
                request.column_name.as_deref(),
            )?;

            let description = match request.description {
                None => FieldUpdate::NoChange,
                Some(text) if text.trim().is_empty() => FieldUpdate::Clear,
                Some(text) => FieldUpdate::Set(text),
            };
            let patch = CardPatch {
                title: request.title,
                description,
                tags: None,
            };

            let next = self.store.update_card(board, card_id, patch)?;
            let next = match target {
                Some(column_id) => move_card_to_end(&next, card_id, column_id)?,
                None => next,
            };
            self.card_view(&next, card_id)
        })
        .await
    }

    pub async fn delete_card(&self, board_id: &str, card_hash: &str) -> TaskboardResult<()> {
        self.mutate(board_id, |board| {
            let card_id = resolve(board, HashNamespace::Card, card_hash)?;
            Ok((self.store.delete_card(board, card_id)?, ()))
        })
        .await
    }

    pub async fn create_column(
        &self,
        board_id: &str,
        request: CreateColumnRequest,
        idempotency_key: Option<String>,
    ) -> TaskboardResult<ColumnView> {
        self.mutate(board_id, move |board| {
            let key = idempotency_key.as_deref();
            if let Some(hash) = key.and_then(|k| find_idempotent(board, HashNamespace::Column, k))
            {
                tracing::debug!("Replaying column create for idempotency key {:?}", key);
                let column_id = resolve(board, HashNamespace::Column, hash)?;
                return Ok((board.clone(), ColumnView::new(board.require_column(column_id)?)));
            }

            let title = request
                .title
                .as_deref()
                .ok_or_else(|| TaskboardError::InvalidInput("title is required".to_string()))?;
            let insert_after = match request.insert_after.as_deref() {
                Some(hash) => Some(body_column(board, hash)?),
                None => None,
            };

            let (next, column_id) = self.store.create_column(board, title, insert_after)?;
            let (next, column_hash) = self.registry.ensure_hash(
                &next,
                HashNamespace::Column,
                column_id,
                &mut rand::rng(),
            )?;
            let next = match key {
                Some(key) => record_idempotency_key(&next, HashNamespace::Column, key, &column_hash),
                None => next,
            };
            let view = ColumnView::new(next.require_column(column_id)?);
            Ok((next, view))
        })
        .await
    }

    /// Delete an empty column. Non-empty columns are refused with their card count.
    pub async fn delete_column(&self, board_id: &str, column_hash: &str) -> TaskboardResult<()> {
        self.mutate(board_id, |board| {
            let column_id = resolve(board, HashNamespace::Column, column_hash)?;
            Ok((self.store.delete_column(board, column_id, None)?, ()))
        })
        .await
    }

    /// Ordered board view. Entities without a hash get one first, so
    /// everything listed is addressable.
    pub async fn board_view(&self, board_id: &str) -> TaskboardResult<BoardView> {
        self.mutate(board_id, |board| {
            let next = self.ensure_all_hashes(board)?;
            let view = BoardView::new(&next);
            Ok((next, view))
        })
        .await
    }

    pub async fn card_detail(
        &self,
        board_id: &str,
        card_hash: &str,
    ) -> TaskboardResult<CardDetailView> {
        self.mutate(board_id, |board| {
            let card_id = resolve(board, HashNamespace::Card, card_hash)?;
            let (next, _) = self.card_view(board, card_id)?;
            let card = next.require_card(card_id)?;
            let view = CardDetailView::new(card, next.require_column(card.column_id)?);
            Ok((next, view))
        })
        .await
    }

    /// Column named in a request body by hash or by name; hash wins.
    fn target_column(
        &self,
        board: &Board,
        column_hash: Option<&str>,
        column_name: Option<&str>,
    ) -> TaskboardResult<Option<ColumnId>> {
        match (column_hash, column_name) {
            (Some(hash), _) => body_column(board, hash).map(Some),
            (None, Some(name)) => board
                .find_column_by_name(name)
                .map(|column| Some(column.id))
                .ok_or_else(|| TaskboardError::InvalidInput(format!("no column named '{}'", name))),
            (None, None) => Ok(None),
        }
    }

    fn card_view(&self, board: &Board, card_id: CardId) -> TaskboardResult<(Board, CardView)> {
        let mut rng = rand::rng();
        let (next, _) = self
            .registry
            .ensure_hash(board, HashNamespace::Card, card_id, &mut rng)?;
        let column_id = next.require_card(card_id)?.column_id;
        let (next, _) = self
            .registry
            .ensure_hash(&next, HashNamespace::Column, column_id, &mut rng)?;
        let view = CardView::new(next.require_card(card_id)?, next.require_column(column_id)?);
        Ok((next, view))
    }

    fn ensure_all_hashes(&self, board: &Board) -> TaskboardResult<Board> {
        let mut rng = rand::rng();
        let mut next = board.clone();
        for column_id in board.column_order.iter().copied() {
            next = self
                .registry
                .ensure_hash(&next, HashNamespace::Column, column_id, &mut rng)?
                .0;
        }
        for card_id in board.cards.keys().copied() {
            next = self
                .registry
                .ensure_hash(&next, HashNamespace::Card, card_id, &mut rng)?
                .0;
        }
        Ok(next)
    }
}

/// Resolve a column hash taken from a request body. Unknown hashes here are
/// bad input rather than a missing resource.
fn body_column(board: &Board, hash: &str) -> TaskboardResult<ColumnId> {
    resolve(board, HashNamespace::Column, hash)
        .map_err(|_| TaskboardError::InvalidInput(format!("unknown column '{}'", hash)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskboard_persistence::MemoryStore;

    fn service() -> BoardService<MemoryStore> {
        BoardService::from_config(Arc::new(MemoryStore::default()), &AppConfig::default())
    }

    fn card_in(column: &str, title: &str) -> CreateCardRequest {
        CreateCardRequest {
            title: Some(title.to_string()),
            column_name: Some(column.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_same_idempotency_key_returns_same_card() {
        let service = service();
        let key = Some("retry-1".to_string());

        let first = service
            .create_card("main", card_in("To Do", "Ship it"), key.clone())
            .await
            .unwrap();
        let second = service
            .create_card("main", card_in("To Do", "Ship it"), key)
            .await
            .unwrap();

        assert_eq!(first.card_hash, second.card_hash);
        let board = service.repository().stored("main").unwrap();
        assert_eq!(board.cards.len(), 1);
    }

    #[tokio::test]
    async fn test_update_moves_card_to_end_of_new_column() {
        let service = service();
        service
            .create_card("main", card_in("Done", "Old"), None)
            .await
            .unwrap();
        let card = service
            .create_card("main", card_in("To Do", "Mover"), None)
            .await
            .unwrap();

        let updated = service
            .update_card(
                "main",
                &card.card_hash,
                UpdateCardRequest {
                    column_name: Some("done".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.column_name, "Done");
        let detail = service.card_detail("main", &card.card_hash).await.unwrap();
        assert_eq!(detail.order, 1);
    }

    #[tokio::test]
    async fn test_storage_failure_surfaces_and_keeps_saved_state() {
        let service = service();
        service
            .create_card("main", card_in("To Do", "Kept"), None)
            .await
            .unwrap();
        service.repository().set_fail_writes(true);

        let err = service
            .create_card("main", card_in("To Do", "Lost"), None)
            .await
            .unwrap_err();

        assert!(matches!(err, TaskboardError::StorageFailure(_)));
        let board = service.repository().stored("main").unwrap();
        assert_eq!(board.cards.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_creates_are_serialised() {
        let service = Arc::new(service());
        let mut handles = Vec::new();
        for i in 0..10 {
            let service = service.clone();
            handles.push(tokio::spawn(async move {
                service
                    .create_card("main", card_in("To Do", &format!("Card {}", i)), None)
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let board = service.repository().stored("main").unwrap();
        assert_eq!(board.cards.len(), 10);
        assert!(taskboard_domain::validate(&board).is_ok());
    }

    #[tokio::test]
    async fn test_invalid_board_id_takes_no_lock() {
        let service = service();

        for id in ["../etc", "has space", ""] {
            let err = service.board_view(id).await.unwrap_err();
            assert!(matches!(err, TaskboardError::InvalidInput(_)));
        }

        assert!(service.locks.lock().is_empty());
    }

    #[tokio::test]
    async fn test_idempotency_key_shared_by_card_and_column_creates() {
        let service = service();
        let key = Some("req-1".to_string());
        let column = || CreateColumnRequest {
            title: Some("Review".to_string()),
            insert_after: None,
        };

        let first = service
            .create_column("main", column(), key.clone())
            .await
            .unwrap();
        service
            .create_card("main", card_in("To Do", "Task"), key.clone())
            .await
            .unwrap();
        let retry = service.create_column("main", column(), key).await.unwrap();

        assert_eq!(first.column_hash, retry.column_hash);
        let board = service.repository().stored("main").unwrap();
        assert_eq!(board.columns.len(), 4);
        assert_eq!(board.cards.len(), 1);
    }
}
