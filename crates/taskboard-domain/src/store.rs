//! Invariant-preserving primitive mutations over a [`Board`] snapshot.
//!
//! Every operation is `(&Board, args) -> Result<Board>`; the input snapshot is
//! never modified, so a rejected mutation leaves the caller's board intact.
//! Persisting the returned board is the caller's job.

use chrono::Utc;
use taskboard_core::config::DEFAULT_MAX_TITLE_LENGTH;
use taskboard_core::{AppConfig, TaskboardError, TaskboardResult};

use crate::board::Board;
use crate::card::{Card, CardId, CardPatch, LifecycleEvent, Note, NoteId};
use crate::column::{Column, ColumnId};
use crate::identity::HashNamespace;
use crate::reorder::{apply_sequence, compact_column, reindex_columns};

/// What happens to the cards of a column being deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnDisposition {
    /// Append them, in their current order, to the end of another column.
    MoveCardsTo(ColumnId),
    /// Delete them (and their notes) along with the column.
    DeleteCards,
}

#[derive(Debug, Clone)]
pub struct EntityStore {
    max_title_length: usize,
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TITLE_LENGTH)
    }
}

impl EntityStore {
    pub fn new(max_title_length: usize) -> Self {
        Self { max_title_length }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.max_title_length)
    }

    pub fn max_title_length(&self) -> usize {
        self.max_title_length
    }

    /// Trim and validate a card or column title.
    pub fn normalize_title(&self, title: &str) -> TaskboardResult<String> {
        let trimmed = title.trim();
        if trimmed.is_empty() {
            return Err(TaskboardError::InvalidInput(
                "title must not be empty".to_string(),
            ));
        }
        let length = trimmed.chars().count();
        if length > self.max_title_length {
            return Err(TaskboardError::InvalidInput(format!(
                "title is {} characters, the limit is {}",
                length, self.max_title_length
            )));
        }
        Ok(trimmed.to_string())
    }

    /// Append a new card to the end of `column_id`.
    pub fn create_card(
        &self,
        board: &Board,
        column_id: ColumnId,
        title: &str,
        description: Option<&str>,
    ) -> TaskboardResult<(Board, CardId)> {
        board.require_column(column_id)?;
        let title = self.normalize_title(title)?;

        let mut next = board.clone();
        let order = next.card_count(column_id) as u32;
        let card = Card::new(column_id, title, normalize_description(description), order);
        let card_id = card.id;
        next.touch(card.created_at);
        next.cards.insert(card_id, card);

        tracing::debug!("Created card {} in column {} at {}", card_id, column_id, order);
        Ok((next, card_id))
    }

    /// Add a column at the end, or directly after `insert_after`.
    pub fn create_column(
        &self,
        board: &Board,
        title: &str,
        insert_after: Option<ColumnId>,
    ) -> TaskboardResult<(Board, ColumnId)> {
        let position = match insert_after {
            Some(after) => {
                board
                    .column_order
                    .iter()
                    .position(|id| *id == after)
                    .ok_or_else(|| TaskboardError::ColumnNotFound(after.to_string()))?
                    + 1
            }
            None => board.column_order.len(),
        };
        let title = self.normalize_title(title)?;

        let mut next = board.clone();
        let column = Column::new(title, position as u32);
        let column_id = column.id;
        next.columns.insert(column_id, column);
        next.column_order.insert(position, column_id);
        reindex_columns(&mut next);
        next.touch(Utc::now());

        tracing::debug!("Created column {} at {}", column_id, position);
        Ok((next, column_id))
    }

    pub fn rename_column(
        &self,
        board: &Board,
        column_id: ColumnId,
        title: &str,
    ) -> TaskboardResult<Board> {
        board.require_column(column_id)?;
        let title = self.normalize_title(title)?;

        let mut next = board.clone();
        if let Some(column) = next.columns.get_mut(&column_id) {
            if column.title == title {
                return Ok(board.clone());
            }
            column.rename(title);
        }
        next.touch(Utc::now());
        Ok(next)
    }

    /// Apply a partial update to title, description and tags.
    ///
    /// An empty patch returns the board untouched.
    pub fn update_card(
        &self,
        board: &Board,
        card_id: CardId,
        patch: CardPatch,
    ) -> TaskboardResult<Board> {
        board.require_card(card_id)?;
        if patch.is_empty() {
            return Ok(board.clone());
        }
        let title = patch
            .title
            .as_deref()
            .map(|t| self.normalize_title(t))
            .transpose()?;

        let mut next = board.clone();
        let now = Utc::now();
        if let Some(card) = next.cards.get_mut(&card_id) {
            if let Some(title) = title {
                card.title = title;
            }
            patch
                .description
                .map(|d| d.trim().to_string())
                .apply_to(&mut card.description);
            if card.description.as_deref() == Some("") {
                card.description = None;
            }
            if let Some(tags) = patch.tags {
                card.tags = normalize_tags(tags);
            }
            card.updated_at = now;
        }
        next.touch(now);
        Ok(next)
    }

    /// Remove a card and its notes, then close the gap it leaves.
    pub fn delete_card(&self, board: &Board, card_id: CardId) -> TaskboardResult<Board> {
        let column_id = board.require_card(card_id)?.column_id;

        let mut next = board.clone();
        let now = Utc::now();
        if let Some(card) = next.cards.remove(&card_id) {
            if let Some(hash) = card.hash.as_deref() {
                next.forget_idempotency(HashNamespace::Card, hash);
            }
        }
        compact_column(&mut next, column_id, now);
        next.touch(now);

        tracing::debug!("Deleted card {} from column {}", card_id, column_id);
        Ok(next)
    }

    /// Delete a column. A non-empty column needs an explicit disposition, and
    /// the last column can never go.
    pub fn delete_column(
        &self,
        board: &Board,
        column_id: ColumnId,
        disposition: Option<ColumnDisposition>,
    ) -> TaskboardResult<Board> {
        let column = board.require_column(column_id)?;
        if board.columns.len() <= 1 {
            return Err(TaskboardError::CannotDeleteLastColumn);
        }
        let contained: Vec<CardId> = board
            .cards_in_column(column_id)
            .iter()
            .map(|c| c.id)
            .collect();

        let mut next = board.clone();
        let now = Utc::now();
        match (disposition, contained.is_empty()) {
            (None, false) => {
                return Err(TaskboardError::ColumnNotEmpty {
                    column_id: column_id.to_string(),
                    card_count: contained.len(),
                });
            }
            (None, true) => {}
            (Some(ColumnDisposition::MoveCardsTo(target)), _) => {
                if target == column_id {
                    return Err(TaskboardError::InvalidInput(
                        "cannot move cards into the column being deleted".to_string(),
                    ));
                }
                board.require_column(target)?;
                let mut sequence: Vec<CardId> = board
                    .cards_in_column(target)
                    .iter()
                    .map(|c| c.id)
                    .collect();
                sequence.extend(contained.iter().copied());
                apply_sequence(&mut next, target, &sequence, now);
            }
            (Some(ColumnDisposition::DeleteCards), _) => {
                for card_id in &contained {
                    if let Some(card) = next.cards.remove(card_id) {
                        if let Some(hash) = card.hash.as_deref() {
                            next.forget_idempotency(HashNamespace::Card, hash);
                        }
                    }
                }
            }
        }

        if let Some(hash) = column.hash.as_deref() {
            next.forget_idempotency(HashNamespace::Column, hash);
        }
        next.columns.remove(&column_id);
        next.column_order.retain(|id| *id != column_id);
        reindex_columns(&mut next);
        next.touch(now);

        tracing::debug!(
            "Deleted column {} ({} card(s), {:?})",
            column_id,
            contained.len(),
            disposition
        );
        Ok(next)
    }

    pub fn add_note(
        &self,
        board: &Board,
        card_id: CardId,
        text: &str,
    ) -> TaskboardResult<(Board, NoteId)> {
        board.require_card(card_id)?;
        let text = text.trim();
        if text.is_empty() {
            return Err(TaskboardError::InvalidInput(
                "note text must not be empty".to_string(),
            ));
        }

        let mut next = board.clone();
        let note = Note::new(text.to_string());
        let note_id = note.id;
        let now = note.created_at;
        if let Some(card) = next.cards.get_mut(&card_id) {
            card.notes.push(note);
            card.updated_at = now;
        }
        next.touch(now);
        Ok((next, note_id))
    }

    pub fn delete_note(
        &self,
        board: &Board,
        card_id: CardId,
        note_id: NoteId,
    ) -> TaskboardResult<Board> {
        let card = board.require_card(card_id)?;
        if !card.notes.iter().any(|n| n.id == note_id) {
            return Err(TaskboardError::NoteNotFound(note_id.to_string()));
        }

        let mut next = board.clone();
        let now = Utc::now();
        if let Some(card) = next.cards.get_mut(&card_id) {
            card.notes.retain(|n| n.id != note_id);
            card.updated_at = now;
        }
        next.touch(now);
        Ok(next)
    }

    /// Advance a card's lifecycle (claim, start, progress, complete, ...).
    pub fn transition_card(
        &self,
        board: &Board,
        card_id: CardId,
        event: LifecycleEvent,
    ) -> TaskboardResult<Board> {
        let now = Utc::now();
        let lifecycle = board.require_card(card_id)?.lifecycle.apply(&event, now)?;

        let mut next = board.clone();
        if let Some(card) = next.cards.get_mut(&card_id) {
            card.lifecycle = lifecycle;
            card.updated_at = now;
        }
        next.touch(now);
        Ok(next)
    }
}

fn normalize_description(description: Option<&str>) -> Option<String> {
    description
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
}

/// Trim, drop blanks, and de-duplicate tags keeping first occurrence.
fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !normalized.iter().any(|t| t == tag) {
            normalized.push(tag.to_string());
        }
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::CardLifecycle;
    use crate::field_update::FieldUpdate;
    use crate::identity::{record_idempotency_key, ExternalIdentityRegistry};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn two_columns() -> (Board, ColumnId, ColumnId) {
        let board = Board::with_columns("test", &["todo", "done"]);
        let todo = board.column_order[0];
        let done = board.column_order[1];
        (board, todo, done)
    }

    fn orders(board: &Board, column_id: ColumnId) -> Vec<u32> {
        board
            .cards_in_column(column_id)
            .iter()
            .map(|c| c.order)
            .collect()
    }

    #[test]
    fn test_create_card_appends() {
        let store = EntityStore::default();
        let (board, todo, _) = two_columns();
        let (board, first) = store.create_card(&board, todo, "First", None).unwrap();
        let (board, second) = store
            .create_card(&board, todo, "  Second  ", Some("details"))
            .unwrap();

        assert_eq!(board.card(first).unwrap().order, 0);
        let second = board.card(second).unwrap();
        assert_eq!(second.order, 1);
        assert_eq!(second.title, "Second");
        assert_eq!(second.description.as_deref(), Some("details"));
        assert_eq!(second.lifecycle, CardLifecycle::Available);
    }

    #[test]
    fn test_create_card_rejects_blank_title() {
        let store = EntityStore::default();
        let (board, todo, _) = two_columns();

        let err = store.create_card(&board, todo, "  ", None).unwrap_err();

        assert!(matches!(err, TaskboardError::InvalidInput(_)));
        assert!(board.cards.is_empty());
    }

    #[test]
    fn test_create_card_rejects_oversized_title() {
        let store = EntityStore::default();
        let (board, todo, _) = two_columns();

        assert!(store.create_card(&board, todo, &"x".repeat(500), None).is_ok());
        let err = store
            .create_card(&board, todo, &"x".repeat(501), None)
            .unwrap_err();
        assert!(matches!(err, TaskboardError::InvalidInput(_)));
    }

    #[test]
    fn test_create_card_unknown_column() {
        let store = EntityStore::default();
        let (board, _, _) = two_columns();

        let err = store
            .create_card(&board, uuid::Uuid::new_v4(), "Task", None)
            .unwrap_err();

        assert!(matches!(err, TaskboardError::ColumnNotFound(_)));
    }

    #[test]
    fn test_create_column_after_shifts_following() {
        let store = EntityStore::default();
        let (board, todo, done) = two_columns();

        let (board, doing) = store.create_column(&board, "doing", Some(todo)).unwrap();

        assert_eq!(board.column_order, vec![todo, doing, done]);
        assert_eq!(board.column(doing).unwrap().order, 1);
        assert_eq!(board.column(done).unwrap().order, 2);
    }

    #[test]
    fn test_create_column_at_end_and_unknown_anchor() {
        let store = EntityStore::default();
        let (board, _, _) = two_columns();

        let (next, archive) = store.create_column(&board, "archive", None).unwrap();
        assert_eq!(next.column(archive).unwrap().order, 2);

        let err = store
            .create_column(&board, "x", Some(uuid::Uuid::new_v4()))
            .unwrap_err();
        assert!(matches!(err, TaskboardError::ColumnNotFound(_)));
    }

    #[test]
    fn test_update_card_patch() {
        let store = EntityStore::default();
        let (board, todo, _) = two_columns();
        let (board, id) = store
            .create_card(&board, todo, "Task", Some("old"))
            .unwrap();
        let created = board.card(id).unwrap().clone();

        let patch = CardPatch {
            title: Some("Renamed".into()),
            description: FieldUpdate::Clear,
            tags: Some(vec!["ui".into(), " ui ".into(), "".into(), "bug".into()]),
        };
        let next = store.update_card(&board, id, patch).unwrap();

        let card = next.card(id).unwrap();
        assert_eq!(card.title, "Renamed");
        assert_eq!(card.description, None);
        assert_eq!(card.tags, vec!["ui".to_string(), "bug".to_string()]);
        assert_eq!(card.order, created.order);
        assert_eq!(card.column_id, created.column_id);
        assert!(card.updated_at >= created.updated_at);
    }

    #[test]
    fn test_update_card_errors_leave_board() {
        let store = EntityStore::default();
        let (board, todo, _) = two_columns();
        let (board, id) = store.create_card(&board, todo, "Task", None).unwrap();

        let patch = CardPatch {
            title: Some(" ".into()),
            ..Default::default()
        };
        assert!(store.update_card(&board, id, patch).is_err());
        assert!(matches!(
            store.update_card(&board, uuid::Uuid::new_v4(), CardPatch::default()),
            Err(TaskboardError::CardNotFound(_))
        ));
        assert_eq!(board.card(id).unwrap().title, "Task");
    }

    #[test]
    fn test_delete_card_closes_gap() {
        let store = EntityStore::default();
        let (board, todo, _) = two_columns();
        let (board, a) = store.create_card(&board, todo, "A", None).unwrap();
        let (board, _) = store.create_card(&board, todo, "B", None).unwrap();
        let (board, _) = store.create_card(&board, todo, "C", None).unwrap();

        let next = store.delete_card(&board, a).unwrap();

        assert_eq!(next.cards.len(), 2);
        assert_eq!(orders(&next, todo), vec![0, 1]);
        assert!(matches!(
            store.delete_card(&next, a),
            Err(TaskboardError::CardNotFound(_))
        ));
    }

    #[test]
    fn test_delete_card_drops_idempotency_record() {
        let store = EntityStore::default();
        let (board, todo, _) = two_columns();
        let (board, id) = store.create_card(&board, todo, "A", None).unwrap();
        let (board, hash) = ExternalIdentityRegistry::default()
            .ensure_hash(&board, HashNamespace::Card, id, &mut StdRng::seed_from_u64(5))
            .unwrap();
        let board = record_idempotency_key(&board, HashNamespace::Card, "k", &hash);

        let next = store.delete_card(&board, id).unwrap();

        assert!(next.idempotency_keys.is_empty());
    }

    #[test]
    fn test_delete_non_empty_column_requires_disposition() {
        let store = EntityStore::default();
        let (board, _, done) = two_columns();
        let (board, _) = store.create_card(&board, done, "C", None).unwrap();

        let err = store.delete_column(&board, done, None).unwrap_err();

        assert!(matches!(
            err,
            TaskboardError::ColumnNotEmpty { card_count: 1, .. }
        ));
        assert!(board.column(done).is_some());
    }

    #[test]
    fn test_delete_last_column() {
        let store = EntityStore::default();
        let board = Board::with_columns("test", &["only"]);
        let only = board.column_order[0];

        let err = store
            .delete_column(&board, only, Some(ColumnDisposition::DeleteCards))
            .unwrap_err();

        assert!(matches!(err, TaskboardError::CannotDeleteLastColumn));
    }

    #[test]
    fn test_delete_column_moving_cards() {
        let store = EntityStore::default();
        let (board, todo, done) = two_columns();
        let (board, a) = store.create_card(&board, todo, "A", None).unwrap();
        let (board, b) = store.create_card(&board, done, "B", None).unwrap();
        let (board, c) = store.create_card(&board, done, "C", None).unwrap();

        let next = store
            .delete_column(&board, done, Some(ColumnDisposition::MoveCardsTo(todo)))
            .unwrap();

        assert_eq!(next.column_order, vec![todo]);
        assert_eq!(next.column(todo).unwrap().order, 0);
        let ids: Vec<_> = next.cards_in_column(todo).iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![a, b, c]);
        assert_eq!(orders(&next, todo), vec![0, 1, 2]);
    }

    #[test]
    fn test_delete_column_with_cards() {
        let store = EntityStore::default();
        let (board, todo, done) = two_columns();
        let (board, _) = store.create_card(&board, done, "B", None).unwrap();

        let next = store
            .delete_column(&board, done, Some(ColumnDisposition::DeleteCards))
            .unwrap();

        assert!(next.cards.is_empty());
        assert_eq!(next.column_order, vec![todo]);
    }

    #[test]
    fn test_delete_column_move_into_itself_rejected() {
        let store = EntityStore::default();
        let (board, _, done) = two_columns();

        let err = store
            .delete_column(&board, done, Some(ColumnDisposition::MoveCardsTo(done)))
            .unwrap_err();

        assert!(matches!(err, TaskboardError::InvalidInput(_)));
    }

    #[test]
    fn test_notes_follow_card() {
        let store = EntityStore::default();
        let (board, todo, _) = two_columns();
        let (board, id) = store.create_card(&board, todo, "A", None).unwrap();
        let (board, note) = store.add_note(&board, id, "first note").unwrap();
        assert_eq!(board.card(id).unwrap().notes.len(), 1);
        assert!(store.add_note(&board, id, " ").is_err());

        let without = store.delete_note(&board, id, note).unwrap();
        assert!(without.card(id).unwrap().notes.is_empty());
        assert!(matches!(
            store.delete_note(&without, id, note),
            Err(TaskboardError::NoteNotFound(_))
        ));
    }

    #[test]
    fn test_transition_card() {
        let store = EntityStore::default();
        let (board, todo, _) = two_columns();
        let (board, id) = store.create_card(&board, todo, "A", None).unwrap();

        let board = store
            .transition_card(&board, id, LifecycleEvent::Claim { by: "agent".into() })
            .unwrap();
        let board = store
            .transition_card(&board, id, LifecycleEvent::Start)
            .unwrap();

        assert_eq!(
            board.card(id).unwrap().lifecycle,
            CardLifecycle::InProgress { progress: 0 }
        );
        assert!(store
            .transition_card(&board, id, LifecycleEvent::Reopen)
            .is_err());
    }

    #[test]
    fn test_rename_column() {
        let store = EntityStore::default();
        let (board, todo, _) = two_columns();

        let next = store.rename_column(&board, todo, "Backlog").unwrap();
        assert_eq!(next.column(todo).unwrap().title, "Backlog");
        assert!(store.rename_column(&board, todo, "").is_err());
    }
}
