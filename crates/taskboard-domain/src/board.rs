use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use taskboard_core::{TaskboardError, TaskboardResult};

use crate::card::{Card, CardId};
use crate::column::{Column, ColumnId};
use crate::identity::{HashNamespace, IdempotencyRecord};

pub type BoardId = String;

pub const BOARD_SCHEMA_VERSION: u32 = 1;
const MAX_BOARD_ID_LENGTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardMetadata {
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Aggregate root: normalized maps of columns and cards plus the column
/// display order.
///
/// A `Board` is treated as an immutable snapshot. The mutation functions in
/// [`crate::store`] and [`crate::reorder`] take `&Board` and hand back a new
/// one, so a rejected mutation can never leave a half-applied state behind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub id: BoardId,
    #[serde(default)]
    pub cards: BTreeMap<CardId, Card>,
    #[serde(default)]
    pub columns: BTreeMap<ColumnId, Column>,
    #[serde(default)]
    pub column_order: Vec<ColumnId>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub idempotency_keys: BTreeMap<String, IdempotencyRecord>,
    pub metadata: BoardMetadata,
}

impl Board {
    pub fn new(id: impl Into<BoardId>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            cards: BTreeMap::new(),
            columns: BTreeMap::new(),
            column_order: Vec::new(),
            idempotency_keys: BTreeMap::new(),
            metadata: BoardMetadata {
                version: BOARD_SCHEMA_VERSION,
                created_at: now,
                updated_at: now,
            },
        }
    }

    /// A fresh board seeded with one column per title, in order.
    pub fn with_columns<S: AsRef<str>>(id: impl Into<BoardId>, titles: &[S]) -> Self {
        let mut board = Self::new(id);
        for (index, title) in titles.iter().enumerate() {
            let column = Column::new(title.as_ref().to_string(), index as u32);
            board.column_order.push(column.id);
            board.columns.insert(column.id, column);
        }
        board
    }

    pub fn validate_id(id: &str) -> TaskboardResult<()> {
        let valid = !id.is_empty()
            && id.len() <= MAX_BOARD_ID_LENGTH
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if valid {
            Ok(())
        } else {
            Err(TaskboardError::InvalidInput(format!(
                "board id '{}' must be 1-{} characters of [A-Za-z0-9_-]",
                id, MAX_BOARD_ID_LENGTH
            )))
        }
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.metadata.updated_at = now;
    }

    pub fn card(&self, id: CardId) -> Option<&Card> {
        self.cards.get(&id)
    }

    pub fn column(&self, id: ColumnId) -> Option<&Column> {
        self.columns.get(&id)
    }

    pub fn require_card(&self, id: CardId) -> TaskboardResult<&Card> {
        self.card(id)
            .ok_or_else(|| TaskboardError::CardNotFound(id.to_string()))
    }

    pub fn require_column(&self, id: ColumnId) -> TaskboardResult<&Column> {
        self.column(id)
            .ok_or_else(|| TaskboardError::ColumnNotFound(id.to_string()))
    }

    /// Columns in display order.
    pub fn ordered_columns(&self) -> Vec<&Column> {
        self.column_order
            .iter()
            .filter_map(|id| self.columns.get(id))
            .collect()
    }

    /// Cards of one column sorted by their order index.
    pub fn cards_in_column(&self, column_id: ColumnId) -> Vec<&Card> {
        let mut cards: Vec<&Card> = self
            .cards
            .values()
            .filter(|c| c.column_id == column_id)
            .collect();
        cards.sort_by_key(|c| c.order);
        cards
    }

    pub fn card_count(&self, column_id: ColumnId) -> usize {
        self.cards
            .values()
            .filter(|c| c.column_id == column_id)
            .count()
    }

    pub fn find_column_by_name(&self, name: &str) -> Option<&Column> {
        self.ordered_columns()
            .into_iter()
            .find(|c| c.matches_name(name))
    }

    /// Drop idempotency records pointing at a hash whose entity is gone.
    pub(crate) fn forget_idempotency(&mut self, namespace: HashNamespace, hash: &str) {
        self.idempotency_keys
            .retain(|_, record| !(record.namespace == namespace && record.hash == hash));
    }
}
