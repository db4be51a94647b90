//! Request bodies and response representations of the REST surface.
//!
//! Everything external is addressed by hash; internal ids never leave the
//! service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taskboard_domain::{Board, Card, CardLifecycle, Column, Note};

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCardRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub column_hash: Option<String>,
    pub column_name: Option<String>,
}

/// Body of `PUT /boards/:id/cards/:cardHash`.
///
/// An empty `description` string clears the description.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCardRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub column_hash: Option<String>,
    pub column_name: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateColumnRequest {
    pub title: Option<String>,
    pub insert_after: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardView {
    pub card_hash: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub column_hash: String,
    pub column_name: String,
    pub created_at: DateTime<Utc>,
}

impl CardView {
    /// Both the card and its column must already carry hashes.
    pub(crate) fn new(card: &Card, column: &Column) -> Self {
        Self {
            card_hash: card.hash.clone().unwrap_or_default(),
            title: card.title.clone(),
            description: card.description.clone(),
            column_hash: column.hash.clone().unwrap_or_default(),
            column_name: column.name().to_string(),
            created_at: card.created_at,
        }
    }
}

/// Full card representation for `GET /boards/:id/cards/:cardHash`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardDetailView {
    #[serde(flatten)]
    pub card: CardView,
    pub order: u32,
    pub updated_at: DateTime<Utc>,
    pub tags: Vec<String>,
    pub notes: Vec<Note>,
    pub lifecycle: CardLifecycle,
}

impl CardDetailView {
    pub(crate) fn new(card: &Card, column: &Column) -> Self {
        Self {
            card: CardView::new(card, column),
            order: card.order,
            updated_at: card.updated_at,
            tags: card.tags.clone(),
            notes: card.notes.clone(),
            lifecycle: card.lifecycle.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnView {
    pub column_hash: String,
    pub name: String,
    pub title: String,
    pub order: u32,
}

impl ColumnView {
    pub(crate) fn new(column: &Column) -> Self {
        Self {
            column_hash: column.hash.clone().unwrap_or_default(),
            name: column.name().to_string(),
            title: column.title.clone(),
            order: column.order,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnWithCardsView {
    #[serde(flatten)]
    pub column: ColumnView,
    pub cards: Vec<CardView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardView {
    pub id: String,
    pub updated_at: DateTime<Utc>,
    pub columns: Vec<ColumnWithCardsView>,
}

impl BoardView {
    pub(crate) fn new(board: &Board) -> Self {
        let columns = board
            .ordered_columns()
            .into_iter()
            .map(|column| ColumnWithCardsView {
                column: ColumnView::new(column),
                cards: board
                    .cards_in_column(column.id)
                    .into_iter()
                    .map(|card| CardView::new(card, column))
                    .collect(),
            })
            .collect();
        Self {
            id: board.id.clone(),
            updated_at: board.metadata.updated_at,
            columns,
        }
    }
}
