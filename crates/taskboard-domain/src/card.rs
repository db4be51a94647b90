use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use taskboard_core::{TaskboardError, TaskboardResult};
use uuid::Uuid;

use crate::column::ColumnId;
use crate::field_update::FieldUpdate;

pub type CardId = Uuid;
pub type NoteId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Note {
    pub fn new(text: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            text,
            created_at: Utc::now(),
        }
    }
}

/// Where a card stands with respect to an external worker.
///
/// Fields only exist on the variants they belong to, so a card can never
/// carry progress while it is still available.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum CardLifecycle {
    #[default]
    Available,
    Claimed {
        by: String,
        at: DateTime<Utc>,
    },
    InProgress {
        progress: u8,
    },
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    Claim { by: String },
    Start,
    Progress(u8),
    Complete,
    Release,
    Reopen,
}

impl CardLifecycle {
    pub fn label(&self) -> &'static str {
        match self {
            CardLifecycle::Available => "available",
            CardLifecycle::Claimed { .. } => "claimed",
            CardLifecycle::InProgress { .. } => "inProgress",
            CardLifecycle::Completed => "completed",
        }
    }

    /// Compute the state reached by applying `event`, rejecting transitions
    /// that make no sense from the current state.
    pub fn apply(&self, event: &LifecycleEvent, now: DateTime<Utc>) -> TaskboardResult<Self> {
        let next = match (self, event) {
            (CardLifecycle::Available, LifecycleEvent::Claim { by }) => {
                let by = by.trim();
                if by.is_empty() {
                    return Err(TaskboardError::InvalidInput(
                        "claimant must not be empty".to_string(),
                    ));
                }
                CardLifecycle::Claimed {
                    by: by.to_string(),
                    at: now,
                }
            }
            (CardLifecycle::Claimed { .. }, LifecycleEvent::Start) => {
                CardLifecycle::InProgress { progress: 0 }
            }
            (CardLifecycle::InProgress { .. }, LifecycleEvent::Progress(progress)) => {
                if *progress > 100 {
                    return Err(TaskboardError::InvalidInput(format!(
                        "progress must be between 0 and 100, got {}",
                        progress
                    )));
                }
                CardLifecycle::InProgress {
                    progress: *progress,
                }
            }
            (CardLifecycle::Completed, LifecycleEvent::Complete) => {
                return Err(TaskboardError::InvalidInput(
                    "card is already completed".to_string(),
                ));
            }
            (_, LifecycleEvent::Complete) => CardLifecycle::Completed,
            (
                CardLifecycle::Claimed { .. } | CardLifecycle::InProgress { .. },
                LifecycleEvent::Release,
            ) => CardLifecycle::Available,
            (CardLifecycle::Completed, LifecycleEvent::Reopen) => CardLifecycle::Available,
            (state, event) => {
                return Err(TaskboardError::InvalidInput(format!(
                    "cannot apply {:?} to a card that is {}",
                    event,
                    state.label()
                )));
            }
        };
        Ok(next)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: CardId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub column_id: ColumnId,
    pub order: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub notes: Vec<Note>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub lifecycle: CardLifecycle,
}

impl Card {
    pub fn new(column_id: ColumnId, title: String, description: Option<String>, order: u32) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title,
            description,
            column_id,
            order,
            created_at: now,
            updated_at: now,
            notes: Vec::new(),
            hash: None,
            tags: Vec::new(),
            lifecycle: CardLifecycle::Available,
        }
    }

    /// Place the card at `order` in `column_id`, returning whether anything changed.
    pub fn place(&mut self, column_id: ColumnId, order: u32, now: DateTime<Utc>) -> bool {
        if self.column_id == column_id && self.order == order {
            return false;
        }
        self.column_id = column_id;
        self.order = order;
        self.updated_at = now;
        true
    }
}

/// Partial update of the user-editable fields of a card.
///
/// Position and column are deliberately absent: those only change through
/// the reorder functions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CardPatch {
    pub title: Option<String>,
    pub description: FieldUpdate<String>,
    pub tags: Option<Vec<String>>,
}

impl CardPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && !self.description.is_change() && self.tags.is_none()
    }
}
