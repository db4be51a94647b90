pub mod board;
pub mod card;
pub mod column;
pub mod field_update;
pub mod identity;
pub mod invariants;
pub mod reorder;
pub mod store;

pub use board::{Board, BoardId, BoardMetadata, BOARD_SCHEMA_VERSION};
pub use card::{Card, CardId, CardLifecycle, CardPatch, LifecycleEvent, Note, NoteId};
pub use column::{Column, ColumnId};
pub use field_update::FieldUpdate;
pub use identity::{
    find_idempotent, hashes_in_use, record_idempotency_key, resolve, ExternalIdentityRegistry,
    HashNamespace, IdempotencyRecord,
};
pub use invariants::{validate, InvariantViolation};
pub use reorder::{move_card, move_card_to_end, move_column};
pub use store::{ColumnDisposition, EntityStore};
