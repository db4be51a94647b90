use std::collections::{BTreeMap, HashSet};
use std::fmt;
use uuid::Uuid;

use crate::board::Board;
use crate::column::ColumnId;
use crate::identity::HashNamespace;

/// A structural rule a board snapshot breaks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    DanglingColumnRef {
        card_id: Uuid,
        column_id: ColumnId,
    },
    CardOrderNotDense {
        column_id: ColumnId,
        orders: Vec<u32>,
    },
    ColumnOrderNotPermutation,
    ColumnIndexMismatch {
        column_id: ColumnId,
        expected: u32,
        actual: u32,
    },
    KeyMismatch {
        key: Uuid,
        id: Uuid,
    },
    DuplicateNoteId {
        note_id: Uuid,
    },
    DuplicateHash {
        namespace: HashNamespace,
        hash: String,
    },
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvariantViolation::DanglingColumnRef { card_id, column_id } => {
                write!(f, "card {} references missing column {}", card_id, column_id)
            }
            InvariantViolation::CardOrderNotDense { column_id, orders } => {
                write!(f, "column {} has card orders {:?}", column_id, orders)
            }
            InvariantViolation::ColumnOrderNotPermutation => {
                write!(f, "columnOrder is not a permutation of the column keys")
            }
            InvariantViolation::ColumnIndexMismatch {
                column_id,
                expected,
                actual,
            } => write!(
                f,
                "column {} has order {} but sits at index {}",
                column_id, actual, expected
            ),
            InvariantViolation::KeyMismatch { key, id } => {
                write!(f, "entity {} stored under key {}", id, key)
            }
            InvariantViolation::DuplicateNoteId { note_id } => {
                write!(f, "note id {} appears more than once", note_id)
            }
            InvariantViolation::DuplicateHash { namespace, hash } => {
                write!(f, "{} hash {} is assigned more than once", namespace, hash)
            }
        }
    }
}

/// Check every structural invariant of a board, collecting all violations.
pub fn validate(board: &Board) -> Result<(), Vec<InvariantViolation>> {
    let mut violations = Vec::new();

    for (key, card) in &board.cards {
        if *key != card.id {
            violations.push(InvariantViolation::KeyMismatch { key: *key, id: card.id });
        }
        if !board.columns.contains_key(&card.column_id) {
            violations.push(InvariantViolation::DanglingColumnRef {
                card_id: card.id,
                column_id: card.column_id,
            });
        }
    }
    for (key, column) in &board.columns {
        if *key != column.id {
            violations.push(InvariantViolation::KeyMismatch {
                key: *key,
                id: column.id,
            });
        }
    }

    let mut orders_by_column: BTreeMap<ColumnId, Vec<u32>> = BTreeMap::new();
    for card in board.cards.values() {
        orders_by_column
            .entry(card.column_id)
            .or_default()
            .push(card.order);
    }
    for (column_id, mut orders) in orders_by_column {
        orders.sort_unstable();
        let dense = orders
            .iter()
            .enumerate()
            .all(|(index, order)| *order as usize == index);
        if !dense {
            violations.push(InvariantViolation::CardOrderNotDense { column_id, orders });
        }
    }

    let listed: HashSet<&ColumnId> = board.column_order.iter().collect();
    if listed.len() != board.column_order.len()
        || listed.len() != board.columns.len()
        || !board.columns.keys().all(|id| listed.contains(id))
    {
        violations.push(InvariantViolation::ColumnOrderNotPermutation);
    }
    for (index, id) in board.column_order.iter().enumerate() {
        if let Some(column) = board.columns.get(id) {
            if column.order as usize != index {
                violations.push(InvariantViolation::ColumnIndexMismatch {
                    column_id: *id,
                    expected: index as u32,
                    actual: column.order,
                });
            }
        }
    }

    let mut note_ids = HashSet::new();
    for note in board.cards.values().flat_map(|c| c.notes.iter()) {
        if !note_ids.insert(note.id) {
            violations.push(InvariantViolation::DuplicateNoteId { note_id: note.id });
        }
    }

    check_hashes(
        HashNamespace::Card,
        board.cards.values().filter_map(|c| c.hash.as_deref()),
        &mut violations,
    );
    check_hashes(
        HashNamespace::Column,
        board.columns.values().filter_map(|c| c.hash.as_deref()),
        &mut violations,
    );

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

fn check_hashes<'a>(
    namespace: HashNamespace,
    hashes: impl Iterator<Item = &'a str>,
    violations: &mut Vec<InvariantViolation>,
) {
    let mut seen = HashSet::new();
    for hash in hashes {
        if !seen.insert(hash) {
            violations.push(InvariantViolation::DuplicateHash {
                namespace,
                hash: hash.to_string(),
            });
        }
    }
}
