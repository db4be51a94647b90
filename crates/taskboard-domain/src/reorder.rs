//! Position bookkeeping for cards and columns.
//!
//! Pure functions over a [`Board`] snapshot. Every function keeps card order
//! indices dense (`0..k`) per column and `column_order` a permutation of the
//! column keys. `target_index` is an insertion index into the destination
//! list with the moved entity already removed; out-of-range values clamp.

use chrono::{DateTime, Utc};
use taskboard_core::{TaskboardError, TaskboardResult};

use crate::board::Board;
use crate::card::CardId;
use crate::column::ColumnId;

/// Move a card to `target_index` within `to_column_id`.
///
/// Returns the input unchanged (timestamps included) when the move would not
/// alter any card's column or order.
pub fn move_card(
    board: &Board,
    card_id: CardId,
    to_column_id: ColumnId,
    target_index: usize,
) -> TaskboardResult<Board> {
    let card = board.require_card(card_id)?;
    board.require_column(to_column_id)?;
    let from_column_id = card.column_id;

    if from_column_id == to_column_id && card.order as usize == target_index {
        return Ok(board.clone());
    }

    let mut destination = sibling_ids(board, to_column_id, card_id);
    let index = clamp_index(target_index, destination.len());
    destination.insert(index, card_id);

    let mut next = board.clone();
    let now = Utc::now();
    let mut changed = false;
    if from_column_id != to_column_id {
        let source = sibling_ids(board, from_column_id, card_id);
        changed |= apply_sequence(&mut next, from_column_id, &source, now);
    }
    changed |= apply_sequence(&mut next, to_column_id, &destination, now);

    if !changed {
        return Ok(board.clone());
    }
    next.touch(now);
    tracing::debug!(
        "Moved card {} from column {} to column {} at index {}",
        card_id,
        from_column_id,
        to_column_id,
        index
    );
    Ok(next)
}

/// Move a card to the end of `to_column_id`. A card already in that column
/// stays where it is.
pub fn move_card_to_end(
    board: &Board,
    card_id: CardId,
    to_column_id: ColumnId,
) -> TaskboardResult<Board> {
    let card = board.require_card(card_id)?;
    board.require_column(to_column_id)?;
    if card.column_id == to_column_id {
        return Ok(board.clone());
    }
    let end = board.card_count(to_column_id);
    move_card(board, card_id, to_column_id, end)
}

/// Move a column to `target_index` within `column_order`.
pub fn move_column(
    board: &Board,
    column_id: ColumnId,
    target_index: usize,
) -> TaskboardResult<Board> {
    let current = board
        .column_order
        .iter()
        .position(|id| *id == column_id)
        .ok_or_else(|| TaskboardError::ColumnNotFound(column_id.to_string()))?;
    if current == target_index {
        return Ok(board.clone());
    }

    let mut order = board.column_order.clone();
    order.remove(current);
    let index = clamp_index(target_index, order.len());
    order.insert(index, column_id);
    if order == board.column_order {
        return Ok(board.clone());
    }

    let mut next = board.clone();
    next.column_order = order;
    reindex_columns(&mut next);
    next.touch(Utc::now());
    tracing::debug!("Moved column {} to index {}", column_id, index);
    Ok(next)
}

/// Close any gaps in a column's order sequence, keeping relative order.
pub(crate) fn compact_column(board: &mut Board, column_id: ColumnId, now: DateTime<Utc>) -> bool {
    let ids: Vec<CardId> = board
        .cards_in_column(column_id)
        .iter()
        .map(|c| c.id)
        .collect();
    apply_sequence(board, column_id, &ids, now)
}

/// Set every column's `order` to its position in `column_order`.
pub(crate) fn reindex_columns(board: &mut Board) {
    for (index, id) in board.column_order.iter().enumerate() {
        if let Some(column) = board.columns.get_mut(id) {
            column.order = index as u32;
        }
    }
}

/// Ids of the cards in `column_id`, by order, without `excluded`.
fn sibling_ids(board: &Board, column_id: ColumnId, excluded: CardId) -> Vec<CardId> {
    board
        .cards_in_column(column_id)
        .iter()
        .filter(|c| c.id != excluded)
        .map(|c| c.id)
        .collect()
}

/// Make `sequence` the content of `column_id`, order = index. Only cards whose
/// placement actually changes get a new `updated_at`.
pub(crate) fn apply_sequence(
    board: &mut Board,
    column_id: ColumnId,
    sequence: &[CardId],
    now: DateTime<Utc>,
) -> bool {
    let mut changed = false;
    for (index, id) in sequence.iter().enumerate() {
        if let Some(card) = board.cards.get_mut(id) {
            changed |= card.place(column_id, index as u32, now);
        }
    }
    changed
}

fn clamp_index(requested: usize, len: usize) -> usize {
    if requested > len {
        tracing::warn!(
            "Target index {} out of range for list of {}; clamping to {}",
            requested,
            len,
            len
        );
        len
    } else {
        requested
    }
}
