//! Property tests: random operation sequences must keep every board invariant.

use proptest::prelude::*;
use taskboard_core::TaskboardError;
use taskboard_domain::*;

const MAX_OPS: usize = 40;

#[derive(Debug, Clone)]
enum Op {
    CreateCard { column: usize, blank: bool },
    MoveCard { card: usize, column: usize, index: usize },
    DeleteCard { card: usize },
    AddNote { card: usize },
    CreateColumn { after: Option<usize> },
    MoveColumn { column: usize, index: usize },
    DeleteColumn { column: usize, mode: u8, target: usize },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0usize..8, proptest::bool::weighted(0.1))
            .prop_map(|(column, blank)| Op::CreateCard { column, blank }),
        4 => (0usize..32, 0usize..8, 0usize..12)
            .prop_map(|(card, column, index)| Op::MoveCard { card, column, index }),
        2 => (0usize..32).prop_map(|card| Op::DeleteCard { card }),
        1 => (0usize..32).prop_map(|card| Op::AddNote { card }),
        1 => proptest::option::of(0usize..8).prop_map(|after| Op::CreateColumn { after }),
        1 => (0usize..8, 0usize..10)
            .prop_map(|(column, index)| Op::MoveColumn { column, index }),
        1 => (0usize..8, 0u8..3, 0usize..8)
            .prop_map(|(column, mode, target)| Op::DeleteColumn { column, mode, target }),
    ]
}

fn nth_card(board: &Board, n: usize) -> Option<CardId> {
    if board.cards.is_empty() {
        return None;
    }
    board.cards.keys().nth(n % board.cards.len()).copied()
}

fn nth_column(board: &Board, n: usize) -> ColumnId {
    board.column_order[n % board.column_order.len()]
}

fn apply(store: &EntityStore, board: &Board, op: &Op) -> Result<Board, TaskboardError> {
    match op {
        Op::CreateCard { column, blank } => {
            let title = if *blank { "   " } else { "card" };
            store
                .create_card(board, nth_column(board, *column), title, None)
                .map(|(b, _)| b)
        }
        Op::MoveCard { card, column, index } => match nth_card(board, *card) {
            Some(id) => move_card(board, id, nth_column(board, *column), *index),
            None => Ok(board.clone()),
        },
        Op::DeleteCard { card } => match nth_card(board, *card) {
            Some(id) => store.delete_card(board, id),
            None => Ok(board.clone()),
        },
        Op::AddNote { card } => match nth_card(board, *card) {
            Some(id) => store.add_note(board, id, "note").map(|(b, _)| b),
            None => Ok(board.clone()),
        },
        Op::CreateColumn { after } => store
            .create_column(board, "column", after.map(|a| nth_column(board, a)))
            .map(|(b, _)| b),
        Op::MoveColumn { column, index } => move_column(board, nth_column(board, *column), *index),
        Op::DeleteColumn { column, mode, target } => {
            let disposition = match mode {
                0 => None,
                1 => Some(ColumnDisposition::DeleteCards),
                _ => Some(ColumnDisposition::MoveCardsTo(nth_column(board, *target))),
            };
            store.delete_column(board, nth_column(board, *column), disposition)
        }
    }
}

/// Only blank titles and guarded column deletes may be refused; every
/// other generated op targets entities that exist.
fn is_expected_rejection(op: &Op, err: &TaskboardError) -> bool {
    match (op, err) {
        (Op::CreateCard { blank: true, .. }, TaskboardError::InvalidInput(_)) => true,
        (Op::DeleteColumn { mode: 0, .. }, TaskboardError::ColumnNotEmpty { .. }) => true,
        (Op::DeleteColumn { mode, .. }, TaskboardError::InvalidInput(_)) => *mode >= 2,
        (Op::DeleteColumn { .. }, TaskboardError::CannotDeleteLastColumn) => true,
        _ => false,
    }
}

fn assert_valid(board: &Board) -> Result<(), TestCaseError> {
    if let Err(violations) = validate(board) {
        let messages: Vec<String> = violations.iter().map(|v| v.to_string()).collect();
        return Err(TestCaseError::fail(messages.join("; ")));
    }
    Ok(())
}

proptest! {
    #[test]
    fn invariants_hold_for_any_sequence(ops in proptest::collection::vec(op_strategy(), 1..MAX_OPS)) {
        let store = EntityStore::default();
        let mut board = Board::with_columns("prop", &["a", "b", "c"]);

        for op in &ops {
            match apply(&store, &board, op) {
                Ok(next) => {
                    assert_valid(&next)?;
                    match op {
                        Op::MoveCard { .. } | Op::MoveColumn { .. } | Op::AddNote { .. } => {
                            prop_assert_eq!(next.cards.len(), board.cards.len());
                        }
                        Op::DeleteCard { .. } if !board.cards.is_empty() => {
                            prop_assert_eq!(next.cards.len(), board.cards.len() - 1);
                        }
                        _ => {}
                    }
                    board = next;
                }
                Err(err) => {
                    prop_assert!(
                        is_expected_rejection(op, &err),
                        "{:?} failed with unexpected error: {}",
                        op,
                        err
                    );
                }
            }
        }
    }

    #[test]
    fn moving_to_current_position_is_identity(
        ops in proptest::collection::vec(op_strategy(), 1..MAX_OPS),
        pick in 0usize..32,
    ) {
        let store = EntityStore::default();
        let mut board = Board::with_columns("prop", &["a", "b"]);
        for op in &ops {
            if let Ok(next) = apply(&store, &board, op) {
                board = next;
            }
        }
        if let Some(id) = nth_card(&board, pick) {
            let card = board.card(id).unwrap().clone();
            let next = move_card(&board, id, card.column_id, card.order as usize).unwrap();
            prop_assert_eq!(next, board);
        }
    }

    #[test]
    fn json_round_trip_preserves_board(ops in proptest::collection::vec(op_strategy(), 1..MAX_OPS)) {
        let store = EntityStore::default();
        let mut board = Board::with_columns("prop", &["a", "b"]);
        for op in &ops {
            if let Ok(next) = apply(&store, &board, op) {
                board = next;
            }
        }

        let json = serde_json::to_string(&board).unwrap();
        let restored: Board = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(restored, board);
    }
}

#[test]
fn scenario_reorder_within_column() {
    let store = EntityStore::default();
    let board = Board::with_columns("s1", &["todo"]);
    let todo = board.column_order[0];
    let (board, a) = store.create_card(&board, todo, "A", None).unwrap();
    let (board, b) = store.create_card(&board, todo, "B", None).unwrap();
    let (board, c) = store.create_card(&board, todo, "C", None).unwrap();

    let board = move_card(&board, b, todo, 0).unwrap();

    let ids: Vec<_> = board.cards_in_column(todo).iter().map(|card| card.id).collect();
    assert_eq!(ids, vec![b, a, c]);
}

#[test]
fn scenario_delete_non_empty_column_without_disposition() {
    let store = EntityStore::default();
    let board = Board::with_columns("s3", &["todo", "done"]);
    let done = board.column_order[1];
    let (board, _) = store.create_card(&board, done, "C", None).unwrap();

    let result = store.delete_column(&board, done, None);

    assert!(matches!(
        result,
        Err(taskboard_core::TaskboardError::ColumnNotEmpty { .. })
    ));
    assert!(validate(&board).is_ok());
    assert_eq!(board.columns.len(), 2);
}

#[test]
fn notes_and_lifecycle_survive_round_trip() {
    let store = EntityStore::default();
    let board = Board::with_columns("rt", &["todo"]);
    let todo = board.column_order[0];
    let (board, id) = store.create_card(&board, todo, "A", Some("desc")).unwrap();
    let (board, _) = store.add_note(&board, id, "one").unwrap();
    let (board, _) = store.add_note(&board, id, "two").unwrap();
    let board = store
        .transition_card(&board, id, LifecycleEvent::Claim { by: "bot".into() })
        .unwrap();

    let json = serde_json::to_string_pretty(&board).unwrap();
    let restored: Board = serde_json::from_str(&json).unwrap();

    assert_eq!(restored, board);
    assert_eq!(restored.card(id).unwrap().notes.len(), 2);
}
