use crate::cli::BoardAction;
use crate::context::CliContext;
use serde::Serialize;
use serde_json::{json, Value};
use taskboard_domain::{validate, Board, Card, Column};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ColumnOutput<'a> {
    #[serde(flatten)]
    column: &'a Column,
    cards: Vec<&'a Card>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BoardOutput<'a> {
    id: &'a str,
    updated_at: String,
    columns: Vec<ColumnOutput<'a>>,
}

impl<'a> BoardOutput<'a> {
    fn new(board: &'a Board) -> Self {
        Self {
            id: &board.id,
            updated_at: board.metadata.updated_at.to_rfc3339(),
            columns: board
                .ordered_columns()
                .into_iter()
                .map(|column| ColumnOutput {
                    column,
                    cards: board.cards_in_column(column.id),
                })
                .collect(),
        }
    }
}

pub fn handle(ctx: &mut CliContext, action: BoardAction) -> anyhow::Result<Value> {
    match action {
        BoardAction::Show => {
            ctx.ensure_all_hashes()?;
            Ok(serde_json::to_value(BoardOutput::new(ctx.board()))?)
        }
        BoardAction::Check => {
            let board = ctx.board();
            match validate(board) {
                Ok(()) => Ok(json!({
                    "valid": true,
                    "columns": board.columns.len(),
                    "cards": board.cards.len(),
                })),
                Err(violations) => {
                    let messages: Vec<String> = violations.iter().map(|v| v.to_string()).collect();
                    anyhow::bail!("Board '{}' is invalid: {}", board.id, messages.join("; "))
                }
            }
        }
    }
}
