use crate::cli::{ColumnAction, ColumnDeleteArgs};
use crate::context::CliContext;
use crate::output;
use serde::Serialize;
use serde_json::{json, Value};
use taskboard_domain::{move_column, Column, ColumnDisposition, ColumnId, HashNamespace};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ColumnSummary {
    #[serde(flatten)]
    column: Column,
    card_count: usize,
}

pub fn handle(ctx: &mut CliContext, action: ColumnAction) -> anyhow::Result<Value> {
    match action {
        ColumnAction::Add { title, after } => {
            let after = after.map(|r| ctx.resolve_column(&r)).transpose()?;
            let store = ctx.store.clone();
            let id = ctx.apply_with(|board| store.create_column(board, &title, after))?;
            column_output(ctx, id)
        }
        ColumnAction::Rename { column, title } => {
            let id = ctx.resolve_column(&column)?;
            let store = ctx.store.clone();
            ctx.apply(|board| store.rename_column(board, id, &title))?;
            column_output(ctx, id)
        }
        ColumnAction::Move { column, index } => {
            let id = ctx.resolve_column(&column)?;
            ctx.apply(|board| move_column(board, id, index))?;
            column_output(ctx, id)
        }
        ColumnAction::Delete(args) => handle_delete(ctx, args),
        ColumnAction::List => {
            let ids = ctx.board().column_order.clone();
            for id in &ids {
                ctx.ensure_hash(HashNamespace::Column, *id)?;
            }
            let board = ctx.board();
            let columns: Vec<ColumnSummary> = board
                .ordered_columns()
                .into_iter()
                .map(|column| ColumnSummary {
                    column: column.clone(),
                    card_count: board.card_count(column.id),
                })
                .collect();
            output::list(columns)
        }
    }
}

fn handle_delete(ctx: &mut CliContext, args: ColumnDeleteArgs) -> anyhow::Result<Value> {
    let id = ctx.resolve_column(&args.column)?;
    let disposition = match (args.move_cards_to, args.delete_cards) {
        (Some(target), _) => Some(ColumnDisposition::MoveCardsTo(ctx.resolve_column(&target)?)),
        (None, true) => Some(ColumnDisposition::DeleteCards),
        (None, false) => None,
    };

    let store = ctx.store.clone();
    ctx.apply(|board| store.delete_column(board, id, disposition))?;
    Ok(json!({ "deleted": id.to_string() }))
}

fn column_output(ctx: &mut CliContext, id: ColumnId) -> anyhow::Result<Value> {
    ctx.ensure_hash(HashNamespace::Column, id)?;
    let column = ctx.board().require_column(id)?;
    Ok(serde_json::to_value(column)?)
}
