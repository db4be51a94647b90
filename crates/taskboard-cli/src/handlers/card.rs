use crate::cli::{CardAction, CardAddArgs, CardUpdateArgs, LifecycleAction, NoteAction};
use crate::context::CliContext;
use crate::output;
use rand::Rng;
use serde_json::{json, Value};
use taskboard_core::TaskboardResult;
use taskboard_domain::{
    find_idempotent, move_card, move_card_to_end, record_idempotency_key, resolve, Board, Card,
    CardId, CardPatch, ColumnId, EntityStore, ExternalIdentityRegistry, FieldUpdate,
    HashNamespace, LifecycleEvent,
};

pub fn handle(ctx: &mut CliContext, action: CardAction) -> anyhow::Result<Value> {
    match action {
        CardAction::Add(args) => handle_add(ctx, args),
        CardAction::Update(args) => handle_update(ctx, args),
        CardAction::Move {
            card,
            column,
            index,
        } => {
            let id = ctx.resolve_card(&card)?;
            let column_id = ctx.resolve_column(&column)?;
            match index {
                Some(index) => ctx.apply(|board| move_card(board, id, column_id, index))?,
                None => ctx.apply(|board| move_card_to_end(board, id, column_id))?,
            }
            card_output(ctx, id)
        }
        CardAction::Delete { card } => {
            let id = ctx.resolve_card(&card)?;
            let store = ctx.store.clone();
            ctx.apply(|board| store.delete_card(board, id))?;
            Ok(json!({ "deleted": id.to_string() }))
        }
        CardAction::Note(note_cmd) => match note_cmd.action {
            NoteAction::Add { card, text } => {
                let id = ctx.resolve_card(&card)?;
                let store = ctx.store.clone();
                let note_id = ctx.apply_with(|board| store.add_note(board, id, &text))?;
                let note = ctx
                    .board()
                    .require_card(id)?
                    .notes
                    .iter()
                    .find(|n| n.id == note_id)
                    .cloned();
                Ok(serde_json::to_value(note)?)
            }
            NoteAction::Delete { card, note_id } => {
                let id = ctx.resolve_card(&card)?;
                let store = ctx.store.clone();
                ctx.apply(|board| store.delete_note(board, id, note_id))?;
                Ok(json!({ "deleted": note_id.to_string() }))
            }
        },
        CardAction::Lifecycle { card, event } => {
            let id = ctx.resolve_card(&card)?;
            let event = match event {
                LifecycleAction::Claim { by } => LifecycleEvent::Claim { by },
                LifecycleAction::Start => LifecycleEvent::Start,
                LifecycleAction::Progress { percent } => LifecycleEvent::Progress(percent),
                LifecycleAction::Complete => LifecycleEvent::Complete,
                LifecycleAction::Release => LifecycleEvent::Release,
                LifecycleAction::Reopen => LifecycleEvent::Reopen,
            };
            let store = ctx.store.clone();
            ctx.apply(|board| store.transition_card(board, id, event))?;
            card_output(ctx, id)
        }
        CardAction::List { column } => {
            let column_id = column.map(|c| ctx.resolve_column(&c)).transpose()?;
            ctx.ensure_all_hashes()?;
            let board = ctx.board();
            let cards: Vec<Card> = board
                .ordered_columns()
                .into_iter()
                .filter(|c| column_id.map_or(true, |id| id == c.id))
                .flat_map(|c| board.cards_in_column(c.id))
                .cloned()
                .collect();
            output::list(cards)
        }
    }
}

fn handle_add(ctx: &mut CliContext, args: CardAddArgs) -> anyhow::Result<Value> {
    let column_id = ctx.resolve_column(&args.column)?;

    if let Some(key) = args.idempotency_key.as_deref() {
        if let Some(hash) = find_idempotent(ctx.board(), HashNamespace::Card, key) {
            tracing::debug!("Card for idempotency key {} already exists", key);
            let id = resolve(ctx.board(), HashNamespace::Card, hash)?;
            return card_output(ctx, id);
        }
    }

    let store = ctx.store.clone();
    let registry = ctx.registry.clone();
    let id = ctx.apply_with(|board| {
        create_card(
            &store,
            &registry,
            board,
            column_id,
            &args,
            &mut rand::rng(),
        )
    })?;
    card_output(ctx, id)
}

/// Create the card, give it a hash and record the idempotency key as one
/// mutation, so a failure at any step leaves the board untouched.
fn create_card<G: Rng>(
    store: &EntityStore,
    registry: &ExternalIdentityRegistry,
    board: &Board,
    column_id: ColumnId,
    args: &CardAddArgs,
    rng: &mut G,
) -> TaskboardResult<(Board, CardId)> {
    let (next, id) =
        store.create_card(board, column_id, &args.title, args.description.as_deref())?;
    let (next, hash) = registry.ensure_hash(&next, HashNamespace::Card, id, rng)?;
    let next = match args.idempotency_key.as_deref() {
        Some(key) => record_idempotency_key(&next, HashNamespace::Card, key, &hash),
        None => next,
    };
    Ok((next, id))
}

fn handle_update(ctx: &mut CliContext, args: CardUpdateArgs) -> anyhow::Result<Value> {
    let id = ctx.resolve_card(&args.card)?;
    let description = match (args.description, args.clear_description) {
        (Some(text), _) => FieldUpdate::Set(text),
        (None, true) => FieldUpdate::Clear,
        (None, false) => FieldUpdate::NoChange,
    };
    let patch = CardPatch {
        title: args.title,
        description,
        tags: args.tags,
    };
    if patch.is_empty() {
        anyhow::bail!("Nothing to update: pass --title, --description, --clear-description, or --tags");
    }

    let store = ctx.store.clone();
    ctx.apply(|board| store.update_card(board, id, patch))?;
    card_output(ctx, id)
}

fn card_output(ctx: &mut CliContext, id: CardId) -> anyhow::Result<Value> {
    ctx.ensure_hash(HashNamespace::Card, id)?;
    let card = ctx.board().require_card(id)?;
    Ok(serde_json::to_value(card)?)
}
