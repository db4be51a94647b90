use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use std::sync::Arc;
use taskboard_persistence::BoardRepository;

use crate::error::ApiError;
use crate::service::BoardService;
use crate::views::{
    BoardView, CardDetailView, CardView, ColumnView, CreateCardRequest, CreateColumnRequest,
    UpdateCardRequest,
};

pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";

type ServiceState<R> = State<Arc<BoardService<R>>>;

/// Build the REST router over a board service.
pub fn router<R>(service: Arc<BoardService<R>>) -> Router
where
    R: BoardRepository + ?Sized + 'static,
{
    Router::new()
        .route("/boards/:id", get(get_board::<R>))
        .route("/boards/:id/cards", post(create_card::<R>))
        .route(
            "/boards/:id/cards/:card_hash",
            get(get_card::<R>)
                .put(update_card::<R>)
                .delete(delete_card::<R>),
        )
        .route("/boards/:id/columns", post(create_column::<R>))
        .route("/boards/:id/columns/:column_hash", delete(delete_column::<R>))
        .with_state(service)
}

fn idempotency_key(headers: &HeaderMap) -> Option<String> {
    headers
        .get(IDEMPOTENCY_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(str::to_string)
}

async fn get_board<R: BoardRepository + ?Sized + 'static>(
    State(service): ServiceState<R>,
    Path(board_id): Path<String>,
) -> Result<Json<BoardView>, ApiError> {
    Ok(Json(service.board_view(&board_id).await?))
}

async fn create_card<R: BoardRepository + ?Sized + 'static>(
    State(service): ServiceState<R>,
    Path(board_id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<CreateCardRequest>,
) -> Result<(StatusCode, Json<CardView>), ApiError> {
    let view = service
        .create_card(&board_id, request, idempotency_key(&headers))
        .await?;
    Ok((StatusCode::CREATED, Json(view)))
}

async fn get_card<R: BoardRepository + ?Sized + 'static>(
    State(service): ServiceState<R>,
    Path((board_id, card_hash)): Path<(String, String)>,
) -> Result<Json<CardDetailView>, ApiError> {
    Ok(Json(service.card_detail(&board_id, &card_hash).await?))
}

async fn update_card<R: BoardRepository + ?Sized + 'static>(
    State(service): ServiceState<R>,
    Path((board_id, card_hash)): Path<(String, String)>,
    Json(request): Json<UpdateCardRequest>,
) -> Result<Json<CardView>, ApiError> {
    Ok(Json(
        service.update_card(&board_id, &card_hash, request).await?,
    ))
}

async fn delete_card<R: BoardRepository + ?Sized + 'static>(
    State(service): ServiceState<R>,
    Path((board_id, card_hash)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    service.delete_card(&board_id, &card_hash).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn create_column<R: BoardRepository + ?Sized + 'static>(
    State(service): ServiceState<R>,
    Path(board_id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<CreateColumnRequest>,
) -> Result<(StatusCode, Json<ColumnView>), ApiError> {
    let view = service
        .create_column(&board_id, request, idempotency_key(&headers))
        .await?;
    Ok((StatusCode::CREATED, Json(view)))
}

async fn delete_column<R: BoardRepository + ?Sized + 'static>(
    State(service): ServiceState<R>,
    Path((board_id, column_hash)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    service.delete_column(&board_id, &column_hash).await?;
    Ok(StatusCode::NO_CONTENT)
}
