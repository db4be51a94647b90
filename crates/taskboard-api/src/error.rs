use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use taskboard_core::TaskboardError;

/// HTTP-facing wrapper around [`TaskboardError`].
///
/// Lookups of a hash taken from the request path map to 404; every other
/// rejected mutation is a 400; storage and hash exhaustion are 500s.
#[derive(Debug)]
pub struct ApiError(pub TaskboardError);

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    card_count: Option<usize>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            TaskboardError::CardNotFound(_)
            | TaskboardError::ColumnNotFound(_)
            | TaskboardError::NoteNotFound(_) => StatusCode::NOT_FOUND,
            TaskboardError::InvalidInput(_)
            | TaskboardError::ColumnNotEmpty { .. }
            | TaskboardError::CannotDeleteLastColumn => StatusCode::BAD_REQUEST,
            TaskboardError::HashCollision { .. }
            | TaskboardError::StorageFailure(_)
            | TaskboardError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<TaskboardError> for ApiError {
    fn from(err: TaskboardError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self.0);
        } else {
            tracing::debug!("Request rejected: {}", self.0);
        }

        let card_count = match &self.0 {
            TaskboardError::ColumnNotEmpty { card_count, .. } => Some(*card_count),
            _ => None,
        };
        let body = ErrorBody {
            error: self.0.to_string(),
            card_count,
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (TaskboardError::CardNotFound("card-aaaa".into()), StatusCode::NOT_FOUND),
            (TaskboardError::InvalidInput("empty".into()), StatusCode::BAD_REQUEST),
            (TaskboardError::CannotDeleteLastColumn, StatusCode::BAD_REQUEST),
            (
                TaskboardError::HashCollision {
                    namespace: "card".into(),
                    attempts: 16,
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                std::io::Error::other("quota exceeded").into(),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError(err).status(), expected);
        }
    }
}
