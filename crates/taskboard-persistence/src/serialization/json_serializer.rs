use crate::traits::Serializer;
use taskboard_core::{TaskboardError, TaskboardResult};

/// Pretty-printed JSON serializer; dates go out as RFC 3339 strings and come
/// back as `DateTime<Utc>` values.
pub struct JsonSerializer;

impl<T: serde::Serialize + serde::de::DeserializeOwned + Send + Sync> Serializer<T>
    for JsonSerializer
{
    fn serialize(&self, data: &T) -> TaskboardResult<Vec<u8>> {
        serde_json::to_vec_pretty(data).map_err(|e| TaskboardError::Serialization(e.to_string()))
    }

    fn deserialize(&self, bytes: &[u8]) -> TaskboardResult<T> {
        serde_json::from_slice(bytes).map_err(|e| TaskboardError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskboard_domain::{Board, EntityStore};

    #[test]
    fn test_board_round_trip_keeps_dates_and_notes() {
        let store = EntityStore::default();
        let board = Board::with_columns("main", &["todo"]);
        let todo = board.column_order[0];
        let (board, card) = store.create_card(&board, todo, "Write docs", None).unwrap();
        let (board, _) = store.add_note(&board, card, "started").unwrap();

        let bytes = Serializer::<Board>::serialize(&JsonSerializer, &board).unwrap();
        let restored: Board = JsonSerializer.deserialize(&bytes).unwrap();

        assert_eq!(restored, board);
    }

    #[test]
    fn test_dates_are_iso_strings() {
        let board = Board::new("main");
        let bytes = JsonSerializer.serialize(&board).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        let created = value["metadata"]["createdAt"].as_str().unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(created).is_ok());
    }

    #[test]
    fn test_garbage_is_serialization_error() {
        let result: TaskboardResult<Board> = JsonSerializer.deserialize(b"{not json");
        assert!(matches!(result, Err(TaskboardError::Serialization(_))));
    }
}
