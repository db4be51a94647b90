use crate::traits::BoardRepository;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use taskboard_core::TaskboardResult;
use taskboard_domain::Board;

/// In-process repository, used by tests and by `serve --ephemeral`.
#[derive(Debug)]
pub struct MemoryStore {
    boards: Mutex<HashMap<String, Board>>,
    default_columns: Vec<String>,
    fail_writes: AtomicBool,
    saves: AtomicUsize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(taskboard_core::AppConfig::default().default_columns)
    }
}

impl MemoryStore {
    pub fn new(default_columns: Vec<String>) -> Self {
        Self {
            boards: Mutex::new(HashMap::new()),
            default_columns,
            fail_writes: AtomicBool::new(false),
            saves: AtomicUsize::new(0),
        }
    }

    /// Make every subsequent save fail as if the medium were full.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn stored(&self, board_id: &str) -> Option<Board> {
        self.boards.lock().get(board_id).cloned()
    }
}

#[async_trait::async_trait]
impl BoardRepository for MemoryStore {
    async fn load_board(&self, board_id: &str) -> TaskboardResult<Board> {
        Board::validate_id(board_id)?;
        let boards = self.boards.lock();
        Ok(boards
            .get(board_id)
            .cloned()
            .unwrap_or_else(|| Board::with_columns(board_id, &self.default_columns)))
    }

    async fn save_board(&self, board: &Board) -> TaskboardResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(std::io::Error::other("quota exceeded").into());
        }
        self.boards.lock().insert(board.id.clone(), board.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
