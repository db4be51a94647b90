use crate::traits::BoardRepository;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use taskboard_core::TaskboardResult;
use taskboard_domain::Board;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Holds the current snapshot of one board and queues it for saving after
/// every successful mutation.
///
/// Mutations are pure functions over the snapshot; a failed mutation leaves
/// the session untouched and queues nothing.
pub struct BoardSession {
    board: Board,
    dirty: bool,
    save_tx: Option<mpsc::UnboundedSender<Board>>,
}

impl BoardSession {
    /// Session without persistence.
    pub fn new(board: Board) -> Self {
        Self {
            board,
            dirty: false,
            save_tx: None,
        }
    }

    pub fn with_save_channel(board: Board, save_tx: mpsc::UnboundedSender<Board>) -> Self {
        Self {
            board,
            dirty: false,
            save_tx: Some(save_tx),
        }
    }

    /// Load a board from `repo` and start a debounced save worker for it.
    pub async fn open<R>(
        repo: Arc<R>,
        board_id: &str,
        debounce: Duration,
    ) -> TaskboardResult<(Self, JoinHandle<SaveReport>)>
    where
        R: BoardRepository + ?Sized + 'static,
    {
        let board = repo.load_board(board_id).await?;
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = spawn_save_worker(repo, rx, debounce);
        Ok((Self::with_save_channel(board, tx), worker))
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Run a mutation that only yields a new board.
    pub fn apply<F>(&mut self, f: F) -> TaskboardResult<()>
    where
        F: FnOnce(&Board) -> TaskboardResult<Board>,
    {
        let next = f(&self.board)?;
        self.replace(next);
        Ok(())
    }

    /// Run a mutation that yields a new board plus a value, such as a new id.
    pub fn apply_with<T, F>(&mut self, f: F) -> TaskboardResult<T>
    where
        F: FnOnce(&Board) -> TaskboardResult<(Board, T)>,
    {
        let (next, value) = f(&self.board)?;
        self.replace(next);
        Ok(value)
    }

    fn replace(&mut self, next: Board) {
        if next == self.board {
            tracing::debug!("Mutation left board '{}' unchanged", self.board.id);
            return;
        }
        self.board = next;
        self.dirty = true;
        self.queue_snapshot();
    }

    fn queue_snapshot(&self) {
        if let Some(ref tx) = self.save_tx {
            tracing::debug!("Queueing board '{}' for async save", self.board.id);
            if let Err(e) = tx.send(self.board.clone()) {
                tracing::error!("Failed to queue save: channel closed: {:?}", e);
            }
        } else {
            tracing::debug!("No save channel available - skipping save");
        }
    }

    /// Drop the sender so the worker flushes pending saves and exits.
    pub fn close_save_channel(&mut self) {
        self.save_tx = None;
        self.dirty = false;
    }

    pub fn has_save_channel(&self) -> bool {
        self.save_tx.is_some()
    }
}

/// Outcome of a save worker's lifetime.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SaveReport {
    pub saved: usize,
    pub failures: Vec<String>,
}

/// Spawn a task that writes queued snapshots through `repo`.
///
/// Snapshots arriving within `debounce` of each other are coalesced so only
/// the latest snapshot per board is written. Closing the channel flushes
/// whatever is pending before the task returns its report. Failures are
/// logged and collected; they never stop the worker.
pub fn spawn_save_worker<R>(
    repo: Arc<R>,
    mut rx: mpsc::UnboundedReceiver<Board>,
    debounce: Duration,
) -> JoinHandle<SaveReport>
where
    R: BoardRepository + ?Sized + 'static,
{
    tokio::spawn(async move {
        let mut report = SaveReport::default();

        while let Some(first) = rx.recv().await {
            let mut pending: HashMap<String, Board> = HashMap::new();
            pending.insert(first.id.clone(), first);

            loop {
                tokio::select! {
                    next = rx.recv() => match next {
                        Some(board) => {
                            pending.insert(board.id.clone(), board);
                        }
                        None => break,
                    },
                    _ = tokio::time::sleep(debounce) => break,
                }
            }

            for (board_id, board) in pending {
                match repo.save_board(&board).await {
                    Ok(()) => report.saved += 1,
                    Err(e) => {
                        tracing::error!("Failed to save board '{}': {}", board_id, e);
                        report.failures.push(format!("{}: {}", board_id, e));
                    }
                }
            }
        }

        tracing::debug!(
            "Save worker finished: {} saved, {} failed",
            report.saved,
            report.failures.len()
        );
        report
    })
}
