use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use uuid::Uuid;

const LONG_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("TASKBOARD_BUILD_COMMIT"), ")");

#[derive(Parser)]
#[command(name = "taskboard")]
#[command(about = "A task board driven from the command line or over REST", long_about = None)]
#[command(version, long_version = LONG_VERSION)]
pub struct Cli {
    /// Directory holding board files (or set TASKBOARD_DATA_DIR)
    #[arg(long, global = true, value_name = "DIR", env = "TASKBOARD_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Board to operate on
    #[arg(long, global = true, default_value = "main", env = "TASKBOARD_BOARD")]
    pub board: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Board operations
    Board(BoardCommand),
    /// Column operations
    Column(ColumnCommand),
    /// Card operations
    Card(CardCommand),
    /// Serve the REST API over the data directory
    Serve(ServeArgs),
}

// Board commands
#[derive(Args)]
pub struct BoardCommand {
    #[command(subcommand)]
    pub action: BoardAction,
}

#[derive(Subcommand)]
pub enum BoardAction {
    /// Show the board with columns and cards in display order
    Show,
    /// Check the board's structural invariants
    Check,
}

// Column commands
#[derive(Args)]
pub struct ColumnCommand {
    #[command(subcommand)]
    pub action: ColumnAction,
}

/// Columns are referenced by hash (`col-xxxx`) or by name.
#[derive(Subcommand)]
pub enum ColumnAction {
    /// Add a column at the end, or after another column
    Add {
        #[arg(long)]
        title: String,
        #[arg(long)]
        after: Option<String>,
    },
    /// Rename a column
    Rename {
        column: String,
        #[arg(long)]
        title: String,
    },
    /// Move a column to a zero-based index
    Move {
        column: String,
        #[arg(long)]
        index: usize,
    },
    /// Delete a column; non-empty columns need a disposition
    Delete(ColumnDeleteArgs),
    /// List columns in display order
    List,
}

#[derive(Args)]
pub struct ColumnDeleteArgs {
    pub column: String,
    /// Move the column's cards to the end of this column
    #[arg(long, conflicts_with = "delete_cards")]
    pub move_cards_to: Option<String>,
    /// Delete the column's cards along with it
    #[arg(long)]
    pub delete_cards: bool,
}

// Card commands
#[derive(Args)]
pub struct CardCommand {
    #[command(subcommand)]
    pub action: CardAction,
}

/// Cards are referenced by hash (`card-xxxx`) or by id.
#[derive(Subcommand)]
pub enum CardAction {
    /// Add a card to the end of a column
    Add(CardAddArgs),
    /// Update a card's title, description, or tags
    Update(CardUpdateArgs),
    /// Move a card to a column, at an index or at the end
    Move {
        card: String,
        #[arg(long)]
        column: String,
        #[arg(long)]
        index: Option<usize>,
    },
    /// Delete a card and its notes
    Delete { card: String },
    /// Manage a card's notes
    Note(NoteCommand),
    /// Change a card's lifecycle status
    Lifecycle {
        card: String,
        #[command(subcommand)]
        event: LifecycleAction,
    },
    /// List cards, optionally in a single column
    List {
        #[arg(long)]
        column: Option<String>,
    },
}

#[derive(Args)]
pub struct CardAddArgs {
    #[arg(long)]
    pub column: String,
    #[arg(long)]
    pub title: String,
    #[arg(long)]
    pub description: Option<String>,
    /// Retrying with the same key returns the first card instead of a new one
    #[arg(long)]
    pub idempotency_key: Option<String>,
}

#[derive(Args)]
pub struct CardUpdateArgs {
    pub card: String,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long, conflicts_with = "clear_description")]
    pub description: Option<String>,
    #[arg(long)]
    pub clear_description: bool,
    #[arg(long, value_delimiter = ',')]
    pub tags: Option<Vec<String>>,
}

#[derive(Args)]
pub struct NoteCommand {
    #[command(subcommand)]
    pub action: NoteAction,
}

#[derive(Subcommand)]
pub enum NoteAction {
    /// Append a note to a card
    Add {
        card: String,
        #[arg(long)]
        text: String,
    },
    /// Delete a note from a card
    Delete {
        card: String,
        #[arg(long)]
        note_id: Uuid,
    },
}

#[derive(Subcommand)]
pub enum LifecycleAction {
    Claim {
        #[arg(long)]
        by: String,
    },
    Start,
    Progress {
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
        percent: u8,
    },
    Complete,
    Release,
    Reopen,
}

#[derive(Args)]
pub struct ServeArgs {
    #[arg(long, default_value = "127.0.0.1:7878")]
    pub addr: SocketAddr,
    /// Keep boards in memory instead of the data directory
    #[arg(long)]
    pub ephemeral: bool,
}
