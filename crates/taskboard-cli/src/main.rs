mod cli;
mod context;
mod handlers;
mod output;

use clap::Parser;
use cli::{Cli, Commands};
use context::CliContext;
use taskboard_core::AppConfig;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;

    let cli = Cli::parse();
    let config = AppConfig::load();

    match run(cli, config).await {
        Ok(data) => output::output_success(data),
        Err(e) => output::output_error(&e.to_string()),
    }
}

fn init_tracing() -> anyhow::Result<()> {
    if let Ok(log_path) = std::env::var("TASKBOARD_DEBUG_LOG") {
        let log_file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        tracing_subscriber::fmt()
            .with_writer(log_file)
            .with_max_level(tracing::Level::DEBUG)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false)
            .init();
    } else {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
    Ok(())
}

async fn run(cli: Cli, config: AppConfig) -> anyhow::Result<serde_json::Value> {
    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| config.effective_data_dir());

    let command = match cli.command {
        Commands::Serve(args) => return handlers::serve::handle(&config, data_dir, args).await,
        command => command,
    };

    let mut ctx = CliContext::load(&config, data_dir, &cli.board).await?;
    let result = match command {
        Commands::Board(board_cmd) => handlers::board::handle(&mut ctx, board_cmd.action),
        Commands::Column(column_cmd) => handlers::column::handle(&mut ctx, column_cmd.action),
        Commands::Card(card_cmd) => handlers::card::handle(&mut ctx, card_cmd.action),
        Commands::Serve(_) => Err(anyhow::anyhow!("serve does not operate on a single board")),
    };
    // Flush before reporting so a failed save is never reported as success
    ctx.finish().await?;
    result
}
