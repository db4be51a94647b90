use crate::cli::ServeArgs;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use taskboard_api::BoardService;
use taskboard_core::AppConfig;
use taskboard_persistence::{JsonFileStore, MemoryStore};

/// Run the REST API until the listener fails.
pub async fn handle(config: &AppConfig, data_dir: PathBuf, args: ServeArgs) -> anyhow::Result<Value> {
    if args.ephemeral {
        let repo = Arc::new(MemoryStore::new(config.default_columns.clone()));
        tracing::info!("Serving in-memory boards");
        taskboard_api::serve(args.addr, Arc::new(BoardService::from_config(repo, config))).await?;
    } else {
        let repo = Arc::new(
            JsonFileStore::new(&data_dir).with_default_columns(config.default_columns.clone()),
        );
        tracing::info!("Serving boards from {}", data_dir.display());
        taskboard_api::serve(args.addr, Arc::new(BoardService::from_config(repo, config))).await?;
    }
    Ok(Value::Null)
}
