use std::path::Path;

use anyhow::Result;
use ramen_road::core::{Config, Server, ServerState};
use ramen_road::utils::logger;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

    // LOG_DIR 指定后额外写按天滚动的文件日志，guard 要活到进程结束
    let _guard = match std::env::var("LOG_DIR") {
        Ok(dir) => {
            std::fs::create_dir_all(&dir)?;
            Some(logger::init_logger_with_file(&log_level, Path::new(&dir)))
        }
        Err(_) => {
            logger::init_logger(&log_level);
            None
        }
    };

    ramen_road::print_banner();

    let config = Config::from_env()?;
    info!(
        "🍜 ramen-road starting in {} mode on port {}",
        config.environment, config.http_port
    );

    let state = ServerState::initialize(&config).await?;
    Server::with_state(state).run().await?;

    info!("ramen-road stopped");
    Ok(())
}
