//! 日志初始化
//!
//! 支持控制台输出和按天滚动的文件输出。
//! 日志级别优先读取 `RUST_LOG` 环境变量，否则使用传入的默认级别。

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// 初始化控制台日志
pub fn init_logger(log_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(false)
        .init();
}

/// 初始化控制台 + 滚动文件日志
///
/// 返回的 [`WorkerGuard`] 必须在程序存活期间持有，否则文件日志会丢失。
pub fn init_logger_with_file(log_level: &str, log_dir: &Path) -> WorkerGuard {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    let file_appender = tracing_appender::rolling::daily(log_dir, "ramen-road");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(false)
        .init();

    guard
}
