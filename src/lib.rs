//! ラーメンロード
//!
//! 拉面小队的访问账本：记录大家一起吃过的店、每个人的评分、
//! 想去的店和约饭日程。

pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod ratings;
pub mod services;
pub mod utils;

pub use crate::core::{Config, Server, ServerState, build_app};
pub use crate::utils::{AppError, AppResult};

/// 启动横幅
pub fn print_banner() {
    println!(
        r#"
   ____                               ____                 _
  |  _ \ __ _ _ __ ___   ___ _ __   |  _ \ ___   __ _  __| |
  | |_) / _` | '_ ` _ \ / _ \ '_ \  | |_) / _ \ / _` |/ _` |
  |  _ < (_| | | | | | |  __/ | | | |  _ < (_) | (_| | (_| |
  |_| \_\__,_|_| |_| |_|\___|_| |_| |_| \_\___/ \__,_|\__,_|
                                          🍜 ramen-road v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
