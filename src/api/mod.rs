//! HTTP 接口层
//!
//! 每个资源一个子模块，`mod.rs` 放路由，`handler.rs` 放处理逻辑
//! 和请求体结构。

pub mod auth;
pub mod forms;
pub mod health;
pub mod members;
pub mod planned;
pub mod restaurants;
pub mod schedules;
pub mod uploads;

use axum::{extract::Request, middleware::Next, response::Response};

/// 访问日志
pub async fn log_request(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let start = std::time::Instant::now();

    let response = next.run(req).await;

    tracing::info!(
        target: "http_access",
        %method,
        %uri,
        status = response.status().as_u16(),
        latency_ms = start.elapsed().as_millis() as u64,
    );
    response
}
