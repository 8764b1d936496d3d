//! HTTP 服务装配与启动

use axum::http::HeaderValue;
use axum::{Router, middleware};
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::api;
use crate::core::config::Config;
use crate::core::state::ServerState;
use crate::utils::{AppError, AppResult};

pub struct Server {
    state: ServerState,
}

impl Server {
    pub fn with_state(state: ServerState) -> Self {
        Self { state }
    }

    /// 绑定端口并一直跑到收到 ctrl-c
    pub async fn run(self) -> AppResult<()> {
        let addr = self.state.config.http_addr();
        let app = build_app(self.state);

        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| AppError::internal(format!("failed to bind {addr}: {e}")))?;
        info!("listening on http://{addr}");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| AppError::internal(e.to_string()))?;
        Ok(())
    }
}

/// 组装整棵路由树，集成测试直接拿它发请求
pub fn build_app(state: ServerState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .merge(api::health::router())
        .merge(api::auth::router())
        .merge(api::members::router())
        .merge(api::restaurants::router())
        .merge(api::planned::router())
        .merge(api::schedules::router())
        .merge(api::uploads::router())
        .with_state(state)
        .layer(cors)
        .layer(CompressionLayer::new())
        .layer(middleware::from_fn(api::log_request))
}

fn cors_layer(config: &Config) -> CorsLayer {
    match config.cors_origin.parse::<HeaderValue>() {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods(Any)
            .allow_headers(Any),
        Err(_) => {
            warn!(
                "invalid CORS_ORIGIN '{}', allowing any origin",
                config.cors_origin
            );
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {e}");
    }
    info!("shutdown signal received");
}
