//! 注册 / 登录 / 当前用户

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::state::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/auth/register", post(handler::register))
        .route("/auth/login", post(handler::login))
        .route("/auth/me", get(handler::me))
}
