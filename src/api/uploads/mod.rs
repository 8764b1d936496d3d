//! 图片上传与访问

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::state::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/uploads", post(handler::upload))
        .route("/uploads/{filename}", get(handler::serve))
}
