//! 计划清单接口

mod handler;

use axum::{Router, routing::get};

use crate::core::state::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/planned-ramen", get(handler::list).post(handler::create))
        .route(
            "/planned-ramen/{id}",
            get(handler::get_one).delete(handler::remove),
        )
}
