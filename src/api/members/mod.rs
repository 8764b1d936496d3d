//! 成员接口

mod handler;

use axum::{Router, routing::get};

use crate::core::state::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/members", get(handler::list))
        .route(
            "/members/{id}",
            get(handler::get_one)
                .patch(handler::update)
                .delete(handler::remove),
        )
}
