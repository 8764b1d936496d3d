//! 聚餐日程接口

mod handler;

use axum::{
    Router,
    routing::{delete, get, post},
};

use crate::core::state::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/schedules", get(handler::list).post(handler::create))
        .route("/schedules/{id}", get(handler::get_one))
        .route("/schedules/{id}/join", post(handler::join))
        .route("/schedules/{id}/leave", delete(handler::leave))
}
