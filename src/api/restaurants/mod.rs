//! 访问记录接口

mod handler;

use axum::{
    Router,
    routing::{get, patch},
};

use crate::core::state::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route(
            "/visited-ramen",
            get(handler::list).post(handler::record_visit),
        )
        .route(
            "/visited-ramen/{id}",
            get(handler::get_one)
                .patch(handler::update_metadata)
                .delete(handler::remove),
        )
        .route(
            "/visited-ramen/{restaurant_id}/visits/{visit_count}/members/{member_name}/rating",
            patch(handler::rate),
        )
}
