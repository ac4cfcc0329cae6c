use axum::Router;

use crate::state::AppState;

mod dto;
pub mod handlers;
pub mod repo;
pub mod search;

pub fn router() -> Router<AppState> {
    handlers::forum_routes()
}
