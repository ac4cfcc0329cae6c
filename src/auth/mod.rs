use axum::Router;

use crate::state::AppState;

mod dto;
pub mod gate;
pub mod handlers;
pub mod password;
pub mod token;

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
