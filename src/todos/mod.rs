mod dto;
pub mod handlers;
pub mod memory;
pub mod repo;
pub mod services;

use crate::state::TodoState;
use axum::Router;

pub fn router() -> Router<TodoState> {
    handlers::todo_routes()
}
