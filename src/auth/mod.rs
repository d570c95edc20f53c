use crate::state::AuthState;
use axum::Router;

pub mod claims;
mod dto;
pub mod extractors;
pub mod handlers;
pub mod jwt;
pub mod memory;
pub mod password;
pub mod repo;
mod repo_types;
pub mod services;

pub use dto::UserProfile;

pub fn router(state: AuthState) -> Router<AuthState> {
    handlers::auth_routes(state)
}
