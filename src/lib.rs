//! User service and todo service sharing one token format.
//!
//! The user service registers accounts and signs tokens; the todo service
//! verifies those tokens offline and scopes every todo operation to the
//! token's user uuid.

pub mod app;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod rate_limit;
pub mod state;
pub mod todos;
