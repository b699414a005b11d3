// Public API for the binary and integration tests

pub mod api;
pub mod client;
pub mod config;
pub mod poll;
pub mod protocol;
pub mod session;
pub mod state;
pub mod terminal;
pub mod types;
pub mod validate;
