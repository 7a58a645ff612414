//! Infrastructure adapters for Evoke.
//!
//! Implements the ports defined in `evoke-core`: the JSON-file session
//! store, the reconnecting WebSocket connection manager, and the HTTP
//! reminder client, plus data-directory and `config.toml` resolution.

pub mod config;
pub mod reminder;
pub mod store;
pub mod ws;
