//! Shared domain types for Evoke.
//!
//! This crate contains the core domain types used across the Evoke engine:
//! messages, sessions, the session registry, wire envelopes, connection
//! state, engine events, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod config;
pub mod connection;
pub mod envelope;
pub mod error;
pub mod event;
pub mod message;
pub mod session;
