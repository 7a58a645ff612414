//! Engine logic and port definitions for Evoke.
//!
//! This crate defines the "ports" (the `SessionStore`, `Transport`, and
//! `ReminderClient` traits) that the infrastructure layer implements, plus
//! the stateful pieces of the engine itself: the session controller, the
//! outbound message queue, the notification poller, and the event bus.
//! It depends only on `evoke-types` -- never on `evoke-infra` or any IO
//! crate.

pub mod event;
pub mod reminder;
pub mod session;
pub mod transport;
