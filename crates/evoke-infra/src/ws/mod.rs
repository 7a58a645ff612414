pub mod client;

pub use client::{WsConfig, WsConnectionManager};
