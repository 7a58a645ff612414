//! SessionStore trait definition.
//!
//! Port for durable persistence of the session registry. Implementations
//! live in `evoke-infra` (e.g., `JsonFileSessionStore`) and in test fakes.
//! Uses native async fn in traits (RPITIT, Rust 2024 edition).

use evoke_types::error::StoreError;
use evoke_types::session::{Session, SessionRegistry};
use uuid::Uuid;

/// Durable mapping of session identifiers to ordered message logs.
///
/// Contract:
/// - `load` on empty storage returns an empty registry, not an error.
/// - `save` is all-or-nothing: a concurrent reader never observes a partial
///   write. Saving the same registry twice yields the same persisted state.
/// - `get` returns `None` for an unknown id.
pub trait SessionStore: Send + Sync {
    /// Load the full registry.
    fn load(
        &self,
    ) -> impl std::future::Future<Output = Result<SessionRegistry, StoreError>> + Send;

    /// Persist the full registry atomically.
    fn save(
        &self,
        registry: &SessionRegistry,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Look up a single session by id.
    fn get(
        &self,
        id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<Session>, StoreError>> + Send;
}
