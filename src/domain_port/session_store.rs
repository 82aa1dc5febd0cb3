use super::StoreError;
use crate::domain_model::{Session, SessionId};

/// Keyed credential storage. The in-memory map can be swapped for a
/// persistent backend without touching callers.
#[async_trait::async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, id: &SessionId) -> Result<Option<Session>, StoreError>;
    async fn set(&self, session: Session) -> Result<(), StoreError>;
    /// Returns whether an entry was removed.
    async fn delete(&self, id: &SessionId) -> Result<bool, StoreError>;
}
