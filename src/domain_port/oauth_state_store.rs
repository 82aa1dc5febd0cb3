use super::StoreError;
use crate::domain_model::{OAuthState, PendingAuthorization};
use chrono::{DateTime, Utc};

#[async_trait::async_trait]
pub trait OAuthStateStore: Send + Sync {
    async fn save(
        &self,
        state: &OAuthState,
        pending: PendingAuthorization,
    ) -> Result<(), StoreError>;

    /// Remove the entry and return it only if it had not expired at `now`.
    /// A state can be taken at most once.
    async fn take(
        &self,
        state: &OAuthState,
        now: DateTime<Utc>,
    ) -> Result<Option<PendingAuthorization>, StoreError>;
}
