use crate::domain_model::{OAuthState, PendingAuthorization};
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

#[derive(Default)]
pub struct MemoryOAuthStateStore {
    pending: DashMap<OAuthState, PendingAuthorization>,
}

impl MemoryOAuthStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    // Abandoned redirects never reach `take`; drop them on the next insert.
    fn purge_expired(&self, now: DateTime<Utc>) {
        self.pending.retain(|_, pending| !pending.is_expired(now));
    }
}

#[async_trait::async_trait]
impl OAuthStateStore for MemoryOAuthStateStore {
    async fn save(
        &self,
        state: &OAuthState,
        pending: PendingAuthorization,
    ) -> Result<(), StoreError> {
        self.purge_expired(Utc::now());
        self.pending.insert(state.clone(), pending);
        Ok(())
    }

    async fn take(
        &self,
        state: &OAuthState,
        now: DateTime<Utc>,
    ) -> Result<Option<PendingAuthorization>, StoreError> {
        let pending = self
            .pending
            .remove(state)
            .map(|(_, pending)| pending)
            .filter(|pending| !pending.is_expired(now));
        Ok(pending)
    }
}
