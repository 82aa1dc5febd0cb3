/// Failure of any keyed store, sessions and pending OAuth states alike.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store error: {0}")]
    Store(String),
}
