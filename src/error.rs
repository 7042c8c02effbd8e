use thiserror::Error;

/// Failures surfaced by a [`CatalogueStore`](crate::catalogue::store::CatalogueStore).
///
/// Most callers bubble these up through `anyhow`, but the merge path needs to
/// distinguish "the prior index does not exist yet" from a real failure, so
/// store operations keep a typed error.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("object not found: {0}")]
    NotFound(String),
    #[error("storage request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("storage io: {0}")]
    Io(#[from] std::io::Error),
    #[error("unexpected storage response: {0}")]
    Response(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
