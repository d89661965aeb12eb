/// Failures surfaced by the catalog client, the local store and the repository.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
  #[error("Malformed request: {0}")]
  MalformedRequest(String),

  #[error("Unexpected HTTP status {0}")]
  UnexpectedStatus(u16),

  #[error("Empty response body")]
  EmptyResponse,

  #[error("Failed to decode response: {0}")]
  DecodeFailure(String),

  /// The request never produced an HTTP status (connection, TLS, timeout)
  #[error("Transport error: {0}")]
  Transport(String),

  #[error("Store failure: {0}")]
  StoreFailure(String),

  #[error("{entity} {id} not found")]
  NotFound { entity: &'static str, id: i64 },
}

impl From<rusqlite::Error> for CatalogError {
  fn from(e: rusqlite::Error) -> Self {
    CatalogError::StoreFailure(e.to_string())
  }
}

pub type CatalogResult<T> = std::result::Result<T, CatalogError>;
