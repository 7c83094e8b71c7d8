//! Error types for `crumb-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown consent category: {0:?}")]
  UnknownCategory(String),

  #[error("expected a JSON object for {0}")]
  NotAnObject(&'static str),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
