//! Error types for `crumb-consent`.

use crumb_core::consent::ConsentCategory;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// A profile write was attempted without the consent it requires.
  #[error("permission denied: {category} consent is required to store profile data")]
  PermissionDenied { category: ConsentCategory },

  #[error("could not decode stored data: {0}")]
  Decode(#[from] DecodeError),

  /// The cookie did not read back after being written: cookies are
  /// disabled or blocked, or the value was too large.
  #[error("cookie storage unavailable: could not write {name:?}")]
  StorageUnavailable { name: String },

  #[error("core error: {0}")]
  Core(#[from] crumb_core::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Why an obfuscated token could not be turned back into a value.
#[derive(Debug, Error)]
pub enum DecodeError {
  #[error("not base64: {0}")]
  Base64(#[from] base64::DecodeError),

  #[error("not utf-8: {0}")]
  Utf8(#[from] std::string::FromUtf8Error),

  #[error("not json: {0}")]
  Json(#[from] serde_json::Error),
}
