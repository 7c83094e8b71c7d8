//! Error types for `crumb-jar`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("snapshot json error: {0}")]
  Snapshot(#[from] serde_json::Error),

  #[error("snapshot io error: {0}")]
  Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Why the jar dropped a cookie assignment. Only ever logged.
#[derive(Debug, Error)]
pub(crate) enum Rejection {
  #[error("cookies are disabled")]
  Disabled,

  #[error("unparseable assignment: {0}")]
  Parse(#[from] cookie::ParseError),

  #[error("cookie name is empty")]
  EmptyName,

  #[error("cookie is {0} bytes, over the {1} byte limit")]
  TooLarge(usize, usize),

  #[error("domain {domain:?} does not match host {host:?}")]
  DomainMismatch { domain: String, host: String },

  #[error("secure cookie set from an insecure page")]
  InsecureOrigin,

  #[error("SameSite=None requires Secure")]
  NoneWithoutSecure,
}
