//! [`StoredCookie`] and the RFC 6265 default-path rule.

use crumb_core::{Location, SameSite, domain_matches, path_matches};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// One cookie as held by the jar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCookie {
  pub name:      String,
  /// Raw value exactly as assigned; the jar never decodes it.
  pub value:     String,
  /// Bare host for host-only cookies, `.domain` for `Domain=` cookies.
  pub domain:    String,
  pub path:      String,
  /// `None` for a session cookie.
  #[serde(with = "time::serde::rfc3339::option")]
  pub expires:   Option<OffsetDateTime>,
  pub secure:    bool,
  pub same_site: SameSite,
  /// Creation order; preserved when a cookie is overwritten.
  pub seq:       u64,
}

impl StoredCookie {
  pub fn host_only(&self) -> bool { !self.domain.starts_with('.') }

  /// The registrable part of `domain`, without the leading dot.
  pub fn bare_domain(&self) -> &str { self.domain.trim_start_matches('.') }

  pub fn is_expired(&self, now: OffsetDateTime) -> bool {
    self.expires.is_some_and(|at| at <= now)
  }

  /// Whether `document.cookie` on `location` includes this cookie.
  pub fn visible_from(&self, location: &Location) -> bool {
    let domain_ok = if self.host_only() {
      location.host == self.domain
    } else {
      domain_matches(&location.host, self.bare_domain())
    };
    domain_ok
      && path_matches(&location.path, &self.path)
      && (!self.secure || location.secure)
  }

  /// The `name=value` pair as it appears in `document.cookie`.
  pub fn pair(&self) -> String {
    if self.name.is_empty() {
      self.value.clone()
    } else {
      format!("{}={}", self.name, self.value)
    }
  }

  pub fn same_key(&self, name: &str, domain: &str, path: &str) -> bool {
    self.name == name && self.domain == domain && self.path == path
  }
}

// ─── Default path ────────────────────────────────────────────────────────────

/// RFC 6265 §5.1.4 default-path: the directory of the request path.
pub fn default_path(request_path: &str) -> String {
  if !request_path.starts_with('/') {
    return "/".to_owned();
  }
  match request_path.rfind('/') {
    Some(0) | None => "/".to_owned(),
    Some(i) => request_path[..i].to_owned(),
  }
}
