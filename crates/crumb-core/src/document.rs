//! The [`CookieDocument`] trait and the attribute types shared by everything
//! that writes cookies.
//!
//! A `CookieDocument` is the Rust face of the browser's `document.cookie`
//! property: a getter that returns every visible `name=value` pair and a
//! setter that takes one `Set-Cookie`-style assignment. The setter has no
//! failure channel, exactly like the browser's; an assignment the jar
//! refuses simply has no effect.

use serde::{Deserialize, Serialize};

// ─── Location ────────────────────────────────────────────────────────────────

/// The page the document was loaded from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Location {
  pub host:   String,
  /// Path of the current page, used for default-path and path matching.
  pub path:   String,
  /// `true` when the page was served over HTTPS.
  pub secure: bool,
}

impl Location {
  pub fn http(host: impl Into<String>) -> Self {
    Self {
      host:   host.into().to_ascii_lowercase(),
      path:   "/".to_owned(),
      secure: false,
    }
  }

  pub fn https(host: impl Into<String>) -> Self {
    Self {
      secure: true,
      ..Self::http(host)
    }
  }

  pub fn with_path(mut self, path: impl Into<String>) -> Self {
    self.path = path.into();
    self
  }
}

impl Default for Location {
  fn default() -> Self { Self::http("localhost") }
}

// ─── Matching ────────────────────────────────────────────────────────────────

/// RFC 6265 §5.1.3 domain matching; `domain` has no leading dot.
pub fn domain_matches(host: &str, domain: &str) -> bool {
  if host == domain {
    return true;
  }
  host
    .strip_suffix(domain)
    .is_some_and(|prefix| prefix.ends_with('.'))
    && host.parse::<std::net::IpAddr>().is_err()
}

/// RFC 6265 §5.1.4 path matching.
pub fn path_matches(request_path: &str, cookie_path: &str) -> bool {
  match request_path.strip_prefix(cookie_path) {
    Some(rest) => cookie_path.ends_with('/') || rest.is_empty() || rest.starts_with('/'),
    None => false,
  }
}

// ─── Document ────────────────────────────────────────────────────────────────

/// Access to a browser-style cookie jar for a single document.
///
/// Implementations are single-threaded: the host environment runs every
/// call on one thread, so the trait takes `&self` and carries no `Send` or
/// `Sync` bound.
pub trait CookieDocument {
  fn location(&self) -> &Location;

  /// The `document.cookie` getter: visible cookies as `a=1; b=2`.
  fn cookie(&self) -> String;

  /// The `document.cookie` setter. May be silently ignored.
  fn set_cookie(&self, assignment: &str);
}

impl<D: CookieDocument + ?Sized> CookieDocument for &D {
  fn location(&self) -> &Location { (**self).location() }

  fn cookie(&self) -> String { (**self).cookie() }

  fn set_cookie(&self, assignment: &str) { (**self).set_cookie(assignment) }
}

// ─── Attributes ──────────────────────────────────────────────────────────────

/// The `SameSite` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SameSite {
  Strict,
  #[default]
  Lax,
  None,
}

/// Options for writing a cookie. Unset fields fall back to values derived
/// from the current [`Location`] when [resolved](Self::resolve).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CookieAttributes {
  /// Lifetime in days. `None` or `Some(0)` writes a session cookie.
  pub expires_days: Option<u32>,
  /// Defaults to `/`.
  pub path:         Option<String>,
  /// Defaults to the current host.
  pub domain:       Option<String>,
  /// Defaults to whether the page is served over HTTPS.
  pub secure:       Option<bool>,
  pub same_site:    SameSite,
}

impl Default for CookieAttributes {
  fn default() -> Self {
    Self {
      expires_days: Some(365),
      path:         None,
      domain:       None,
      secure:       None,
      same_site:    SameSite::Lax,
    }
  }
}

/// [`CookieAttributes`] with every default filled in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAttributes {
  pub expires_days: Option<u32>,
  pub path:         String,
  pub domain:       String,
  pub secure:       bool,
  pub same_site:    SameSite,
}

impl CookieAttributes {
  /// Attributes for a cookie that lives until the browser session ends.
  pub fn session() -> Self {
    Self {
      expires_days: None,
      ..Self::default()
    }
  }

  pub fn resolve(&self, location: &Location) -> ResolvedAttributes {
    ResolvedAttributes {
      expires_days: self.expires_days.filter(|d| *d > 0),
      path:         self.path.clone().unwrap_or_else(|| "/".to_owned()),
      domain:       self
        .domain
        .clone()
        .unwrap_or_else(|| location.host.clone()),
      secure:       self.secure.unwrap_or(location.secure),
      same_site:    self.same_site,
    }
  }
}
