//! [`CookieStore`] — named get/set/delete over a [`CookieDocument`].
//!
//! Names and values are percent-encoded on write and decoded on read, so a
//! value containing `;`, `=` or spaces cannot corrupt the cookie string.

use std::collections::BTreeMap;

use cookie::Cookie;
use crumb_core::{
  CookieAttributes, CookieDocument, Location, ResolvedAttributes, SameSite, domain_matches,
  path_matches,
};
use time::{Duration, OffsetDateTime};
use tracing::debug;

use crate::{Error, Result};

/// Name of the throwaway cookie written by [`CookieStore::cookies_enabled`].
const PROBE_COOKIE: &str = "crumb_probe";

pub struct CookieStore<D> {
  document: D,
  defaults: CookieAttributes,
}

impl<D: CookieDocument> CookieStore<D> {
  pub fn new(document: D) -> Self {
    Self::with_defaults(document, CookieAttributes::default())
  }

  /// A store whose [`put`](Self::put) and [`remove`](Self::remove) use
  /// `defaults` instead of [`CookieAttributes::default`].
  pub fn with_defaults(document: D, defaults: CookieAttributes) -> Self {
    Self { document, defaults }
  }

  pub fn location(&self) -> &Location { self.document.location() }

  // ── Reads ───────────────────────────────────────────────────────────────

  /// The decoded value of `name`, if the document can see it. When several
  /// cookies share the name, the one listed first (most specific path) wins.
  pub fn get(&self, name: &str) -> Option<String> {
    self
      .parsed()
      .find(|c| c.name() == name)
      .map(|c| c.value().to_owned())
  }

  /// Every visible cookie, `name → value`.
  pub fn enumerate(&self) -> BTreeMap<String, String> {
    let mut all = BTreeMap::new();
    for c in self.parsed() {
      all
        .entry(c.name().to_owned())
        .or_insert_with(|| c.value().to_owned());
    }
    all
  }

  fn parsed(&self) -> impl Iterator<Item = Cookie<'static>> {
    Cookie::split_parse_encoded(self.document.cookie()).filter_map(|c| match c {
      Ok(c) => Some(c),
      Err(e) => {
        debug!(error = %e, "skipping unparseable cookie pair");
        None
      }
    })
  }

  // ── Writes ──────────────────────────────────────────────────────────────

  /// Write one cookie.
  ///
  /// When the cookie should be visible from the current page, it is read
  /// back; a value that did not stick is reported as
  /// [`Error::StorageUnavailable`].
  pub fn set(&self, name: &str, value: &str, attributes: &CookieAttributes) -> Result<()> {
    let resolved = attributes.resolve(self.location());
    let expires = resolved
      .expires_days
      .map(|days| OffsetDateTime::now_utc() + Duration::days(i64::from(days)));
    self
      .document
      .set_cookie(&assignment(name, value, &resolved, expires));

    if readable_here(self.location(), &resolved)
      && !self.parsed().any(|c| c.name() == name && c.value() == value)
    {
      debug!(name, "cookie did not read back");
      return Err(Error::StorageUnavailable { name: name.to_owned() });
    }
    Ok(())
  }

  /// [`set`](Self::set) with the store's default attributes.
  pub fn put(&self, name: &str, value: &str) -> Result<()> {
    self.set(name, value, &self.defaults)
  }

  /// Expire a cookie. `attributes` must carry the path and domain the
  /// cookie was created with, or the browser ignores the deletion.
  pub fn delete(&self, name: &str, attributes: &CookieAttributes) {
    let resolved = attributes.resolve(self.location());
    self.document.set_cookie(&assignment(
      name,
      "",
      &resolved,
      Some(OffsetDateTime::UNIX_EPOCH),
    ));
  }

  /// [`delete`](Self::delete) with the store's default attributes.
  pub fn remove(&self, name: &str) { self.delete(name, &self.defaults) }

  /// Probe whether cookies can be written at all. Never fails; any problem
  /// (cookies disabled, quota, private mode) reads as `false`.
  pub fn cookies_enabled(&self) -> bool {
    let session = CookieAttributes::session();
    let enabled = self.set(PROBE_COOKIE, "1", &session).is_ok()
      && self.get(PROBE_COOKIE).as_deref() == Some("1");
    self.delete(PROBE_COOKIE, &session);
    enabled
  }
}

/// Render a `document.cookie` assignment.
fn assignment(
  name: &str,
  value: &str,
  attrs: &ResolvedAttributes,
  expires: Option<OffsetDateTime>,
) -> String {
  let same_site = match attrs.same_site {
    SameSite::Strict => cookie::SameSite::Strict,
    SameSite::Lax => cookie::SameSite::Lax,
    SameSite::None => cookie::SameSite::None,
  };
  let mut builder = Cookie::build((name, value))
    .path(attrs.path.as_str())
    .domain(attrs.domain.as_str())
    .secure(attrs.secure)
    .same_site(same_site);
  if let Some(at) = expires {
    builder = builder.expires(at);
  }
  builder.build().encoded().to_string()
}

/// Whether a cookie written with `attrs` should show up in this page's
/// `document.cookie`.
fn readable_here(location: &Location, attrs: &ResolvedAttributes) -> bool {
  domain_matches(&location.host, attrs.domain.trim_start_matches('.'))
    && path_matches(&location.path, &attrs.path)
    && (!attrs.secure || location.secure)
}
