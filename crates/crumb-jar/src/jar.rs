//! [`MemoryJar`] — the in-memory implementation of [`CookieDocument`].

use std::cell::{Cell, RefCell};

use cookie::Cookie;
use crumb_core::{CookieDocument, Location, SameSite, domain_matches};
use time::{Date, Duration, OffsetDateTime};
use tracing::debug;

use crate::{
  error::Rejection,
  snapshot::JarSnapshot,
  stored::{StoredCookie, default_path},
};

// ─── Limits ──────────────────────────────────────────────────────────────────

/// Storage limits, defaulting to what mainstream browsers enforce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JarLimits {
  /// Upper bound on `name.len() + value.len()`.
  pub max_cookie_bytes:       usize,
  /// Cookies kept per domain before the oldest is evicted.
  pub max_cookies_per_domain: usize,
}

impl Default for JarLimits {
  fn default() -> Self {
    Self {
      max_cookie_bytes:       4096,
      max_cookies_per_domain: 180,
    }
  }
}

// ─── Jar ─────────────────────────────────────────────────────────────────────

/// A browser cookie jar seen from one document.
///
/// Single-threaded by construction: interior mutability is `RefCell`-based,
/// so the jar is neither `Send` nor `Sync`.
pub struct MemoryJar {
  location: Location,
  limits:   JarLimits,
  enabled:  Cell<bool>,
  frozen:   Cell<Option<OffsetDateTime>>,
  cookies:  RefCell<Vec<StoredCookie>>,
  next_seq: Cell<u64>,
}

impl MemoryJar {
  pub fn new(location: Location) -> Self {
    Self::with_limits(location, JarLimits::default())
  }

  pub fn with_limits(location: Location, limits: JarLimits) -> Self {
    Self {
      location,
      limits,
      enabled: Cell::new(true),
      frozen: Cell::new(None),
      cookies: RefCell::new(Vec::new()),
      next_seq: Cell::new(0),
    }
  }

  /// Restore a jar from a snapshot, dropping cookies that have expired
  /// since it was taken.
  pub fn from_snapshot(location: Location, snapshot: JarSnapshot) -> Self {
    let jar = Self::new(location);
    let next = snapshot
      .cookies
      .iter()
      .map(|c| c.seq + 1)
      .max()
      .unwrap_or(0);
    jar.next_seq.set(next);
    *jar.cookies.borrow_mut() = snapshot.cookies;
    jar.purge_expired();
    jar
  }

  /// Every unexpired cookie in the jar, visible from this document or not.
  pub fn snapshot(&self) -> JarSnapshot {
    self.purge_expired();
    JarSnapshot {
      cookies: self.cookies.borrow().clone(),
    }
  }

  pub fn cookies(&self) -> Vec<StoredCookie> { self.snapshot().cookies }

  pub fn len(&self) -> usize {
    self.purge_expired();
    self.cookies.borrow().len()
  }

  pub fn is_empty(&self) -> bool { self.len() == 0 }

  /// Simulate the visitor blocking (or unblocking) cookies. A disabled jar
  /// ignores writes and reads as empty, but keeps what it already holds.
  pub fn set_enabled(&self, enabled: bool) { self.enabled.set(enabled); }

  /// Pin the jar's clock to `at`.
  pub fn freeze_time(&self, at: OffsetDateTime) { self.frozen.set(Some(at)); }

  /// Move a frozen clock forward; freezes it at "now + by" if it was live.
  pub fn advance(&self, by: Duration) { self.frozen.set(Some(self.now() + by)); }

  fn now(&self) -> OffsetDateTime {
    self.frozen.get().unwrap_or_else(OffsetDateTime::now_utc)
  }

  fn purge_expired(&self) {
    let now = self.now();
    self.cookies.borrow_mut().retain(|c| !c.is_expired(now));
  }

  /// Apply the browser's admission rules to a parsed assignment.
  fn admit(&self, parsed: &Cookie<'_>) -> Result<StoredCookie, Rejection> {
    if !self.enabled.get() {
      return Err(Rejection::Disabled);
    }

    let name = parsed.name();
    if name.is_empty() {
      return Err(Rejection::EmptyName);
    }

    let size = name.len() + parsed.value().len();
    if size > self.limits.max_cookie_bytes {
      return Err(Rejection::TooLarge(size, self.limits.max_cookie_bytes));
    }

    let host = &self.location.host;
    let domain = match parsed
      .domain()
      .map(|d| d.trim_start_matches('.').to_ascii_lowercase())
      .filter(|d| !d.is_empty())
    {
      Some(d) if domain_matches(host, &d) => format!(".{d}"),
      Some(d) => {
        return Err(Rejection::DomainMismatch {
          domain: d,
          host:   host.clone(),
        });
      }
      None => host.clone(),
    };

    let path = parsed
      .path()
      .filter(|p| p.starts_with('/'))
      .map(str::to_owned)
      .unwrap_or_else(|| default_path(&self.location.path));

    let secure = parsed.secure().unwrap_or(false);
    if secure && !self.location.secure {
      return Err(Rejection::InsecureOrigin);
    }

    let same_site = match parsed.same_site() {
      Some(cookie::SameSite::Strict) => SameSite::Strict,
      Some(cookie::SameSite::None) => SameSite::None,
      Some(cookie::SameSite::Lax) | None => SameSite::Lax,
    };
    if same_site == SameSite::None && !secure {
      return Err(Rejection::NoneWithoutSecure);
    }

    // Max-Age takes precedence over Expires.
    let now = self.now();
    let expires = match parsed.max_age() {
      Some(max_age) => Some(now.checked_add(max_age).unwrap_or_else(far_future)),
      None => parsed.expires_datetime(),
    };

    Ok(StoredCookie {
      name: name.to_owned(),
      value: parsed.value().to_owned(),
      domain,
      path,
      expires,
      secure,
      same_site,
      seq: 0,
    })
  }

  fn store(&self, mut incoming: StoredCookie) {
    let now = self.now();
    let mut cookies = self.cookies.borrow_mut();
    let existing = cookies
      .iter()
      .position(|c| c.same_key(&incoming.name, &incoming.domain, &incoming.path));

    if incoming.is_expired(now) {
      if let Some(i) = existing {
        cookies.remove(i);
        debug!(name = %incoming.name, "cookie deleted");
      }
      return;
    }

    match existing {
      Some(i) => {
        incoming.seq = cookies[i].seq;
        cookies[i] = incoming;
      }
      None => {
        incoming.seq = self.next_seq.get();
        self.next_seq.set(incoming.seq + 1);
        let bare = incoming.bare_domain().to_owned();
        cookies.push(incoming);
        evict_over_limit(&mut cookies, &bare, self.limits.max_cookies_per_domain);
      }
    }
  }
}

fn far_future() -> OffsetDateTime { Date::MAX.midnight().assume_utc() }

/// Drop the oldest cookies of `domain` until at most `max` remain.
fn evict_over_limit(cookies: &mut Vec<StoredCookie>, domain: &str, max: usize) {
  loop {
    let in_domain = cookies.iter().filter(|c| c.bare_domain() == domain);
    if in_domain.clone().count() <= max {
      return;
    }
    let Some(oldest) = in_domain.map(|c| c.seq).min() else { return };
    cookies.retain(|c| !(c.bare_domain() == domain && c.seq == oldest));
    debug!(domain, "evicted oldest cookie over the per-domain limit");
  }
}

// ─── CookieDocument impl ─────────────────────────────────────────────────────

impl CookieDocument for MemoryJar {
  fn location(&self) -> &Location { &self.location }

  fn cookie(&self) -> String {
    if !self.enabled.get() {
      return String::new();
    }
    let now = self.now();
    let cookies = self.cookies.borrow();
    let mut visible: Vec<&StoredCookie> = cookies
      .iter()
      .filter(|c| !c.is_expired(now) && c.visible_from(&self.location))
      .collect();
    // Longer paths first, then oldest first.
    visible.sort_by(|a, b| {
      b.path.len().cmp(&a.path.len()).then(a.seq.cmp(&b.seq))
    });
    visible
      .iter()
      .map(|c| c.pair())
      .collect::<Vec<_>>()
      .join("; ")
  }

  fn set_cookie(&self, assignment: &str) {
    let admitted = Cookie::parse(assignment)
      .map_err(Rejection::from)
      .and_then(|parsed| self.admit(&parsed));
    match admitted {
      Ok(cookie) => self.store(cookie),
      Err(reason) => debug!(%reason, "cookie assignment ignored"),
    }
  }
}
