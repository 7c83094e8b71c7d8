//! [`ConsentProvider`] — the façade UI code talks to.
//!
//! The provider reads the persisted consent state and profile once, on
//! construction, and keeps them in memory. Every mutation goes through it
//! and updates cookies and memory together, so components read the cached
//! state and never touch the cookie jar themselves.
//!
//! Nothing here returns an error. Mutations return `true` on success; on
//! failure they return `false`, keep a human-readable message in
//! [`last_error`](ConsentProvider::last_error), and re-read the cookies so
//! the cache never drifts from what is actually stored.

use crumb_core::{
  CookieAttributes, CookieDocument,
  consent::{ConsentPreferences, PreferencesUpdate},
  profile::ProfileRecord,
};
use serde_json::{Map, Value};
use tracing::warn;

use crate::{
  CapabilityGate, ConsentLedger, ConsentSnapshot, ProfileStore, Result, cookies::CookieStore,
};

pub struct ConsentProvider<D> {
  cookies: CookieStore<D>,
  consent: ConsentSnapshot,
  profile: Option<ProfileRecord>,
  error:   Option<String>,
}

impl<D: CookieDocument> ConsentProvider<D> {
  pub fn new(document: D) -> Self {
    Self::with_attributes(document, CookieAttributes::default())
  }

  /// A provider that writes its cookies with `attributes`.
  pub fn with_attributes(document: D, attributes: CookieAttributes) -> Self {
    let mut provider = Self {
      cookies: CookieStore::with_defaults(document, attributes),
      consent: ConsentSnapshot::default(),
      profile: None,
      error:   None,
    };
    provider.reload();
    provider
  }

  /// Re-read consent and profile from the cookie jar, e.g. after another
  /// tab changed them.
  pub fn reload(&mut self) {
    self.consent = ConsentSnapshot::of(&ConsentLedger::new(&self.cookies));
    self.profile = ProfileStore::new(&self.cookies).read();
  }

  // ── Cached state ────────────────────────────────────────────────────────

  pub fn consent(&self) -> ConsentSnapshot { self.consent }

  pub fn profile(&self) -> Option<&ProfileRecord> { self.profile.as_ref() }

  /// Message from the most recent failed operation; cleared by the next
  /// successful one.
  pub fn last_error(&self) -> Option<&str> { self.error.as_deref() }

  pub fn clear_error(&mut self) { self.error = None; }

  /// Whether the consent banner should be shown.
  pub fn banner_visible(&self) -> bool { !self.state().has_choice() }

  pub fn cookies_enabled(&self) -> bool { self.cookies.cookies_enabled() }

  pub fn cookie_store(&self) -> &CookieStore<D> { &self.cookies }

  // ── Consent ─────────────────────────────────────────────────────────────

  pub fn accept_all(&mut self) -> bool {
    let result = ConsentLedger::new(&self.cookies).accept_all();
    self.settle_consent("accept_all", result)
  }

  pub fn reject_all(&mut self) -> bool {
    let result = ConsentLedger::new(&self.cookies).reject_all();
    self.settle_consent("reject_all", result)
  }

  pub fn save_preferences(&mut self, update: &PreferencesUpdate) -> bool {
    let result = ConsentLedger::new(&self.cookies).save_preferences(update);
    self.settle_consent("save_preferences", result)
  }

  /// Withdraw consent; also deletes the stored profile.
  pub fn revoke(&mut self) -> bool {
    let result = ConsentLedger::new(&self.cookies).revoke();
    let ok = self.settle("revoke", result).is_some();
    if ok {
      self.consent = ConsentSnapshot::default();
      self.profile = None;
    }
    ok
  }

  // ── Profile ─────────────────────────────────────────────────────────────

  /// Replace the stored profile. Requires functional consent.
  pub fn write_profile(&mut self, record: ProfileRecord) -> bool {
    let result = ProfileStore::new(&self.cookies).write(&self.consent, record);
    self.settle_profile("write_profile", result)
  }

  /// Merge `partial` into the stored profile. Requires functional consent.
  pub fn update_profile(&mut self, partial: &ProfileRecord) -> bool {
    let result = ProfileStore::new(&self.cookies).update(&self.consent, partial);
    self.settle_profile("update_profile", result)
  }

  pub fn set_profile_preference(&mut self, key: &str, value: Value) -> bool {
    let result = ProfileStore::new(&self.cookies).set_preference(&self.consent, key, value);
    self.settle_profile("set_profile_preference", result)
  }

  pub fn set_profile_setting(&mut self, key: &str, value: Value) -> bool {
    let result = ProfileStore::new(&self.cookies).set_setting(&self.consent, key, value);
    self.settle_profile("set_profile_setting", result)
  }

  /// Count one occurrence of `action` in the profile's activity map.
  /// Requires functional consent.
  pub fn track_action(&mut self, action: &str, data: Map<String, Value>) -> bool {
    let result = ProfileStore::new(&self.cookies).track_action(&self.consent, action, data);
    self.settle_profile("track_action", result)
  }

  /// Delete the stored profile. Allowed in any consent state.
  pub fn clear_profile(&mut self) -> bool {
    let result = ProfileStore::new(&self.cookies).clear();
    let ok = self.settle("clear_profile", result).is_some();
    if ok {
      self.profile = None;
    }
    ok
  }

  // ── Settling results ────────────────────────────────────────────────────

  fn settle<T>(&mut self, op: &'static str, result: Result<T>) -> Option<T> {
    match result {
      Ok(v) => {
        self.error = None;
        Some(v)
      }
      Err(e) => {
        warn!(op, error = %e, "operation failed");
        self.error = Some(e.to_string());
        self.reload();
        None
      }
    }
  }

  fn settle_consent(&mut self, op: &'static str, result: Result<ConsentPreferences>) -> bool {
    match self.settle(op, result) {
      Some(preferences) => {
        self.consent = ConsentSnapshot {
          has_consent: true,
          preferences,
        };
        true
      }
      None => false,
    }
  }

  fn settle_profile(&mut self, op: &'static str, result: Result<ProfileRecord>) -> bool {
    match self.settle(op, result) {
      Some(record) => {
        self.profile = Some(record);
        true
      }
      None => false,
    }
  }
}

impl<D: CookieDocument> CapabilityGate for ConsentProvider<D> {
  fn has_consent(&self) -> bool { self.consent.has_consent }

  fn preferences(&self) -> ConsentPreferences { self.consent.preferences }
}
