//! [`ConsentLedger`] — the persisted consent flag and preferences.
//!
//! ```text
//!              accept_all / reject_all / save_preferences
//!   NoChoice ─────────────────────────────────────────────▶ Accepted
//!      ▲                                                   PartiallyAccepted
//!      └──────────────────────── revoke ────────────────── Rejected
//! ```
//!
//! Any chosen state moves to any other through `save_preferences`. The
//! state itself is never stored; see [`ConsentState::derive`].

use crumb_core::{
  CookieDocument,
  consent::{ConsentPreferences, ConsentState, PreferencesUpdate},
};
use tracing::{info, warn};

use crate::{CapabilityGate, ProfileStore, Result, cookies::CookieStore};

/// Holds the literal `"true"` or `"false"`.
pub const CONSENT_COOKIE: &str = "cookie_consent";
/// Holds the preferences as plain JSON.
pub const PREFERENCES_COOKIE: &str = "cookie_preferences";

pub struct ConsentLedger<'a, D> {
  cookies: &'a CookieStore<D>,
}

impl<'a, D: CookieDocument> ConsentLedger<'a, D> {
  pub fn new(cookies: &'a CookieStore<D>) -> Self { Self { cookies } }

  /// Read the preferences, falling back to the defaults when the cookie is
  /// missing or unreadable.
  pub fn read_preferences(&self) -> ConsentPreferences {
    let Some(raw) = self.cookies.get(PREFERENCES_COOKIE) else {
      return ConsentPreferences::default();
    };
    ConsentPreferences::from_json(&raw).unwrap_or_else(|e| {
      warn!(error = %e, "unreadable consent preferences, using defaults");
      ConsentPreferences::default()
    })
  }

  /// Grant every category.
  pub fn accept_all(&self) -> Result<ConsentPreferences> {
    self.record_choice(ConsentPreferences::all_granted())
  }

  /// Refuse every optional category. Still counts as a choice.
  pub fn reject_all(&self) -> Result<ConsentPreferences> {
    self.record_choice(ConsentPreferences::necessary_only())
  }

  /// Merge `update` into the current preferences and record the result.
  pub fn save_preferences(&self, update: &PreferencesUpdate) -> Result<ConsentPreferences> {
    let mut preferences = self.read_preferences();
    preferences.apply(update);
    self.record_choice(preferences)
  }

  /// Withdraw consent: delete the profile, reset the preferences and clear
  /// the flag.
  pub fn revoke(&self) -> Result<()> {
    ProfileStore::new(self.cookies).clear()?;
    self
      .cookies
      .put(PREFERENCES_COOKIE, &ConsentPreferences::default().to_json()?)?;
    self.cookies.put(CONSENT_COOKIE, "false")?;
    info!("consent revoked");
    Ok(())
  }

  fn record_choice(&self, preferences: ConsentPreferences) -> Result<ConsentPreferences> {
    // Preferences first, so the flag never vouches for a choice that was
    // not stored.
    self.cookies.put(PREFERENCES_COOKIE, &preferences.to_json()?)?;
    self.cookies.put(CONSENT_COOKIE, "true")?;
    info!(
      state = %ConsentState::derive(true, &preferences),
      "consent recorded"
    );
    Ok(preferences)
  }
}

impl<D: CookieDocument> CapabilityGate for ConsentLedger<'_, D> {
  fn has_consent(&self) -> bool {
    self.cookies.get(CONSENT_COOKIE).as_deref() == Some("true")
  }

  fn preferences(&self) -> ConsentPreferences { self.read_preferences() }
}
