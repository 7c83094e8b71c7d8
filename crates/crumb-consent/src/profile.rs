//! [`ProfileStore`] — the visitor's profile document in the `user_details`
//! cookie.
//!
//! Writes are gated on [`PROFILE_CATEGORY`] consent; reads never are.
//! Unreadable stored data is logged and treated as absent.

use chrono::Utc;
use crumb_core::{
  CookieDocument,
  consent::ConsentCategory,
  profile::{ActivityEntry, ProfileRecord},
};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::{CapabilityGate, Error, Result, codec, cookies::CookieStore};

/// Holds the obfuscated profile JSON.
pub const PROFILE_COOKIE: &str = "user_details";

/// The category every profile write requires, `track_action` included.
pub const PROFILE_CATEGORY: ConsentCategory = ConsentCategory::Functional;

pub struct ProfileStore<'a, D> {
  cookies: &'a CookieStore<D>,
}

impl<'a, D: CookieDocument> ProfileStore<'a, D> {
  pub fn new(cookies: &'a CookieStore<D>) -> Self { Self { cookies } }

  /// The stored profile, or `None` if there is none or it cannot be
  /// decoded.
  pub fn read(&self) -> Option<ProfileRecord> {
    let token = self.cookies.get(PROFILE_COOKIE)?;
    match codec::deobfuscate(&token) {
      Ok(record) => Some(record),
      Err(e) => {
        warn!(error = %e, "discarding unreadable profile cookie");
        None
      }
    }
  }

  /// Replace the stored profile with `record`, stamped with the current
  /// time. Returns what was stored.
  pub fn write(
    &self,
    gate: &(impl CapabilityGate + ?Sized),
    mut record: ProfileRecord,
  ) -> Result<ProfileRecord> {
    require(gate)?;
    record.stamp(Utc::now());
    let token = codec::obfuscate(&record)?;
    self.cookies.put(PROFILE_COOKIE, &token)?;
    debug!(bytes = token.len(), "profile written");
    Ok(record)
  }

  /// Merge `partial` into the stored profile (or an empty one) and write
  /// the result.
  pub fn update(
    &self,
    gate: &(impl CapabilityGate + ?Sized),
    partial: &ProfileRecord,
  ) -> Result<ProfileRecord> {
    require(gate)?;
    let mut record = self.read().unwrap_or_default();
    record.merge(partial)?;
    self.write(gate, record)
  }

  /// Set one key of the profile's `preferences` map.
  pub fn set_preference(
    &self,
    gate: &(impl CapabilityGate + ?Sized),
    key: &str,
    value: Value,
  ) -> Result<ProfileRecord> {
    self.update(gate, &ProfileRecord::new().preference(key, value))
  }

  /// Set one key of the profile's `settings` map.
  pub fn set_setting(
    &self,
    gate: &(impl CapabilityGate + ?Sized),
    key: &str,
    value: Value,
  ) -> Result<ProfileRecord> {
    self.update(gate, &ProfileRecord::new().setting(key, value))
  }

  /// Count one occurrence of `action`, merging `data` into what was
  /// recorded for it before.
  pub fn track_action(
    &self,
    gate: &(impl CapabilityGate + ?Sized),
    action: &str,
    data: Map<String, Value>,
  ) -> Result<ProfileRecord> {
    require(gate)?;
    let mut entry: ActivityEntry = self
      .read()
      .and_then(|r| r.activity.get(action).cloned())
      .unwrap_or_default();
    entry.record(Utc::now(), data);

    let mut partial = ProfileRecord::new();
    partial.activity.insert(action.to_owned(), entry);
    self.update(gate, &partial)
  }

  /// Delete the stored profile, whatever the consent state.
  pub fn clear(&self) -> Result<()> {
    self.cookies.remove(PROFILE_COOKIE);
    if self.cookies.get(PROFILE_COOKIE).is_some() {
      return Err(Error::StorageUnavailable {
        name: PROFILE_COOKIE.to_owned(),
      });
    }
    debug!("profile cleared");
    Ok(())
  }
}

fn require(gate: &(impl CapabilityGate + ?Sized)) -> Result<()> {
  if gate.allows(PROFILE_CATEGORY) {
    Ok(())
  } else {
    Err(Error::PermissionDenied {
      category: PROFILE_CATEGORY,
    })
  }
}
