//! The per-visitor profile document and its merge rules.
//!
//! A [`ProfileRecord`] has named optional fields for everything the site
//! reads by name, three keyed maps (`preferences`, `settings`, `activity`),
//! and a flattened `extra` map for free-form data. Its JSON form is the
//! camelCase document persisted in the `user_details` cookie.

use std::collections::BTreeMap;

use chrono::{DateTime, SubsecRound as _, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::{Error, Result};

/// Top-level keys whose object values merge one level deep on update.
pub const NESTED_KEYS: [&str; 3] = ["preferences", "settings", "activity"];

// ─── Record ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub display_name: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub email:        Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub theme:        Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub language:     Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub role:         Option<String>,
  /// URL or data URI of the avatar image.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub avatar:       Option<String>,

  #[serde(
    default,
    deserialize_with = "null_as_default",
    skip_serializing_if = "Map::is_empty"
  )]
  pub preferences:  Map<String, Value>,
  #[serde(
    default,
    deserialize_with = "null_as_default",
    skip_serializing_if = "Map::is_empty"
  )]
  pub settings:     Map<String, Value>,
  /// Usage counters keyed by action name.
  #[serde(
    default,
    deserialize_with = "null_as_default",
    skip_serializing_if = "BTreeMap::is_empty"
  )]
  pub activity:     BTreeMap<String, ActivityEntry>,

  /// Set by the profile store on every successful write.
  #[serde(
    default,
    with = "iso_millis",
    skip_serializing_if = "Option::is_none"
  )]
  pub last_updated: Option<DateTime<Utc>>,

  /// Any other top-level keys. Keys naming a typed field belong in that
  /// field; [`set_field`](Self::set_field) routes them there.
  #[serde(flatten)]
  pub extra:        Map<String, Value>,
}

impl ProfileRecord {
  pub fn new() -> Self { Self::default() }

  pub fn display_name(mut self, v: impl Into<String>) -> Self {
    self.display_name = Some(v.into());
    self
  }

  pub fn email(mut self, v: impl Into<String>) -> Self {
    self.email = Some(v.into());
    self
  }

  pub fn theme(mut self, v: impl Into<String>) -> Self {
    self.theme = Some(v.into());
    self
  }

  pub fn language(mut self, v: impl Into<String>) -> Self {
    self.language = Some(v.into());
    self
  }

  pub fn role(mut self, v: impl Into<String>) -> Self {
    self.role = Some(v.into());
    self
  }

  pub fn avatar(mut self, v: impl Into<String>) -> Self {
    self.avatar = Some(v.into());
    self
  }

  pub fn preference(mut self, key: impl Into<String>, value: Value) -> Self {
    self.preferences.insert(key.into(), value);
    self
  }

  pub fn setting(mut self, key: impl Into<String>, value: Value) -> Self {
    self.settings.insert(key.into(), value);
    self
  }

  /// Set one top-level key by its JSON name. A key such as `theme` lands
  /// in its typed field, anything unknown in `extra`; a value of the wrong
  /// type for a typed field is an error.
  pub fn set_field(&mut self, key: &str, value: Value) -> Result<()> {
    let mut map = self.to_object()?;
    map.insert(key.to_owned(), value);
    *self = Self::from_object(map)?;
    Ok(())
  }

  /// `true` if no field carries a value.
  pub fn is_empty(&self) -> bool { *self == Self::default() }

  /// Set `last_updated`, truncated to the millisecond precision it is
  /// stored with.
  pub fn stamp(&mut self, at: DateTime<Utc>) { self.last_updated = Some(at.trunc_subsecs(3)); }

  pub fn to_object(&self) -> Result<Map<String, Value>> {
    match serde_json::to_value(self)? {
      Value::Object(map) => Ok(map),
      _ => Err(Error::NotAnObject("profile record")),
    }
  }

  pub fn from_object(map: Map<String, Value>) -> Result<Self> {
    Ok(serde_json::from_value(Value::Object(map))?)
  }

  /// Merge the keys present in `partial` into this record.
  ///
  /// Top-level keys replace; the [`NESTED_KEYS`] maps merge per sub-key.
  pub fn merge(&mut self, partial: &ProfileRecord) -> Result<()> {
    let mut base = self.to_object()?;
    merge_objects(&mut base, partial.to_object()?);
    *self = Self::from_object(base)?;
    Ok(())
  }
}

/// Apply the profile merge rules to raw JSON objects.
pub fn merge_objects(base: &mut Map<String, Value>, patch: Map<String, Value>) {
  for (key, value) in patch {
    match value {
      Value::Object(incoming) if NESTED_KEYS.contains(&key.as_str()) => {
        match base.get_mut(&key) {
          Some(Value::Object(existing)) => existing.extend(incoming),
          _ => {
            base.insert(key, Value::Object(incoming));
          }
        }
      }
      value => {
        base.insert(key, value);
      }
    }
  }
}

// ─── Activity ────────────────────────────────────────────────────────────────

/// Usage counter for one named action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
  #[serde(default)]
  pub count:          u64,
  #[serde(
    default,
    with = "iso_millis",
    skip_serializing_if = "Option::is_none"
  )]
  pub last_performed: Option<DateTime<Utc>>,
  #[serde(
    default,
    deserialize_with = "null_as_default",
    skip_serializing_if = "Map::is_empty"
  )]
  pub data:           Map<String, Value>,
}

impl ActivityEntry {
  /// Count one more occurrence at `at`, merging `data` over earlier data.
  pub fn record(&mut self, at: DateTime<Utc>, data: Map<String, Value>) {
    self.count += 1;
    self.last_performed = Some(at.trunc_subsecs(3));
    self.data.extend(data);
  }
}

/// Read a JSON `null` as the empty value.
fn null_as_default<'de, D, T>(d: D) -> std::result::Result<T, D::Error>
where
  D: Deserializer<'de>,
  T: Default + Deserialize<'de>,
{
  Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

// ─── Timestamp format ────────────────────────────────────────────────────────

/// ISO-8601 with millisecond precision and a `Z` suffix, e.g.
/// `2024-05-01T09:30:00.250Z`. Any RFC 3339 string is accepted on read.
mod iso_millis {
  use chrono::{DateTime, SecondsFormat, Utc};
  use serde::{Deserialize, Deserializer, Serializer};

  pub fn serialize<S: Serializer>(
    value: &Option<DateTime<Utc>>,
    s: S,
  ) -> std::result::Result<S::Ok, S::Error> {
    match value {
      Some(dt) => s.serialize_some(&dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
      None => s.serialize_none(),
    }
  }

  pub fn deserialize<'de, D: Deserializer<'de>>(
    d: D,
  ) -> std::result::Result<Option<DateTime<Utc>>, D::Error> {
    let raw: Option<String> = Option::deserialize(d)?;
    raw
      .map(|s| {
        DateTime::parse_from_rfc3339(&s)
          .map(|dt| dt.with_timezone(&Utc))
          .map_err(serde::de::Error::custom)
      })
      .transpose()
  }
}
