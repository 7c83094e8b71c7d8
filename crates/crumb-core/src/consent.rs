//! Consent categories, per-category preferences, and the derived consent
//! state.
//!
//! The `necessary` category is not a field of [`ConsentPreferences`]: it is
//! reported as granted by every accessor and written as `true` on every
//! serialisation, so no value of the type can clear it.

use std::{collections::BTreeMap, str::FromStr};

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

use crate::{Error, Result};

// ─── Category ────────────────────────────────────────────────────────────────

/// A class of storage or tracking the visitor can allow or refuse.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
  AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ConsentCategory {
  /// Cookies the site cannot work without. Always granted.
  Necessary,
  /// Remembering choices such as theme, language, and profile details.
  Functional,
  Analytics,
  Marketing,
}

impl ConsentCategory {
  /// Parse a category name, case-insensitively.
  pub fn parse(name: &str) -> Result<Self> {
    Self::from_str(name).map_err(|_| Error::UnknownCategory(name.to_owned()))
  }

  pub fn is_required(self) -> bool { matches!(self, Self::Necessary) }

  /// Every category the visitor is allowed to refuse.
  pub fn optional() -> impl Iterator<Item = Self> {
    Self::iter().filter(|c| !c.is_required())
  }
}

// ─── Preferences ─────────────────────────────────────────────────────────────

/// The visitor's per-category choices.
///
/// `Default` is the pre-choice record: only `necessary` granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "PreferencesRecord", into = "PreferencesRecord")]
pub struct ConsentPreferences {
  functional: bool,
  analytics:  bool,
  marketing:  bool,
}

/// Wire shape of the `cookie_preferences` cookie.
#[derive(Serialize, Deserialize)]
#[serde(default)]
struct PreferencesRecord {
  necessary:  bool,
  functional: bool,
  analytics:  bool,
  marketing:  bool,
}

impl Default for PreferencesRecord {
  fn default() -> Self { ConsentPreferences::default().into() }
}

impl From<PreferencesRecord> for ConsentPreferences {
  fn from(r: PreferencesRecord) -> Self {
    // `r.necessary` is dropped on purpose: it cannot be cleared.
    Self {
      functional: r.functional,
      analytics:  r.analytics,
      marketing:  r.marketing,
    }
  }
}

impl From<ConsentPreferences> for PreferencesRecord {
  fn from(p: ConsentPreferences) -> Self {
    Self {
      necessary:  true,
      functional: p.functional,
      analytics:  p.analytics,
      marketing:  p.marketing,
    }
  }
}

impl ConsentPreferences {
  /// Every category granted.
  pub fn all_granted() -> Self {
    Self {
      functional: true,
      analytics:  true,
      marketing:  true,
    }
  }

  /// Only `necessary` granted; identical to `Default`.
  pub fn necessary_only() -> Self { Self::default() }

  pub fn get(&self, category: ConsentCategory) -> bool {
    match category {
      ConsentCategory::Necessary => true,
      ConsentCategory::Functional => self.functional,
      ConsentCategory::Analytics => self.analytics,
      ConsentCategory::Marketing => self.marketing,
    }
  }

  /// Set one category. Returns `false` (and changes nothing) for
  /// `necessary`.
  pub fn set(&mut self, category: ConsentCategory, granted: bool) -> bool {
    match category {
      ConsentCategory::Necessary => return false,
      ConsentCategory::Functional => self.functional = granted,
      ConsentCategory::Analytics => self.analytics = granted,
      ConsentCategory::Marketing => self.marketing = granted,
    }
    true
  }

  /// Merge a partial update into these preferences.
  pub fn apply(&mut self, update: &PreferencesUpdate) {
    for (category, granted) in update.iter() {
      self.set(category, granted);
    }
  }

  /// `(category, granted)` pairs in declaration order, `necessary` first.
  pub fn iter(&self) -> impl Iterator<Item = (ConsentCategory, bool)> + '_ {
    ConsentCategory::iter().map(|c| (c, self.get(c)))
  }

  pub fn to_json(&self) -> Result<String> { Ok(serde_json::to_string(self)?) }

  pub fn from_json(s: &str) -> Result<Self> { Ok(serde_json::from_str(s)?) }
}

// ─── Partial update ──────────────────────────────────────────────────────────

/// A partial set of category choices, as submitted from a settings form.
///
/// Categories that are absent keep their current value when applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PreferencesUpdate(BTreeMap<ConsentCategory, bool>);

impl PreferencesUpdate {
  pub fn new() -> Self { Self::default() }

  pub fn with(mut self, category: ConsentCategory, granted: bool) -> Self {
    self.set(category, granted);
    self
  }

  pub fn set(&mut self, category: ConsentCategory, granted: bool) {
    self.0.insert(category, granted);
  }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn iter(&self) -> impl Iterator<Item = (ConsentCategory, bool)> + '_ {
    self.0.iter().map(|(c, g)| (*c, *g))
  }
}

impl FromIterator<(ConsentCategory, bool)> for PreferencesUpdate {
  fn from_iter<I: IntoIterator<Item = (ConsentCategory, bool)>>(iter: I) -> Self {
    Self(iter.into_iter().collect())
  }
}

// ─── Derived state ───────────────────────────────────────────────────────────

/// Where the visitor stands in the consent flow. Never stored; always
/// derived from the consent flag and the preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ConsentState {
  NoChoice,
  Accepted,
  PartiallyAccepted,
  Rejected,
}

impl ConsentState {
  pub fn derive(has_consent: bool, preferences: &ConsentPreferences) -> Self {
    if !has_consent {
      return Self::NoChoice;
    }
    let granted = ConsentCategory::optional()
      .filter(|c| preferences.get(*c))
      .count();
    match granted {
      0 => Self::Rejected,
      n if n == ConsentCategory::optional().count() => Self::Accepted,
      _ => Self::PartiallyAccepted,
    }
  }

  pub fn has_choice(self) -> bool { !matches!(self, Self::NoChoice) }
}

#[cfg(test)]
mod tests {
  use proptest::prelude::*;

  use super::*;

  #[test]
  fn default_grants_only_necessary() {
    let p = ConsentPreferences::default();
    assert!(p.get(ConsentCategory::Necessary));
    assert!(!p.get(ConsentCategory::Functional));
    assert!(!p.get(ConsentCategory::Analytics));
    assert!(!p.get(ConsentCategory::Marketing));
  }

  #[test]
  fn necessary_cannot_be_cleared() {
    let mut p = ConsentPreferences::all_granted();
    assert!(!p.set(ConsentCategory::Necessary, false));
    assert!(p.get(ConsentCategory::Necessary));
  }

  #[test]
  fn wire_format_always_carries_necessary() {
    let json = ConsentPreferences::default().to_json().unwrap();
    assert_eq!(
      json,
      r#"{"necessary":true,"functional":false,"analytics":false,"marketing":false}"#
    );
  }

  #[test]
  fn deserialising_necessary_false_still_grants_it() {
    let p = ConsentPreferences::from_json(
      r#"{"necessary":false,"functional":true}"#,
    )
    .unwrap();
    assert!(p.get(ConsentCategory::Necessary));
    assert!(p.get(ConsentCategory::Functional));
    assert!(!p.get(ConsentCategory::Marketing));
  }

  #[test]
  fn update_keeps_absent_categories() {
    let mut p = ConsentPreferences::default();
    p.apply(&PreferencesUpdate::new().with(ConsentCategory::Analytics, true));
    p.apply(&PreferencesUpdate::new().with(ConsentCategory::Marketing, true));
    assert!(p.get(ConsentCategory::Analytics));
    assert!(p.get(ConsentCategory::Marketing));
    assert!(!p.get(ConsentCategory::Functional));
  }

  #[test]
  fn category_parse_is_case_insensitive() {
    assert_eq!(
      ConsentCategory::parse("Analytics").unwrap(),
      ConsentCategory::Analytics
    );
    assert!(matches!(
      ConsentCategory::parse("cookies"),
      Err(Error::UnknownCategory(_))
    ));
  }

  #[test]
  fn state_derivation() {
    let partial = ConsentPreferences::from_json(r#"{"functional":true}"#).unwrap();
    assert_eq!(
      ConsentState::derive(false, &ConsentPreferences::all_granted()),
      ConsentState::NoChoice
    );
    assert_eq!(
      ConsentState::derive(true, &ConsentPreferences::all_granted()),
      ConsentState::Accepted
    );
    assert_eq!(
      ConsentState::derive(true, &ConsentPreferences::necessary_only()),
      ConsentState::Rejected
    );
    assert_eq!(
      ConsentState::derive(true, &partial),
      ConsentState::PartiallyAccepted
    );
  }

  #[derive(Debug, Clone)]
  enum Op {
    AcceptAll,
    RejectAll,
    Save(Vec<(ConsentCategory, bool)>),
  }

  fn category() -> impl Strategy<Value = ConsentCategory> {
    prop_oneof![
      Just(ConsentCategory::Necessary),
      Just(ConsentCategory::Functional),
      Just(ConsentCategory::Analytics),
      Just(ConsentCategory::Marketing),
    ]
  }

  fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
      Just(Op::AcceptAll),
      Just(Op::RejectAll),
      prop::collection::vec((category(), any::<bool>()), 0..5).prop_map(Op::Save),
    ]
  }

  proptest! {
    #[test]
    fn necessary_survives_any_sequence(ops in prop::collection::vec(op(), 0..20)) {
      let mut p = ConsentPreferences::default();
      for op in ops {
        match op {
          Op::AcceptAll => p = ConsentPreferences::all_granted(),
          Op::RejectAll => p = ConsentPreferences::necessary_only(),
          Op::Save(pairs) => p.apply(&pairs.into_iter().collect()),
        }
        prop_assert!(p.get(ConsentCategory::Necessary));
        let reparsed = ConsentPreferences::from_json(&p.to_json().unwrap()).unwrap();
        prop_assert!(reparsed.get(ConsentCategory::Necessary));
        prop_assert_eq!(reparsed, p);
      }
    }
  }
}
