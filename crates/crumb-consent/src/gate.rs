//! Capability gate: permission booleans derived from consent state.

use crumb_core::consent::{ConsentCategory, ConsentPreferences, ConsentState};

/// Anything that knows the consent flag and the preferences.
///
/// Only the two accessors are required; every permission is derived from
/// them and holds no state of its own.
pub trait CapabilityGate {
  /// Whether the visitor has made an explicit choice.
  fn has_consent(&self) -> bool;

  fn preferences(&self) -> ConsentPreferences;

  /// `category` is granted *and* the visitor has made a choice.
  fn allows(&self, category: ConsentCategory) -> bool {
    self.has_consent() && self.preferences().get(category)
  }

  fn can_store_data(&self) -> bool { self.allows(ConsentCategory::Functional) }

  fn can_track_analytics(&self) -> bool { self.allows(ConsentCategory::Analytics) }

  fn can_track_marketing(&self) -> bool { self.allows(ConsentCategory::Marketing) }

  /// The raw preference, ignoring the consent flag. Used to render toggle
  /// state before the visitor has chosen.
  fn is_category_enabled(&self, category: ConsentCategory) -> bool {
    self.preferences().get(category)
  }

  fn state(&self) -> ConsentState {
    ConsentState::derive(self.has_consent(), &self.preferences())
  }
}

/// A point-in-time copy of the consent state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConsentSnapshot {
  pub has_consent: bool,
  pub preferences: ConsentPreferences,
}

impl ConsentSnapshot {
  pub fn of(gate: &(impl CapabilityGate + ?Sized)) -> Self {
    Self {
      has_consent: gate.has_consent(),
      preferences: gate.preferences(),
    }
  }
}

impl CapabilityGate for ConsentSnapshot {
  fn has_consent(&self) -> bool { self.has_consent }

  fn preferences(&self) -> ConsentPreferences { self.preferences }
}
