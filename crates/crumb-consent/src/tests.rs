//! End-to-end behaviour of `ConsentProvider` over a `MemoryJar`.

use crumb_core::{
  CookieAttributes, CookieDocument, Location,
  consent::{ConsentCategory, ConsentState, PreferencesUpdate},
  profile::ProfileRecord,
};
use crumb_jar::MemoryJar;
use serde_json::{Map, json};

use crate::{
  CapabilityGate, ConsentProvider,
  ledger::{CONSENT_COOKIE, PREFERENCES_COOKIE},
  profile::PROFILE_COOKIE,
};

fn jar() -> MemoryJar { MemoryJar::new(Location::https("example.com")) }

fn ann() -> ProfileRecord { ProfileRecord::new().display_name("Ann") }

// ─── Scenarios ───────────────────────────────────────────────────────────────

#[test]
fn no_consent_blocks_profile_writes() {
  let jar = jar();
  let mut p = ConsentProvider::new(&jar);

  assert!(p.banner_visible());
  assert!(!p.can_store_data());
  assert!(!p.update_profile(&ann()));
  assert!(p.last_error().unwrap().contains("functional"));
  assert!(p.profile().is_none());
  assert!(ConsentProvider::new(&jar).profile().is_none());
}

#[test]
fn full_accept_allows_profile_writes() {
  let jar = jar();
  let mut p = ConsentProvider::new(&jar);

  assert!(p.accept_all());
  assert!(!p.banner_visible());
  assert!(p.update_profile(&ann()));
  assert_eq!(p.last_error(), None);

  let fresh = ConsentProvider::new(&jar);
  let stored = fresh.profile().unwrap();
  assert_eq!(stored.display_name.as_deref(), Some("Ann"));
  assert!(stored.last_updated.is_some());

  let as_json = serde_json::to_value(stored).unwrap();
  let keys: Vec<_> = as_json.as_object().unwrap().keys().cloned().collect();
  assert_eq!(keys, ["displayName", "lastUpdated"]);
  assert!(as_json["lastUpdated"].as_str().unwrap().ends_with('Z'));
}

#[test]
fn partial_accept_allows_storage_but_not_analytics() {
  let jar = jar();
  let mut p = ConsentProvider::new(&jar);

  assert!(p.save_preferences(
    &PreferencesUpdate::new()
      .with(ConsentCategory::Functional, true)
      .with(ConsentCategory::Analytics, false)
      .with(ConsentCategory::Marketing, false),
  ));
  assert!(p.can_store_data());
  assert!(!p.can_track_analytics());
  assert!(!p.can_track_marketing());
  assert_eq!(p.state(), ConsentState::PartiallyAccepted);
}

#[test]
fn reject_then_retry_stays_blocked() {
  let jar = jar();
  let mut p = ConsentProvider::new(&jar);

  assert!(p.reject_all());
  assert_eq!(p.state(), ConsentState::Rejected);
  assert!(!p.banner_visible());
  assert!(!p.update_profile(&ann()));
  assert!(p.profile().is_none());
  assert!(jar.cookie().contains("cookie_consent=true"));
}

// ─── Properties ──────────────────────────────────────────────────────────────

#[test]
fn denied_update_leaves_prior_profile_untouched() {
  let jar = jar();
  let mut p = ConsentProvider::new(&jar);
  p.accept_all();
  p.update_profile(&ann());
  let before = p.profile().cloned();

  p.save_preferences(&PreferencesUpdate::new().with(ConsentCategory::Functional, false));
  assert!(!p.update_profile(&ProfileRecord::new().theme("dark")));

  assert_eq!(p.profile().cloned(), before);
  assert_eq!(ConsentProvider::new(&jar).profile().cloned(), before);
}

#[test]
fn write_replaces_rather_than_merges() {
  let jar = jar();
  let mut p = ConsentProvider::new(&jar);
  p.accept_all();
  assert!(p.write_profile(ann().theme("dark")));
  assert!(p.write_profile(ProfileRecord::new().role("admin")));

  let fresh = ConsentProvider::new(&jar);
  let r = fresh.profile().unwrap();
  assert_eq!(r.role.as_deref(), Some("admin"));
  assert_eq!(r.display_name, None);
  assert_eq!(r.theme, None);
  assert_eq!(p.profile(), Some(r));
}

#[test]
fn write_requires_consent() {
  let jar = jar();
  let mut p = ConsentProvider::new(&jar);
  assert!(!p.write_profile(ann()));
  assert!(p.profile().is_none());
  assert!(jar.is_empty());
}

#[test]
fn updates_merge() {
  let jar = jar();
  let mut p = ConsentProvider::new(&jar);
  p.accept_all();

  assert!(p.update_profile(&ProfileRecord::new().theme("dark")));
  assert!(p.update_profile(&ProfileRecord::new().language("fr")));

  let r = p.profile().unwrap();
  assert_eq!(r.theme.as_deref(), Some("dark"));
  assert_eq!(r.language.as_deref(), Some("fr"));
}

#[test]
fn track_action_counts() {
  let jar = jar();
  let mut p = ConsentProvider::new(&jar);
  p.accept_all();

  let mut first = Map::new();
  first.insert("track".into(), json!("intro"));
  assert!(p.track_action("play", first));
  assert!(p.track_action("play", Map::new()));
  assert!(p.track_action("pause", Map::new()));

  let fresh = ConsentProvider::new(&jar);
  let activity = &fresh.profile().unwrap().activity;
  assert_eq!(activity["play"].count, 2);
  assert_eq!(activity["play"].data.get("track"), Some(&json!("intro")));
  assert!(activity["play"].last_performed.is_some());
  assert_eq!(activity["pause"].count, 1);
}

#[test]
fn revoke_clears_profile_and_consent() {
  let jar = jar();
  let mut p = ConsentProvider::new(&jar);
  p.accept_all();
  p.update_profile(&ann());

  assert!(p.revoke());
  assert!(p.profile().is_none());
  assert!(!p.has_consent());
  assert!(p.banner_visible());

  let fresh = ConsentProvider::new(&jar);
  assert!(fresh.profile().is_none());
  assert!(!fresh.has_consent());
  assert!(!fresh.is_category_enabled(ConsentCategory::Functional));
  assert_eq!(fresh.cookie_store().get(PROFILE_COOKIE), None);
}

#[test]
fn clear_profile_keeps_consent() {
  let jar = jar();
  let mut p = ConsentProvider::new(&jar);
  p.accept_all();
  p.update_profile(&ann());

  assert!(p.clear_profile());
  assert!(p.profile().is_none());
  assert!(p.has_consent());
  assert!(ConsentProvider::new(&jar).profile().is_none());
}

#[test]
fn profile_preferences_and_settings() {
  let jar = jar();
  let mut p = ConsentProvider::new(&jar);
  p.accept_all();

  assert!(p.set_profile_preference("newsletter", json!(true)));
  assert!(p.set_profile_setting("volume", json!(3)));
  let r = p.profile().unwrap();
  assert_eq!(r.preferences.get("newsletter"), Some(&json!(true)));
  assert_eq!(r.settings.get("volume"), Some(&json!(3)));
}

// ─── Failure handling ────────────────────────────────────────────────────────

#[test]
fn blocked_cookies_fail_without_panicking() {
  let jar = jar();
  jar.set_enabled(false);
  let mut p = ConsentProvider::new(&jar);

  assert!(!p.cookies_enabled());
  assert!(!p.accept_all());
  assert!(p.last_error().unwrap().contains("unavailable"));
  assert!(!p.has_consent());
  assert!(p.banner_visible());
}

#[test]
fn success_clears_the_previous_error() {
  let jar = jar();
  let mut p = ConsentProvider::new(&jar);
  assert!(!p.update_profile(&ann()));
  assert!(p.last_error().is_some());

  p.accept_all();
  assert_eq!(p.last_error(), None);

  p.update_profile(&ProfileRecord::new());
  p.clear_error();
  assert_eq!(p.last_error(), None);
}

#[test]
fn corrupt_profile_cookie_is_no_data() {
  let jar = jar();
  jar.set_cookie("user_details=%%%garbage; Path=/");
  let p = ConsentProvider::new(&jar);
  assert!(p.profile().is_none());
}

#[test]
fn null_nested_maps_keep_the_profile() {
  let jar = jar();
  let mut p = ConsentProvider::new(&jar);
  p.accept_all();
  let token = crate::codec::obfuscate(&json!({ "displayName": "Ann", "settings": null })).unwrap();
  p.cookie_store().put(PROFILE_COOKIE, &token).unwrap();

  let mut fresh = ConsentProvider::new(&jar);
  assert_eq!(
    fresh.profile().and_then(|r| r.display_name.as_deref()),
    Some("Ann")
  );
  assert!(fresh.set_profile_setting("volume", json!(3)));
  let r = ConsentProvider::new(&jar).profile().cloned().unwrap();
  assert_eq!(r.display_name.as_deref(), Some("Ann"));
  assert_eq!(r.settings.get("volume"), Some(&json!(3)));
}

#[test]
fn cookies_on_a_sibling_path_do_not_fail_the_choice() {
  let jar = MemoryJar::new(Location::https("example.com").with_path("/application"));
  let attrs = CookieAttributes {
    path: Some("/app".into()),
    ..CookieAttributes::default()
  };
  let mut p = ConsentProvider::with_attributes(&jar, attrs);

  assert!(p.accept_all());
  assert_eq!(p.last_error(), None);
  assert!(p.has_consent());
  let names: Vec<_> = jar.cookies().into_iter().map(|c| c.name).collect();
  assert!(names.contains(&CONSENT_COOKIE.to_owned()));
  assert!(names.contains(&PREFERENCES_COOKIE.to_owned()));
}

#[test]
fn oversized_profile_is_reported() {
  let jar = jar();
  let mut p = ConsentProvider::new(&jar);
  p.accept_all();
  p.update_profile(&ann());

  let mut huge = ProfileRecord::new();
  huge.set_field("blob", json!("x".repeat(8192))).unwrap();
  assert!(!p.update_profile(&huge));
  assert!(p.last_error().is_some());
  // The cache was re-read from the jar and still holds the earlier profile.
  assert_eq!(p.profile().unwrap().display_name.as_deref(), Some("Ann"));
}

// ─── Cache behaviour ─────────────────────────────────────────────────────────

#[test]
fn other_providers_see_changes_only_after_reload() {
  let jar = jar();
  let mut first = ConsentProvider::new(&jar);
  let mut second = ConsentProvider::new(&jar);

  first.accept_all();
  assert!(!second.has_consent());

  second.reload();
  assert!(second.has_consent());
  assert!(second.can_store_data());
}

#[test]
fn toggles_render_before_a_choice() {
  let jar = jar();
  let p = ConsentProvider::new(&jar);
  assert!(p.is_category_enabled(ConsentCategory::Necessary));
  assert!(!p.is_category_enabled(ConsentCategory::Analytics));
  assert_eq!(p.state(), ConsentState::NoChoice);
}

#[test]
fn cookie_names_on_the_wire() {
  let jar = jar();
  let mut p = ConsentProvider::new(&jar);
  p.accept_all();
  p.update_profile(&ann());

  let all = p.cookie_store().enumerate();
  assert_eq!(all[CONSENT_COOKIE], "true");
  assert!(all[PREFERENCES_COOKIE].starts_with('{'));
  assert!(!all[PROFILE_COOKIE].contains("Ann"));
  assert_eq!(all.len(), 3);
}
