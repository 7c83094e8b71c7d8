//! Layered configuration: optional TOML file, then `CRUMB_*` environment
//! variables.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use crumb_core::{CookieAttributes, Location};
use serde::Deserialize;

/// Runtime settings for the `crumb` binary.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
  /// Where the cookie jar snapshot is kept between runs.
  pub jar_path: PathBuf,
  /// The page the simulated document is served from.
  pub location: Location,
  /// Attributes for every cookie the engine writes.
  pub cookies:  CookieAttributes,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      jar_path: PathBuf::from("crumb-jar.json"),
      location: Location::default(),
      cookies:  CookieAttributes::default(),
    }
  }
}

impl Settings {
  /// Load from `path` (if it exists) and the environment, e.g.
  /// `CRUMB_LOCATION__HOST=example.com`.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("CRUMB")
          .prefix_separator("_")
          .separator("__")
          .try_parsing(true),
      )
      .build()
      .context("failed to read configuration")?
      .try_deserialize()
      .context("failed to deserialise settings")
  }
}

#[cfg(test)]
mod tests {
  use std::fs;

  use crumb_core::SameSite;

  use super::*;

  #[test]
  fn missing_file_gives_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let s = Settings::load(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(s.jar_path, PathBuf::from("crumb-jar.json"));
    assert_eq!(s.location, Location::default());
    assert_eq!(s.cookies, CookieAttributes::default());
  }

  #[test]
  fn file_values_override_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("crumb.toml");
    fs::write(
      &path,
      r#"
jar_path = "/tmp/jar.json"

[location]
host   = "shop.example.com"
secure = true

[cookies]
expires_days = 30
same_site    = "strict"
"#,
    )
    .unwrap();

    let s = Settings::load(&path).unwrap();
    assert_eq!(s.jar_path, PathBuf::from("/tmp/jar.json"));
    assert_eq!(s.location.host, "shop.example.com");
    assert_eq!(s.location.path, "/");
    assert!(s.location.secure);
    assert_eq!(s.cookies.expires_days, Some(30));
    assert_eq!(s.cookies.same_site, SameSite::Strict);
  }
}
