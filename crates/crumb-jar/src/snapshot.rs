//! JSON persistence for a jar's contents.

use std::{fs, io::ErrorKind, path::Path};

use serde::{Deserialize, Serialize};

use crate::{Result, stored::StoredCookie};

/// Everything a [`MemoryJar`](crate::MemoryJar) holds, in a form that can
/// be written to disk and restored later.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JarSnapshot {
  #[serde(default)]
  pub cookies: Vec<StoredCookie>,
}

impl JarSnapshot {
  /// Read a snapshot from `path`. A missing file is an empty jar.
  pub fn load(path: impl AsRef<Path>) -> Result<Self> {
    match fs::read_to_string(path) {
      Ok(raw) => Ok(serde_json::from_str(&raw)?),
      Err(e) if e.kind() == ErrorKind::NotFound => Ok(Self::default()),
      Err(e) => Err(e.into()),
    }
  }

  pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
    let raw = serde_json::to_string_pretty(self)?;
    fs::write(path, raw)?;
    Ok(())
  }
}
