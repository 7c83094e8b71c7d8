//! In-memory browser cookie jar for Crumb.
//!
//! [`MemoryJar`] implements [`crumb_core::CookieDocument`] with the rules a
//! browser applies to `document.cookie`: domain and path matching, expiry,
//! `Secure` and `SameSite=None` restrictions, size limits and per-domain
//! eviction. Refused writes are dropped silently, as in a browser. A jar can
//! be saved to and restored from a JSON [`JarSnapshot`].

mod jar;
mod snapshot;
mod stored;

pub mod error;

pub use error::{Error, Result};
pub use jar::{JarLimits, MemoryJar};
pub use snapshot::JarSnapshot;
pub use stored::StoredCookie;
