//! Consent-gated visitor storage for Crumb.
//!
//! Layers, leaves first:
//!
//! - [`cookies::CookieStore`]: get/set/delete/enumerate over a
//!   [`CookieDocument`](crumb_core::CookieDocument), with percent-encoding.
//! - [`codec`]: reversible, non-cryptographic obfuscation of JSON values.
//! - [`ledger::ConsentLedger`]: the consent flag and per-category
//!   preferences.
//! - [`profile::ProfileStore`]: the obfuscated profile document, writable
//!   only while the [`gate::CapabilityGate`] allows it.
//! - [`provider::ConsentProvider`]: the write-through façade UI code talks
//!   to. It never returns an error; failures become `false` plus
//!   [`last_error`](provider::ConsentProvider::last_error).

pub mod codec;
pub mod cookies;
pub mod error;
pub mod gate;
pub mod ledger;
pub mod profile;
pub mod provider;

pub use error::{DecodeError, Error, Result};
pub use gate::{CapabilityGate, ConsentSnapshot};
pub use ledger::ConsentLedger;
pub use profile::ProfileStore;
pub use provider::ConsentProvider;

#[cfg(test)]
mod tests;
