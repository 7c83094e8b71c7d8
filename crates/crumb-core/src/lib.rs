//! Core types for the Crumb consent engine.
//!
//! This crate is deliberately free of cookie-jar and encoding dependencies.
//! It defines the consent and profile data model and the [`CookieDocument`]
//! seam through which every other crate reaches the browser's cookie jar.

pub mod consent;
pub mod document;
pub mod error;
pub mod profile;

pub use document::{
  CookieAttributes, CookieDocument, Location, ResolvedAttributes, SameSite, domain_matches,
  path_matches,
};
pub use error::{Error, Result};
