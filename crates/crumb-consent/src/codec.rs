//! Obfuscation codec for structured cookie values.
//!
//! `obfuscate` is JSON followed by URL-safe, unpadded base64, which keeps
//! the token free of characters a cookie value cannot hold. This hides raw
//! JSON from a casual glance at the cookie jar and nothing more: anyone can
//! reverse it, so it must never be relied on for confidentiality.

use base64::{
  Engine as _,
  engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
};
use serde::{Serialize, de::DeserializeOwned};

use crate::DecodeError;

/// Serialise `value` to JSON and wrap it in base64.
pub fn obfuscate<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
  let json = serde_json::to_vec(value)?;
  Ok(URL_SAFE_NO_PAD.encode(json))
}

/// Reverse [`obfuscate`]. Standard padded base64 is accepted as well.
///
/// Never panics; malformed input of any kind is a [`DecodeError`].
pub fn deobfuscate<T: DeserializeOwned>(token: &str) -> Result<T, DecodeError> {
  let token = token.trim();
  let bytes = URL_SAFE_NO_PAD
    .decode(token)
    .or_else(|_| STANDARD.decode(token))?;
  let json = String::from_utf8(bytes)?;
  Ok(serde_json::from_str(&json)?)
}

#[cfg(test)]
mod tests {
  use proptest::prelude::*;
  use serde_json::{Map, Number, Value, json};

  use super::*;

  #[test]
  fn token_is_cookie_safe() {
    let token = obfuscate(&json!({ "email": "ann+test@example.com", "n": [1, 2, 3] })).unwrap();
    assert!(
      token
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    );
  }

  #[test]
  fn token_is_not_plain_json() {
    let token = obfuscate(&json!({ "displayName": "Ann" })).unwrap();
    assert!(!token.contains("Ann"));
  }

  #[test]
  fn accepts_standard_base64() {
    // `{"theme":"dark"}` encoded with the standard, padded alphabet.
    let v: Value = deobfuscate("eyJ0aGVtZSI6ImRhcmsifQ==").unwrap();
    assert_eq!(v, json!({ "theme": "dark" }));
  }

  #[test]
  fn malformed_input_is_a_typed_failure() {
    assert!(matches!(
      deobfuscate::<Value>("%%%"),
      Err(DecodeError::Base64(_))
    ));
    // Valid base64 of the bytes 0xff 0xfe.
    assert!(matches!(deobfuscate::<Value>("__4"), Err(DecodeError::Utf8(_))));
    // Valid base64 of `{"a":`.
    assert!(matches!(
      deobfuscate::<Value>("eyJhIjo"),
      Err(DecodeError::Json(_))
    ));
  }

  fn json_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
      Just(Value::Null),
      any::<bool>().prop_map(Value::Bool),
      any::<i64>().prop_map(|n| Value::Number(n.into())),
      any::<f64>()
        .prop_filter_map("finite", Number::from_f64)
        .prop_map(Value::Number),
      ".*".prop_map(Value::String),
    ];
    leaf.prop_recursive(4, 64, 8, |inner| {
      prop_oneof![
        prop::collection::vec(inner.clone(), 0..8).prop_map(Value::Array),
        prop::collection::btree_map(".*", inner, 0..8)
          .prop_map(|m| Value::Object(m.into_iter().collect::<Map<_, _>>())),
      ]
    })
  }

  proptest! {
    #[test]
    fn round_trip(v in json_value()) {
      let token = obfuscate(&v).unwrap();
      let back: Value = deobfuscate(&token).unwrap();
      prop_assert_eq!(back, v);
    }
  }
}
