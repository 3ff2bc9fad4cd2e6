//! Converters for values crossing the storage boundary.
//!
//! Older exports of the ledger schema persisted boolean columns as the
//! three-character strings `'YES'` / `'NO'`. Inputs may still carry that
//! encoding, so the service boundary accepts either form and hands a plain
//! `bool` to everything behind it.

use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A boolean that also accepts the legacy `'YES'`/`'NO'` string encoding.
///
/// Serializes as a plain `bool`; deserializes from `true`/`false` or from the
/// legacy strings (case-insensitive, surrounding whitespace ignored).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LegacyFlag(pub bool);

impl LegacyFlag {
    pub fn as_bool(self) -> bool {
        self.0
    }

    /// Parses the legacy string encoding.
    pub fn parse_legacy(text: &str) -> Result<Self, String> {
        match text.trim().to_ascii_uppercase().as_str() {
            "YES" => Ok(LegacyFlag(true)),
            "NO" => Ok(LegacyFlag(false)),
            other => Err(format!("expected 'YES' or 'NO', got '{other}'")),
        }
    }
}

impl From<bool> for LegacyFlag {
    fn from(value: bool) -> Self {
        LegacyFlag(value)
    }
}

impl From<LegacyFlag> for bool {
    fn from(flag: LegacyFlag) -> Self {
        flag.0
    }
}

impl fmt::Display for LegacyFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.0 { "YES" } else { "NO" })
    }
}

impl<'de> Deserialize<'de> for LegacyFlag {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Native(bool),
            Legacy(String),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Native(value) => Ok(LegacyFlag(value)),
            Repr::Legacy(text) => LegacyFlag::parse_legacy(&text).map_err(de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_legacy_strings() {
        assert_eq!(LegacyFlag::parse_legacy("YES"), Ok(LegacyFlag(true)));
        assert_eq!(LegacyFlag::parse_legacy("no"), Ok(LegacyFlag(false)));
        assert_eq!(LegacyFlag::parse_legacy(" Yes "), Ok(LegacyFlag(true)));
        assert!(LegacyFlag::parse_legacy("MAYBE").is_err());
        assert!(LegacyFlag::parse_legacy("").is_err());
    }

    #[test]
    fn test_deserialize_native_and_legacy() {
        let native: LegacyFlag = serde_json::from_str("true").unwrap();
        let legacy: LegacyFlag = serde_json::from_str("\"YES\"").unwrap();
        assert_eq!(native, legacy);
        assert!(native.as_bool());

        let native: LegacyFlag = serde_json::from_str("false").unwrap();
        let legacy: LegacyFlag = serde_json::from_str("\"NO\"").unwrap();
        assert_eq!(native, legacy);
        assert!(!native.as_bool());
    }

    #[test]
    fn test_deserialize_rejects_unknown_text() {
        let result: Result<LegacyFlag, _> = serde_json::from_str("\"TRUE\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_serializes_as_plain_bool() {
        assert_eq!(serde_json::to_string(&LegacyFlag(true)).unwrap(), "true");
        assert_eq!(serde_json::to_string(&LegacyFlag(false)).unwrap(), "false");
    }

    #[test]
    fn test_display_uses_legacy_encoding() {
        assert_eq!(LegacyFlag(true).to_string(), "YES");
        assert_eq!(LegacyFlag(false).to_string(), "NO");
    }
}
