//! Bead identifiers.
//!
//! Data sources hand us ids as JSON numbers or strings, and JSON object keys
//! are always strings. A [`BeadId`] compares by value across both spellings:
//! the key `"7"` and the list entry `7` name the same bead.
//!
//! Ordering is total and stable: numeric ids sort numerically and come before
//! all textual ids, which sort lexicographically. Every tie-break in the
//! engine ("smallest id wins") uses this ordering.

use std::fmt;

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Opaque, ordered bead identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BeadId {
    Num(u64),
    Text(String),
}

impl BeadId {
    /// Canonicalize a textual id.
    ///
    /// A run of ASCII digits with no leading zero (or exactly `"0"`) that
    /// fits in `u64` becomes [`BeadId::Num`]; anything else stays textual.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let canonical_digits = !raw.is_empty()
            && raw.bytes().all(|b| b.is_ascii_digit())
            && (raw.len() == 1 || !raw.starts_with('0'));
        if canonical_digits {
            if let Ok(n) = raw.parse::<u64>() {
                return Self::Num(n);
            }
        }
        Self::Text(raw.to_string())
    }

    /// Bytes fed into content hashes. Tagged so `7` and `"x7"` never collide.
    pub(crate) fn hash_into(&self, hasher: &mut blake3::Hasher) {
        match self {
            Self::Num(n) => {
                hasher.update(b"n");
                hasher.update(&n.to_le_bytes());
            }
            Self::Text(s) => {
                hasher.update(b"s");
                hasher.update(s.as_bytes());
                hasher.update(b"\x00");
            }
        }
    }
}

impl From<u64> for BeadId {
    fn from(n: u64) -> Self {
        Self::Num(n)
    }
}

impl From<&str> for BeadId {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl fmt::Display for BeadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Num(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl Serialize for BeadId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Num(n) => serializer.serialize_u64(*n),
            Self::Text(s) => serializer.serialize_str(s),
        }
    }
}

struct BeadIdVisitor;

impl Visitor<'_> for BeadIdVisitor {
    type Value = BeadId;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a non-negative integer or a string bead id")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<BeadId, E> {
        Ok(BeadId::Num(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<BeadId, E> {
        u64::try_from(v)
            .map(BeadId::Num)
            .map_err(|_| E::custom(format!("negative bead id {v}")))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<BeadId, E> {
        Ok(BeadId::parse(v))
    }
}

impl<'de> Deserialize<'de> for BeadId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(BeadIdVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digit_strings_canonicalize_to_numbers() {
        assert_eq!(BeadId::parse("7"), BeadId::Num(7));
        assert_eq!(BeadId::parse("0"), BeadId::Num(0));
        assert_eq!(BeadId::from("42"), BeadId::from(42));
    }

    #[test]
    fn non_canonical_strings_stay_textual() {
        assert_eq!(BeadId::parse("007"), BeadId::Text("007".to_string()));
        assert_eq!(BeadId::parse("-3"), BeadId::Text("-3".to_string()));
        assert_eq!(BeadId::parse(""), BeadId::Text(String::new()));
        assert_eq!(BeadId::parse("abc"), BeadId::Text("abc".to_string()));
        // Overflows u64.
        assert!(matches!(
            BeadId::parse("99999999999999999999999"),
            BeadId::Text(_)
        ));
    }

    #[test]
    fn numbers_order_numerically_and_before_text() {
        let mut ids = vec![
            BeadId::from("b"),
            BeadId::from(10),
            BeadId::from("a"),
            BeadId::from(2),
        ];
        ids.sort();
        assert_eq!(
            ids,
            vec![
                BeadId::from(2),
                BeadId::from(10),
                BeadId::from("a"),
                BeadId::from("b"),
            ]
        );
    }

    #[test]
    fn serde_accepts_numbers_and_strings() {
        let ids: Vec<BeadId> =
            serde_json::from_str(r#"[3, "3", "0xbeef"]"#).expect("valid ids");
        assert_eq!(ids[0], ids[1]);
        assert_eq!(ids[2], BeadId::Text("0xbeef".to_string()));

        let out = serde_json::to_string(&ids).expect("serialize");
        assert_eq!(out, r#"[3,3,"0xbeef"]"#);
    }

    #[test]
    fn serde_rejects_negative_ids() {
        let err = serde_json::from_str::<BeadId>("-1");
        assert!(err.is_err());
    }
}
