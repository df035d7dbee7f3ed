//! Key domains and their canonical encodings.
//!
//! A provider instance is fixed to one key domain at construction: short
//! text identifiers or unsigned 64-bit integers. The domain is an explicit
//! runtime value rather than a type parameter, so a single trait object can
//! serve either domain and decoding engine bytes back into keys needs no
//! reflection.

use std::fmt;

use crate::error::{StoreError, StoreResult};

/// A key in one of the two supported domains.
///
/// Integer keys encode as decimal ASCII text rather than fixed-width binary:
/// raw engine contents and snapshot files stay human-readable, at the cost
/// of non-constant key width and lexicographic-by-text engine ordering
/// (`1`, `10`, `2`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    /// A text identifier.
    Text(String),
    /// An unsigned 64-bit integer.
    Index(u64),
}

/// The key domain a provider instance is fixed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDomain {
    /// Text identifier keys.
    Text,
    /// Unsigned 64-bit integer keys.
    Index,
}

impl Key {
    /// Returns the domain this key belongs to.
    #[must_use]
    pub fn domain(&self) -> KeyDomain {
        match self {
            Self::Text(_) => KeyDomain::Text,
            Self::Index(_) => KeyDomain::Index,
        }
    }

    /// Canonical byte encoding: raw UTF-8 for text, decimal ASCII for
    /// integers. Used directly as the embedded engine's key bytes.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        self.encoded().into_bytes()
    }

    /// Canonical string encoding, used as the map key in snapshot files.
    #[must_use]
    pub fn encoded(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Index(n) => n.to_string(),
        }
    }
}

impl KeyDomain {
    /// Decodes a canonical string encoding back into a key of this domain.
    pub fn decode_str(self, encoded: &str) -> StoreResult<Key> {
        match self {
            Self::Text => Ok(Key::Text(encoded.to_owned())),
            Self::Index => encoded
                .parse::<u64>()
                .map(Key::Index)
                .map_err(|_| {
                    StoreError::config(format!(
                        "stored key {encoded:?} is not a valid u64 index"
                    ))
                }),
        }
    }

    /// Decodes canonical key bytes back into a key of this domain.
    pub fn decode_bytes(self, encoded: &[u8]) -> StoreResult<Key> {
        let text = std::str::from_utf8(encoded).map_err(|_| {
            StoreError::config("stored key is not valid UTF-8".to_owned())
        })?;
        self.decode_str(text)
    }

    /// Rejects keys from the other domain.
    pub fn check(self, key: &Key) -> StoreResult<()> {
        if key.domain() == self {
            Ok(())
        } else {
            Err(StoreError::KeyDomain {
                expected: self,
                found: key.domain(),
            })
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Index(n) => write!(f, "{n}"),
        }
    }
}

impl fmt::Display for KeyDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("text"),
            Self::Index => f.write_str("index"),
        }
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<u64> for Key {
    fn from(value: u64) -> Self {
        Self::Index(value)
    }
}
