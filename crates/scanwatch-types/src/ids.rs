//! Identifier types for scan entities.
//!
//! Species ids are small integers and serialize as plain numbers. Encounter
//! ids are 64-bit values that exceed the safe integer range of several
//! consumers (JavaScript, `SQLite`), so they serialize as base64 of their
//! decimal text. The encoding is lossless and round-trips exactly.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use ts_rs::TS;

/// Errors produced when decoding an identifier from its textual form.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum IdError {
    /// The text is not valid base64.
    #[error("encounter id is not valid base64: {0}")]
    Base64(String),

    /// The decoded bytes are not a decimal `u64`.
    #[error("encounter id does not decode to a decimal integer: {0}")]
    NotDecimal(String),
}

/// Identifier of a creature species (the `pokemon_id` of the game API).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
)]
#[serde(transparent)]
#[ts(export, export_to = "bindings/")]
pub struct SpeciesId(pub u32);

impl SpeciesId {
    /// Return the inner numeric value.
    pub const fn into_inner(self) -> u32 {
        self.0
    }
}

impl core::fmt::Display for SpeciesId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for SpeciesId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

/// Identifier of a single creature encounter.
///
/// Displays and serializes in its encoded form (see [`EncounterId::encode`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EncounterId(pub u64);

impl EncounterId {
    /// Encode as base64 of the decimal representation.
    pub fn encode(self) -> String {
        BASE64.encode(self.0.to_string())
    }

    /// Decode the output of [`EncounterId::encode`].
    ///
    /// # Errors
    ///
    /// Returns [`IdError`] if the text is not base64 or does not decode to a
    /// decimal `u64`.
    pub fn decode(encoded: &str) -> Result<Self, IdError> {
        let bytes = BASE64
            .decode(encoded.as_bytes())
            .map_err(|e| IdError::Base64(e.to_string()))?;
        let text = String::from_utf8(bytes).map_err(|e| IdError::NotDecimal(e.to_string()))?;
        text.parse::<u64>()
            .map(Self)
            .map_err(|e| IdError::NotDecimal(format!("{text}: {e}")))
    }
}

impl core::fmt::Display for EncounterId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.encode())
    }
}

impl From<u64> for EncounterId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl Serialize for EncounterId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encode())
    }
}

impl<'de> Deserialize<'de> for EncounterId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        Self::decode(&encoded).map_err(serde::de::Error::custom)
    }
}
