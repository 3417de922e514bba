//! Full-surface snapshots used by the history store.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

/// Prefix of the data URLs snapshots are persisted as.
pub const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Snapshot decoding errors.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Not a base64 data URL")]
    NotDataUrl,
    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// An encoded image of the whole surface at one point in time.
///
/// The bytes are opaque to everything except the surface that produced them.
/// A snapshot with no bytes is the "empty surface" sentinel: restoring it
/// yields a blank surface.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    bytes: Vec<u8>,
}

impl Snapshot {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// The "empty surface" sentinel.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Encode as a `data:image/png;base64,...` URL. The sentinel encodes as `""`.
    pub fn to_data_url(&self) -> String {
        if self.bytes.is_empty() {
            return String::new();
        }
        let mut url = String::with_capacity(PNG_DATA_URL_PREFIX.len() + self.bytes.len() * 4 / 3 + 4);
        url.push_str(PNG_DATA_URL_PREFIX);
        STANDARD.encode_string(&self.bytes, &mut url);
        url
    }

    /// Decode a base64 data URL of any media type. `""` decodes to the sentinel.
    pub fn from_data_url(url: &str) -> Result<Self, SnapshotError> {
        if url.is_empty() {
            return Ok(Self::empty());
        }
        let payload = url
            .strip_prefix("data:")
            .and_then(|rest| rest.split_once(";base64,"))
            .map(|(_, payload)| payload)
            .ok_or(SnapshotError::NotDataUrl)?;
        Ok(Self::from_bytes(STANDARD.decode(payload)?))
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

impl Serialize for Snapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_data_url())
    }
}

impl<'de> Deserialize<'de> for Snapshot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let url = String::deserialize(deserializer)?;
        Snapshot::from_data_url(&url).map_err(serde::de::Error::custom)
    }
}
