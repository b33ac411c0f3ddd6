//! Strongly-typed claim identifiers
//!
//! A `ClaimId` wraps a time-ordered (v7) UUID. Its display form is `CID-` followed by
//! the 32 uppercase hex digits of the UUID, so the string form is fixed-length, easy to
//! read out over the phone, and sorts lexicographically in issuance order.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::CoreError;

const PREFIX: &str = "CID";
const HEX_LEN: usize = 32;

/// System-issued identifier for one CID submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClaimId(Uuid);

impl ClaimId {
    /// Issues a new time-ordered identifier
    pub fn issue() -> Self {
        Self(Uuid::now_v7())
    }

    /// Creates from an existing UUID
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Returns the identifier prefix for display
    pub fn prefix() -> &'static str {
        PREFIX
    }
}

impl fmt::Display for ClaimId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = Uuid::encode_buffer();
        let hex = self.0.simple().encode_upper(&mut buf);
        write!(f, "{}-{}", PREFIX, hex)
    }
}

impl FromStr for ClaimId {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s
            .strip_prefix(PREFIX)
            .and_then(|rest| rest.strip_prefix('-'))
            .ok_or_else(|| CoreError::invalid_identifier(format!("missing CID- prefix: {s}")))?;

        if hex.len() != HEX_LEN || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(CoreError::invalid_identifier(format!("malformed claim id: {s}")));
        }

        Uuid::parse_str(hex)
            .map(Self)
            .map_err(|e| CoreError::invalid_identifier(e.to_string()))
    }
}

impl From<Uuid> for ClaimId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<ClaimId> for Uuid {
    fn from(id: ClaimId) -> Uuid {
        id.0
    }
}

impl Serialize for ClaimId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClaimId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_id_display() {
        let id = ClaimId::issue();
        let display = id.to_string();
        assert!(display.starts_with("CID-"));
        assert_eq!(display.len(), 4 + HEX_LEN);
    }

    #[test]
    fn test_id_parsing() {
        let original = ClaimId::issue();
        let parsed: ClaimId = original.to_string().parse().unwrap();
        assert_eq!(original, parsed);
    }

    #[test]
    fn test_uuid_conversion() {
        let uuid = Uuid::now_v7();
        let claim_id = ClaimId::from(uuid);
        let back: Uuid = claim_id.into();
        assert_eq!(uuid, back);
    }
}
