//! Tracking identifiers
//!
//! A tracking identifier is minted once per accepted submission and keys
//! both the cached artifact and the status record.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Opaque, globally unique tracking identifier (random 128-bit UUIDv4)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackingId(Uuid);

impl TrackingId {
    /// Draw a fresh identifier from the OS CSPRNG
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for TrackingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// Text that is not the canonical rendering of a tracking identifier
#[derive(Debug, Error)]
#[error("'{0}' is not a lowercase hyphenated tracking identifier")]
pub struct ParseTrackingIdError(String);

impl FromStr for TrackingId {
    type Err = ParseTrackingIdError;

    /// Accepts only the form produced by `Display`, so every identifier
    /// has exactly one textual spelling.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Uuid::parse_str(s) {
            Ok(uuid) if uuid.hyphenated().to_string() == s => Ok(Self(uuid)),
            _ => Err(ParseTrackingIdError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_textual_form_is_hyphenated_lowercase() {
        let id = TrackingId::new_random();
        let text = id.to_string();

        assert_eq!(text.len(), 36);
        assert_eq!(text.matches('-').count(), 4);
        assert_eq!(text, text.to_lowercase());
        assert_eq!(id.as_uuid().get_version_num(), 4);
    }

    #[test]
    fn test_parse_accepts_rendered_form() {
        let id = TrackingId::new_random();
        let parsed: TrackingId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("not-a-tracking-id".parse::<TrackingId>().is_err());
    }

    #[test]
    fn test_parse_rejects_alternate_spellings() {
        let id = TrackingId::new_random();
        let canonical = id.to_string();
        let simple = id.as_uuid().simple().to_string();

        let alternates = [
            canonical.to_uppercase(),
            simple,
            format!("{{{}}}", canonical),
            format!("urn:uuid:{}", canonical),
        ];

        for text in alternates {
            assert!(
                text.parse::<TrackingId>().is_err(),
                "accepted non-canonical form {}",
                text
            );
        }
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let id = TrackingId::new_random();
        let json = serde_json::to_value(id).unwrap();
        assert_eq!(json, serde_json::Value::String(id.to_string()));
    }
}
