//! Identity of the source being edited.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stable identity of a loaded source.
///
/// Two descriptors with the same identity are treated as the same content by
/// the thumbnail cache, so the identity must change whenever the bytes do.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceIdentity(String);

impl SourceIdentity {
    /// Identity derived from file metadata (name, size, modification time).
    pub fn from_metadata(name: &str, size_bytes: u64, modified: DateTime<Utc>) -> Self {
        Self(format!(
            "meta:{name}:{size_bytes}:{}",
            modified.timestamp_millis()
        ))
    }

    /// Identity derived from a content hash computed by the import subsystem.
    pub fn from_content_hash(hash: &str) -> Self {
        Self(format!("hash:{}", hash.to_ascii_lowercase()))
    }

    /// The identity as a string, suitable for logging.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SourceIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A source handed over by the import subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    /// Cache-addressing identity.
    pub identity: SourceIdentity,

    /// Locator a decode unit opens (path, object URL, ...).
    pub locator: String,
}

impl SourceDescriptor {
    pub fn new(identity: SourceIdentity, locator: impl Into<String>) -> Self {
        Self {
            identity,
            locator: locator.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_metadata_identity_is_stable() {
        let modified = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let a = SourceIdentity::from_metadata("clip.mp4", 1_024, modified);
        let b = SourceIdentity::from_metadata("clip.mp4", 1_024, modified);
        assert_eq!(a, b);

        let touched = SourceIdentity::from_metadata("clip.mp4", 1_025, modified);
        assert_ne!(a, touched);
    }

    #[test]
    fn test_hash_identity_ignores_case() {
        assert_eq!(
            SourceIdentity::from_content_hash("ABCDEF"),
            SourceIdentity::from_content_hash("abcdef")
        );
    }
}
