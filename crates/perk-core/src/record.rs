use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::description::RuntimeDescription;

/// One acquired runtime as the description database persists it.
///
/// Wraps the immutable upstream [`RuntimeDescription`] with the local
/// acquisition state that changes over the runtime's lifetime. The state
/// fields survive a reopen; whether the archive file itself is still
/// present is checked against the filesystem at read time instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuntimeRecord {
    pub description: RuntimeDescription,
    /// When the runtime was first recorded.
    pub added_at: DateTime<Utc>,
    /// When the stored archive last passed verification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_at: Option<DateTime<Utc>>,
    /// Where the archive was last unpacked, if it was.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unpacked_path: Option<PathBuf>,
}

impl RuntimeRecord {
    /// A fresh record for a runtime acquired now.
    pub fn new(description: RuntimeDescription) -> Self {
        Self {
            description,
            added_at: Utc::now(),
            verified_at: None,
            unpacked_path: None,
        }
    }

    pub fn id(&self) -> String {
        self.description.id()
    }
}

#[cfg(test)]
mod tests {
    use url::Url;

    use super::*;
    use crate::{
        description::{ArchiveHash, HashAlgorithm, RuntimeConfiguration},
        version::RuntimeVersion,
    };

    fn description() -> RuntimeDescription {
        RuntimeDescription {
            repository: Url::parse("https://builds.example.com/index").unwrap(),
            version: RuntimeVersion::parse("17.0.2").unwrap(),
            platform: "linux".to_string(),
            architecture: "x86_64".to_string(),
            vm: "hotspot".to_string(),
            configuration: RuntimeConfiguration::Jdk,
            archive_uri: Url::parse("https://builds.example.com/jdk.tar.gz").unwrap(),
            archive_size: 1024,
            archive_hash: ArchiveHash::new(HashAlgorithm::Sha256, "aabbcc"),
            tag: None,
        }
    }

    #[test]
    fn test_new_record_starts_unverified() {
        let record = RuntimeRecord::new(description());
        assert!(record.verified_at.is_none());
        assert!(record.unpacked_path.is_none());
        assert_eq!(record.id(), "sha-256:aabbcc");
    }

    #[test]
    fn test_optional_state_defaults_when_absent() {
        // Records written before a field existed must still parse.
        let mut record = RuntimeRecord::new(description());
        record.verified_at = Some(Utc::now());
        record.unpacked_path = Some(PathBuf::from("/tmp/jdk"));
        let mut value = serde_json::to_value(&record).unwrap();
        value.as_object_mut().unwrap().remove("verified_at");
        value.as_object_mut().unwrap().remove("unpacked_path");

        let parsed: RuntimeRecord = serde_json::from_value(value).unwrap();
        assert!(parsed.verified_at.is_none());
        assert!(parsed.unpacked_path.is_none());
        assert_eq!(parsed.added_at, record.added_at);
    }
}
