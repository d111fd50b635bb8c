//! Server capability metadata

use crate::constants::STORAGE_KEY_S3_ENDPOINT;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What a server reports about itself
///
/// Older servers only publish a flat `storage_config` map; newer ones add a
/// name, documentation and a list of storage locations. Both shapes land here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceInfo {
    pub name: Option<String>,
    pub doc: Option<String>,
    pub version: Option<String>,
    /// Storage locations the server can reach, e.g. `s3://bucket` or `file:///data`
    pub storage: Vec<String>,
    /// Backend settings keyed as `<Backend>.<Setting>`
    pub storage_config: BTreeMap<String, String>,
}

impl ServiceInfo {
    /// Whether the server has an object store backend enabled
    pub fn supports_s3(&self) -> bool {
        self.s3_endpoint().is_some() || self.storage.iter().any(|s| s.starts_with("s3://"))
    }

    /// Object store endpoint advertised by the server
    pub fn s3_endpoint(&self) -> Option<&str> {
        self.storage_config
            .get(STORAGE_KEY_S3_ENDPOINT)
            .map(String::as_str)
            .filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_config_helpers() {
        let mut info = ServiceInfo::default();
        assert!(!info.supports_s3());

        info.storage_config
            .insert("S3.Endpoint".to_string(), "http://localhost:9000".to_string());

        assert!(info.supports_s3());
        assert_eq!(info.s3_endpoint(), Some("http://localhost:9000"));
    }

    #[test]
    fn test_storage_list_enables_s3() {
        let info = ServiceInfo {
            storage: vec!["s3://tes-test".to_string()],
            ..Default::default()
        };
        assert!(info.supports_s3());
        assert_eq!(info.s3_endpoint(), None);
    }
}
