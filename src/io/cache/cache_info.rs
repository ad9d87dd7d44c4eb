use std::io::Read;

use serde::{Deserialize, Serialize};

/// Describes which cache revision has been opened. Two loaders only ever share decoded
/// definitions when their `CacheInfo` compares equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheInfo {
    pub name: String,
    pub game: String,
    pub environment: String,
    pub revision: u32,
    pub timestamp: String,
    pub size: u64,
}

impl CacheInfo {
    pub fn from_reader<R: Read>(rdr: R) -> Result<Self, serde_json::Error> {
        serde_json::from_reader(rdr)
    }
}

#[cfg(test)]
pub(crate) fn test_cache_info(revision: u32) -> CacheInfo {
    CacheInfo {
        name: format!("test-{}", revision),
        game: "oldschool".to_string(),
        environment: "live".to_string(),
        revision,
        timestamp: "2024-01-01T00:00:00Z".to_string(),
        size: 0,
    }
}

#[cfg(test)]
mod tests {
    use crate::io::cache::cache_info::{CacheInfo, test_cache_info};

    #[test]
    fn parses_json_descriptor() -> Result<(), anyhow::Error> {
        let json = r#"{
            "name": "test-190",
            "game": "oldschool",
            "environment": "live",
            "revision": 190,
            "timestamp": "2024-01-01T00:00:00Z",
            "size": 0
        }"#;
        let info = CacheInfo::from_reader(json.as_bytes())?;
        assert_eq!(info, test_cache_info(190));
        assert_ne!(info, test_cache_info(191));
        Ok(())
    }
}
