use std::collections::HashMap;
use std::io::Read;

use mapviewer_files::xtea::XteaKey;
use serde::Deserialize;

#[derive(Deserialize)]
struct XteaEntry {
    mapsquare: u32,
    key: XteaKey,
}

/// Region id -> key for the encrypted location records. Small, so every worker gets its own copy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XteaKeyTable {
    keys: HashMap<u32, XteaKey>,
}

impl XteaKeyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the common `[{"mapsquare": 12850, "key": [a, b, c, d]}, ...]` layout.
    pub fn from_json_reader<R: Read>(rdr: R) -> Result<Self, serde_json::Error> {
        let entries: Vec<XteaEntry> = serde_json::from_reader(rdr)?;
        Ok(Self {
            keys: entries
                .into_iter()
                .map(|entry| (entry.mapsquare, entry.key))
                .collect(),
        })
    }

    pub fn insert(&mut self, region_id: u32, key: XteaKey) {
        self.keys.insert(region_id, key);
    }

    pub fn get(&self, region_id: u32) -> Option<&XteaKey> {
        self.keys.get(&region_id)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use crate::io::cache::xteas::XteaKeyTable;

    #[test]
    fn parses_mapsquare_list() -> Result<(), anyhow::Error> {
        let json = r#"[
            {"mapsquare": 12850, "key": [-1, 2, -3, 4]},
            {"mapsquare": 12851, "key": [0, 0, 0, 0]}
        ]"#;
        let table = XteaKeyTable::from_json_reader(json.as_bytes())?;
        assert_eq!(table.len(), 2);
        assert_eq!(table.get(12850), Some(&[-1, 2, -3, 4]));
        assert_eq!(table.get(1), None);
        Ok(())
    }
}
