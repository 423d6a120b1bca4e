use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::encoding::{Decoder, Encoder};
use crate::error::Result;

/// A (document, structural path) pair addressing one text-bearing leaf.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentLocation {
    pub doc_id: u32,
    pub path: Vec<u32>,
}

/// Dense registry of every indexed location.
///
/// Location ids are allocated in insertion order and never reused; this
/// table is the only way to resolve a trie match back to a document and a
/// place within it.
#[derive(Clone, Debug, Default)]
pub struct LocationTable {
    locations: HashMap<u32, DocumentLocation>,
}

impl LocationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a location and return its id.
    pub fn add(&mut self, doc_id: u32, path: Vec<u32>) -> u32 {
        let id = self.locations.len() as u32;
        self.locations.insert(id, DocumentLocation { doc_id, path });
        id
    }

    pub fn get(&self, id: u32) -> Option<&DocumentLocation> {
        self.locations.get(&id)
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn store(&self, enc: &mut Encoder) {
        enc.write_vlq(self.locations.len() as u32);

        let mut ids: Vec<u32> = self.locations.keys().copied().collect();
        ids.sort_unstable();

        for id in ids {
            let location = &self.locations[&id];
            enc.write_vlq(id);
            enc.write_vlq(location.doc_id);
            enc.write_vlq_seq(&location.path);
        }
    }

    pub fn load(dec: &mut Decoder) -> Result<Self> {
        let mut table = Self::new();

        let mut count = dec.read_vlq()?;
        while count > 0 {
            let id = dec.read_vlq()?;
            let doc_id = dec.read_vlq()?;
            let path = dec.read_vlq_seq()?;
            table.locations.insert(id, DocumentLocation { doc_id, path });
            count -= 1;
        }

        tracing::debug!(locations = table.locations.len(), "loaded location table");
        Ok(table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_dense() {
        let mut table = LocationTable::new();
        assert_eq!(table.add(1, vec![0]), 0);
        assert_eq!(table.add(1, vec![1, 0]), 1);
        assert_eq!(table.add(2, vec![0]), 2);
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_lookup() {
        let mut table = LocationTable::new();
        let id = table.add(9, vec![2, 0, 1]);

        let location = table.get(id).unwrap();
        assert_eq!(location.doc_id, 9);
        assert_eq!(location.path, vec![2, 0, 1]);

        assert!(table.get(id + 1).is_none());
    }

    #[test]
    fn test_store_load_roundtrip() {
        let mut table = LocationTable::new();
        table.add(1, vec![0]);
        table.add(1, vec![0, 3]);
        table.add(4, vec![7, 0, 2]);

        let mut enc = Encoder::new();
        table.store(&mut enc);

        let data = enc.finish();
        let mut dec = Decoder::new(&data);
        let loaded = LocationTable::load(&mut dec).unwrap();

        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded.get(0), table.get(0));
        assert_eq!(loaded.get(1), table.get(1));
        assert_eq!(loaded.get(2), table.get(2));
    }
}
