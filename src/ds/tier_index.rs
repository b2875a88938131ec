use rustc_hash::FxHashMap;

use crate::ds::ring::NodeId;

/// Per-tier key lookup: key bytes -> ring node.
///
/// Holds non-owning [`NodeId`] handles; node ownership stays with the ring.
/// Every reachable ring node has exactly one index entry and vice versa;
/// the engine maintains that pairing on every insert, delete, and migration.
#[derive(Debug, Default)]
pub struct TierIndex {
    map: FxHashMap<Box<[u8]>, NodeId>,
}

impl TierIndex {
    pub fn new() -> Self {
        Self {
            map: FxHashMap::default(),
        }
    }

    pub fn put(&mut self, key: &[u8], id: NodeId) {
        self.map.insert(key.into(), id);
    }

    pub fn find(&self, key: &[u8]) -> Option<NodeId> {
        self.map.get(key).copied()
    }

    pub fn remove(&mut self, key: &[u8]) -> Option<NodeId> {
        self.map.remove(key)
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        self.map.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = &[u8]> {
        self.map.keys().map(|key| key.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_index_put_find_remove() {
        let mut index = TierIndex::new();
        assert!(index.is_empty());

        index.put(b"a", NodeId(0));
        index.put(b"b", NodeId(1));
        assert_eq!(index.len(), 2);
        assert_eq!(index.find(b"a"), Some(NodeId(0)));
        assert_eq!(index.find(b"b"), Some(NodeId(1)));
        assert_eq!(index.find(b"c"), None);

        assert_eq!(index.remove(b"a"), Some(NodeId(0)));
        assert_eq!(index.remove(b"a"), None);
        assert!(!index.contains(b"a"));
        assert!(index.contains(b"b"));
    }

    #[test]
    fn tier_index_put_overwrites_handle() {
        let mut index = TierIndex::new();
        index.put(b"k", NodeId(3));
        index.put(b"k", NodeId(7));
        assert_eq!(index.len(), 1);
        assert_eq!(index.find(b"k"), Some(NodeId(7)));
    }
}
