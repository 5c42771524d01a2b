use crate::error::LedgerError;
use std::collections::BTreeMap;

/// Pending writes of one branch; `None` marks a deletion.
type Overlay = BTreeMap<Vec<u8>, Option<Vec<u8>>>;

/// Ordered key-value store with stacked write overlays.
///
/// Reads resolve through the overlays top-down before falling back to the base map.
/// [`KvStore::commit`] folds the top overlay into the one below it (or the base),
/// [`KvStore::discard`] drops it.
#[derive(Clone, Debug, Default)]
pub struct KvStore {
    base: BTreeMap<Vec<u8>, Vec<u8>>,
    overlays: Vec<Overlay>,
}

impl KvStore {
    /// Empty store with no open overlays.
    pub fn new() -> Self {
        Self::default()
    }

    /// Value under `key` as seen through every open overlay.
    pub fn get(&self, key: &[u8]) -> Option<&[u8]> {
        for overlay in self.overlays.iter().rev() {
            if let Some(entry) = overlay.get(key) {
                return entry.as_deref();
            }
        }
        self.base.get(key).map(Vec::as_slice)
    }

    /// Whether `key` holds a live value.
    pub fn has(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }

    /// Writes into the top overlay, or the base when none is open.
    pub fn set(&mut self, key: Vec<u8>, value: Vec<u8>) {
        match self.overlays.last_mut() {
            Some(overlay) => {
                overlay.insert(key, Some(value));
            }
            None => {
                self.base.insert(key, value);
            }
        }
    }

    /// Deletes `key`; inside an overlay this records a tombstone.
    pub fn delete(&mut self, key: &[u8]) {
        match self.overlays.last_mut() {
            Some(overlay) => {
                overlay.insert(key.to_vec(), None);
            }
            None => {
                self.base.remove(key);
            }
        }
    }

    /// All live entries whose key starts with `prefix`, in key order.
    pub fn prefix_entries(&self, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)> {
        let mut merged: Overlay = self
            .base
            .range(prefix.to_vec()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.clone(), Some(value.clone())))
            .collect();
        for overlay in &self.overlays {
            for (key, value) in
                overlay.range(prefix.to_vec()..).take_while(|(key, _)| key.starts_with(prefix))
            {
                merged.insert(key.clone(), value.clone());
            }
        }
        merged.into_iter().filter_map(|(key, value)| value.map(|value| (key, value))).collect()
    }

    /// Opens a new write overlay.
    pub fn branch(&mut self) {
        self.overlays.push(Overlay::new());
    }

    /// Number of open overlays.
    pub fn depth(&self) -> usize {
        self.overlays.len()
    }

    /// Whether the top overlay holds any write.
    pub fn is_top_dirty(&self) -> bool {
        self.overlays.last().is_some_and(|overlay| !overlay.is_empty())
    }

    /// Folds the top overlay into its parent.
    pub fn commit(&mut self) -> Result<(), LedgerError> {
        let top = self.overlays.pop().ok_or(LedgerError::NoOpenBranch)?;
        for (key, value) in top {
            match (self.overlays.last_mut(), value) {
                (Some(parent), value) => {
                    parent.insert(key, value);
                }
                (None, Some(value)) => {
                    self.base.insert(key, value);
                }
                (None, None) => {
                    self.base.remove(&key);
                }
            }
        }
        Ok(())
    }

    /// Drops the top overlay.
    pub fn discard(&mut self) -> Result<(), LedgerError> {
        self.overlays.pop().map(drop).ok_or(LedgerError::NoOpenBranch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlay_reads_shadow_base() {
        let mut store = KvStore::new();
        store.set(b"a".to_vec(), b"1".to_vec());
        store.branch();
        store.set(b"a".to_vec(), b"2".to_vec());
        store.delete(b"missing");
        assert_eq!(store.get(b"a"), Some(&b"2"[..]));

        store.delete(b"a");
        assert!(!store.has(b"a"));

        store.discard().unwrap();
        assert_eq!(store.get(b"a"), Some(&b"1"[..]));
    }

    #[test]
    fn nested_commit_folds_into_parent() {
        let mut store = KvStore::new();
        store.set(b"keep".to_vec(), b"x".to_vec());
        store.branch();
        store.branch();
        store.set(b"new".to_vec(), b"y".to_vec());
        store.delete(b"keep");
        store.commit().unwrap();
        assert_eq!(store.depth(), 1);
        assert!(!store.has(b"keep"));

        store.commit().unwrap();
        assert_eq!(store.depth(), 0);
        assert_eq!(store.get(b"new"), Some(&b"y"[..]));
        assert!(!store.has(b"keep"));
    }

    #[test]
    fn commit_without_branch_fails() {
        let mut store = KvStore::new();
        assert_eq!(store.commit(), Err(LedgerError::NoOpenBranch));
        assert_eq!(store.discard(), Err(LedgerError::NoOpenBranch));
    }

    #[test]
    fn prefix_entries_merge_overlays() {
        let mut store = KvStore::new();
        store.set(b"p/1".to_vec(), b"a".to_vec());
        store.set(b"p/2".to_vec(), b"b".to_vec());
        store.set(b"q/1".to_vec(), b"c".to_vec());
        store.branch();
        store.delete(b"p/1");
        store.set(b"p/3".to_vec(), b"d".to_vec());

        let keys: Vec<_> = store.prefix_entries(b"p/").into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec![b"p/2".to_vec(), b"p/3".to_vec()]);
    }

    #[test]
    fn dirty_tracks_top_overlay_only() {
        let mut store = KvStore::new();
        assert!(!store.is_top_dirty());
        store.branch();
        store.set(b"a".to_vec(), b"1".to_vec());
        store.branch();
        assert!(!store.is_top_dirty());
        store.delete(b"a");
        assert!(store.is_top_dirty());
    }
}
