//! Identity memo for one deep-clone traversal.
//!
//! Maps each original composite to the clone made for it. A clone is
//! registered before its children are visited, so a reference back to an
//! ancestor resolves to the (still incomplete) clone instead of recursing.

use std::fmt;

use rustc_hash::FxHashMap;

use crate::value::{ObjectId, ObjectRef};

struct MemoEntry {
    /// Never read; held so the identity key stays valid while the memo lives
    _original: ObjectRef,
    clone: ObjectRef,
}

/// Counters for diagnostics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MemoStats {
    /// Composites cloned through this memo
    pub registered: usize,
    /// Lookups answered with an existing clone
    pub hits: usize,
}

#[derive(Default)]
pub struct Memo {
    entries: FxHashMap<ObjectId, MemoEntry>,
    stats: MemoStats,
}

impl Memo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clone registered for `original`, if any.
    pub fn get(&self, original: &ObjectRef) -> Option<&ObjectRef> {
        self.entries.get(&original.id()).map(|entry| &entry.clone)
    }

    pub fn contains(&self, original: &ObjectRef) -> bool {
        self.entries.contains_key(&original.id())
    }

    /// Lookup that counts as a hit.
    pub(crate) fn resolve(&mut self, original: &ObjectRef) -> Option<ObjectRef> {
        let clone = self.get(original).cloned()?;
        self.stats.hits += 1;
        Some(clone)
    }

    pub fn register(&mut self, original: &ObjectRef, clone: &ObjectRef) {
        let previous = self.entries.insert(
            original.id(),
            MemoEntry {
                _original: original.clone(),
                clone: clone.clone(),
            },
        );
        if previous.is_none() {
            self.stats.registered += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> MemoStats {
        self.stats
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.stats = MemoStats::default();
    }
}

impl fmt::Debug for Memo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Memo")
            .field("len", &self.entries.len())
            .field("stats", &self.stats)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Object, Value};

    fn record() -> ObjectRef {
        ObjectRef::new(Object::record())
    }

    #[test]
    fn test_register_and_get() {
        let mut memo = Memo::new();
        let original = record();
        let clone = record();
        assert!(memo.get(&original).is_none());

        memo.register(&original, &clone);
        assert!(memo.contains(&original));
        assert!(memo.get(&original).is_some_and(|found| found.ptr_eq(&clone)));
        assert!(!memo.contains(&clone));
        assert_eq!(memo.len(), 1);
    }

    #[test]
    fn test_identity_not_structure() {
        let mut memo = Memo::new();
        let a = Value::record([("x", Value::number(1.0))]);
        let b = Value::record([("x", Value::number(1.0))]);
        let (a, b) = (a.as_object().cloned().unwrap(), b.as_object().cloned().unwrap());
        memo.register(&a, &record());
        assert!(!memo.contains(&b));
    }

    #[test]
    fn test_stats() {
        let mut memo = Memo::new();
        let original = record();
        memo.register(&original, &record());
        assert!(memo.resolve(&original).is_some());
        assert!(memo.resolve(&original).is_some());
        assert!(memo.resolve(&record()).is_none());
        assert_eq!(memo.stats(), MemoStats { registered: 1, hits: 2 });

        memo.clear();
        assert!(memo.is_empty());
        assert_eq!(memo.stats(), MemoStats::default());
    }
}
