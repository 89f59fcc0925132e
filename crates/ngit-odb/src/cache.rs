//! A bounded object cache keyed by OID.
//!
//! Objects are immutable once written, so cached copies never go stale.

use std::num::NonZeroUsize;

use lru::LruCache;
use ngit_hash::ObjectId;
use ngit_object::Object;

/// LRU cache of parsed objects.
pub struct ObjectCache {
    inner: LruCache<ObjectId, Object>,
}

impl ObjectCache {
    /// Create a cache holding at most `capacity` objects.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).expect("capacity >= 1");
        Self {
            inner: LruCache::new(capacity),
        }
    }

    pub fn get(&mut self, oid: &ObjectId) -> Option<&Object> {
        self.inner.get(oid)
    }

    pub fn insert(&mut self, oid: ObjectId, obj: Object) {
        self.inner.put(oid, obj);
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
