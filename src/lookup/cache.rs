//! Column lookup cache

use ahash::AHashMap;
use parking_lot::RwLock;
use tracing::debug;

use crate::lookup::{ColumnLookup, ColumnMetadata, Fetch, TableRef};

/// Memoizes resolved column lists per table
///
/// Only `Ready` results are cached; loading and failed lookups are retried
/// on the next call. Shareable across threads.
pub struct CachedColumnLookup<L> {
    inner: L,
    cache: RwLock<AHashMap<TableRef, Vec<ColumnMetadata>>>,
}

impl<L: ColumnLookup> CachedColumnLookup<L> {
    pub fn new(inner: L) -> Self {
        Self {
            inner,
            cache: RwLock::new(AHashMap::with_capacity(64)),
        }
    }

    /// Forget every cached table, e.g. after a schema migration
    pub fn clear(&self) {
        self.cache.write().clear();
    }

    pub fn len(&self) -> usize {
        self.cache.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.read().is_empty()
    }
}

impl<L: ColumnLookup> ColumnLookup for CachedColumnLookup<L> {
    fn columns(&self, schema: &str, table: &str) -> Fetch<Vec<ColumnMetadata>> {
        let key = TableRef::new(schema, table);

        // Fast path: check read lock first
        {
            let cache = self.cache.read();
            if let Some(columns) = cache.get(&key) {
                return Fetch::Ready(columns.clone());
            }
        }

        let fetched = self.inner.columns(schema, table);
        if let Fetch::Ready(columns) = &fetched {
            debug!(table = %key, columns = columns.len(), "caching columns");
            self.cache.write().insert(key, columns.clone());
        }
        fetched
    }
}
