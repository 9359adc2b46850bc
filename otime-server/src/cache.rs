use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use otime_types::entry::ClassResults;

/// Per-event cache of built class results.
///
/// The cache is an explicit capability handed to the orchestration layer via
/// `AppState`, never a hidden global, so tests stay hermetic. Readers take
/// the lock shared, writers exclusive; invalidation happens after the store
/// transaction committed.
#[derive(Default)]
pub struct ResultCache {
    inner: RwLock<HashMap<i64, Arc<Vec<ClassResults>>>>,
}

impl ResultCache {
    pub fn new() -> Self {
        ResultCache::default()
    }

    pub fn get(&self, event_id: i64) -> Option<Arc<Vec<ClassResults>>> {
        self.inner.read().ok()?.get(&event_id).cloned()
    }

    pub fn insert(&self, event_id: i64, results: Arc<Vec<ClassResults>>) {
        if let Ok(mut map) = self.inner.write() {
            map.insert(event_id, results);
        }
    }

    /// Invalidate the results of one event, or everything when `event_id`
    /// is `None` (used when a mutation spans events, e.g. a competitor
    /// rename).
    pub fn clear(&self, event_id: Option<i64>) {
        if let Ok(mut map) = self.inner.write() {
            match event_id {
                Some(id) => {
                    map.remove(&id);
                }
                None => map.clear(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_removes_only_the_given_event() {
        let cache = ResultCache::new();
        cache.insert(1, Arc::new(vec![]));
        cache.insert(2, Arc::new(vec![]));

        cache.clear(Some(1));
        assert!(cache.get(1).is_none());
        assert!(cache.get(2).is_some());

        cache.clear(None);
        assert!(cache.get(2).is_none());
    }
}
