//! Read-through cache for the unfiltered contact listing.
//!
//! Entries are keyed by normalised [`Pagination`] and expire after a fixed
//! TTL. The repository clears the whole cache after every successful write,
//! so a cached page is never older than the last write made through the
//! same repository.
//!
//! Every [`ListCache::clear`] bumps a generation counter. A reader takes
//! [`ListCache::generation`] before loading a page and hands it back to
//! [`ListCache::insert`], which drops the page if a clear happened in
//! between.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};

use crate::models::ContactPage;
use crate::query::Pagination;

struct CacheEntry {
    page: ContactPage,
    inserted_at: Instant,
}

/// Thread-safe TTL cache of listing pages.
pub struct ListCache {
    entries: RwLock<HashMap<Pagination, CacheEntry>>,
    generation: AtomicU64,
    ttl: Duration,
}

impl ListCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            generation: AtomicU64::new(0),
            ttl,
        }
    }

    /// Return a cached page if present and not expired.
    pub fn get(&self, key: &Pagination) -> Option<ContactPage> {
        let entries = self.entries.read().ok()?;
        entries
            .get(key)
            .filter(|entry| entry.inserted_at.elapsed() < self.ttl)
            .map(|entry| entry.page.clone())
    }

    /// Current generation; take it before loading the page to insert.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Store `page` unless the cache was cleared since `generation` was read.
    /// Returns whether the page was kept.
    pub fn insert(&self, key: Pagination, page: ContactPage, generation: u64) -> bool {
        let Ok(mut entries) = self.entries.write() else {
            return false;
        };
        if self.generation() != generation {
            return false;
        }
        entries.retain(|_, entry| entry.inserted_at.elapsed() < self.ttl);
        entries.insert(
            key,
            CacheEntry {
                page,
                inserted_at: Instant::now(),
            },
        );
        true
    }

    /// Drop every entry and start a new generation.
    pub fn clear(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }

    /// Number of entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

impl std::fmt::Debug for ListCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListCache")
            .field("ttl", &self.ttl)
            .field("entries", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn page(n: u64) -> ContactPage {
        ContactPage {
            contacts: Vec::new(),
            total_pages: n,
            current_page: 1,
        }
    }

    #[test]
    fn test_insert_and_get() {
        let cache = ListCache::new(Duration::from_secs(60));
        let key = Pagination::default();
        assert!(cache.insert(key, page(3), cache.generation()));
        assert_eq!(cache.get(&key).unwrap().total_pages, 3);
        assert!(cache.get(&Pagination { page: 2, limit: 10 }).is_none());
    }

    #[test]
    fn test_entries_expire() {
        let cache = ListCache::new(Duration::from_millis(50));
        let key = Pagination::default();
        cache.insert(key, page(1), cache.generation());
        thread::sleep(Duration::from_millis(80));
        assert!(cache.get(&key).is_none());
    }

    #[test]
    fn test_clear() {
        let cache = ListCache::new(Duration::from_secs(60));
        cache.insert(Pagination::default(), page(1), cache.generation());
        cache.insert(Pagination { page: 2, limit: 5 }, page(1), cache.generation());
        assert_eq!(cache.len(), 2);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_insert_after_clear_is_dropped() {
        let cache = ListCache::new(Duration::from_secs(60));
        let key = Pagination::default();
        let before = cache.generation();
        cache.clear();
        assert!(!cache.insert(key, page(1), before));
        assert!(cache.get(&key).is_none());

        assert!(cache.insert(key, page(2), cache.generation()));
        assert_eq!(cache.get(&key).unwrap().total_pages, 2);
    }
}
