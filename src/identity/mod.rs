//! Site and content-type identity resolution
//!
//! Persisted relations reference compact integer identities instead of raw
//! strings. The resolvers here memoize URL → site id in the shared queue
//! store's hash (so every worker process reuses the same assignments) and
//! content-type name → id in a process-local map.
//!
//! Concurrent resolution of a brand-new URL is racy by nature: two workers
//! may both miss the cache and both try to insert. At most one insert wins;
//! the loser detects the unique-constraint conflict and retries from the
//! select step a bounded number of times before giving up with a typed
//! error: a broken store, not an infinite loop.

use crate::queue::QueueStore;
use crate::storage::{SqliteStorage, Storage, StorageError};
use crate::{Result, TrawlerError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use url::Url;

/// Queue-store hash holding the URL → site id cache
const SITE_ID_CACHE: &str = "site-ids";

/// Attempts before a conflicting insert is treated as a broken dependency
const MAX_RESOLVE_ATTEMPTS: usize = 3;

/// Resolves canonical URL strings to stable site identities
pub struct SiteResolver {
    storage: Arc<Mutex<SqliteStorage>>,
    cache: Arc<dyn QueueStore>,
}

impl SiteResolver {
    pub fn new(storage: Arc<Mutex<SqliteStorage>>, cache: Arc<dyn QueueStore>) -> Self {
        Self { storage, cache }
    }

    /// Resolves a URL to its site identity, creating the site (and its
    /// domain) on first sight
    ///
    /// Never returns 0. The fast path is a cache hit in the shared hash;
    /// misses fall through to the store and populate the cache on the way
    /// out.
    pub async fn resolve(&self, url: &Url) -> Result<i64> {
        let url_str = url.as_str();

        if let Some(cached) = self.cache.hash_get(SITE_ID_CACHE, url_str).await? {
            if let Ok(id) = cached.parse::<i64>() {
                if id > 0 {
                    return Ok(id);
                }
            }
        }

        let host = url.host_str().unwrap_or("").to_lowercase();

        let mut attempts = 0;
        let id = loop {
            attempts += 1;

            let outcome = {
                let mut storage = self.storage.lock().unwrap();
                match storage.get_site_by_url(url_str)? {
                    Some(site) => Ok(site.id),
                    None => {
                        let domain_id = storage.insert_or_get_domain(&host)?;
                        storage.insert_site(url_str, domain_id)
                    }
                }
            };

            match outcome {
                Ok(id) if id > 0 => break id,
                // Another worker inserted this URL first; re-select.
                Ok(_) | Err(StorageError::ConstraintViolation(_)) => {
                    if attempts >= MAX_RESOLVE_ATTEMPTS {
                        return Err(TrawlerError::IdentityExhausted {
                            url: url_str.to_string(),
                            attempts,
                        });
                    }
                }
                Err(e) => return Err(e.into()),
            }
        };

        self.cache
            .hash_set(SITE_ID_CACHE, url_str, &id.to_string())
            .await?;
        Ok(id)
    }
}

/// Resolves content-type names to interned identities
///
/// The cache is process-local; the handful of distinct content types makes
/// a shared cache pointless.
pub struct ContentTypeResolver {
    storage: Arc<Mutex<SqliteStorage>>,
    cache: Mutex<HashMap<String, i64>>,
}

impl ContentTypeResolver {
    pub fn new(storage: Arc<Mutex<SqliteStorage>>) -> Self {
        Self {
            storage,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Resolves a content-type name to its identity, interning it on first
    /// sight
    pub fn resolve(&self, name: &str) -> Result<i64> {
        if let Some(&id) = self.cache.lock().unwrap().get(name) {
            return Ok(id);
        }

        let id = {
            let mut storage = self.storage.lock().unwrap();
            storage.insert_or_get_content_type(name)?
        };
        self.cache.lock().unwrap().insert(name.to_string(), id);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::MemoryQueueStore;

    fn resolver() -> SiteResolver {
        let storage = Arc::new(Mutex::new(SqliteStorage::new_in_memory().unwrap()));
        SiteResolver::new(storage, Arc::new(MemoryQueueStore::new()))
    }

    #[tokio::test]
    async fn resolution_is_idempotent() {
        let resolver = resolver();
        let url = Url::parse("https://example.com/page").unwrap();

        let first = resolver.resolve(&url).await.unwrap();
        let second = resolver.resolve(&url).await.unwrap();
        assert!(first > 0);
        assert_eq!(first, second);

        // Exactly one site row exists for the URL.
        let storage = resolver.storage.lock().unwrap();
        let urls = storage.site_urls().unwrap();
        assert_eq!(urls, vec!["https://example.com/page"]);
    }

    #[tokio::test]
    async fn distinct_urls_get_distinct_identities() {
        let resolver = resolver();
        let a = resolver
            .resolve(&Url::parse("https://example.com/a").unwrap())
            .await
            .unwrap();
        let b = resolver
            .resolve(&Url::parse("https://example.com/b").unwrap())
            .await
            .unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn resolution_populates_the_shared_cache() {
        let storage = Arc::new(Mutex::new(SqliteStorage::new_in_memory().unwrap()));
        let cache: Arc<MemoryQueueStore> = Arc::new(MemoryQueueStore::new());
        let resolver = SiteResolver::new(storage, Arc::clone(&cache) as Arc<dyn QueueStore>);

        let url = Url::parse("https://example.com/cached").unwrap();
        let id = resolver.resolve(&url).await.unwrap();

        let cached = cache
            .hash_get(SITE_ID_CACHE, url.as_str())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(cached.parse::<i64>().unwrap(), id);
    }

    #[tokio::test]
    async fn concurrent_resolution_agrees_on_one_identity() {
        let storage = Arc::new(Mutex::new(SqliteStorage::new_in_memory().unwrap()));
        let cache = Arc::new(MemoryQueueStore::new());
        let resolver = Arc::new(SiteResolver::new(storage, cache as Arc<dyn QueueStore>));

        let url = Url::parse("https://example.com/contended").unwrap();
        let mut handles = Vec::new();
        for _ in 0..8 {
            let resolver = Arc::clone(&resolver);
            let url = url.clone();
            handles.push(tokio::spawn(
                async move { resolver.resolve(&url).await },
            ));
        }

        let mut ids = Vec::new();
        for h in handles {
            ids.push(h.await.unwrap().unwrap());
        }
        ids.dedup();
        assert_eq!(ids.len(), 1);
    }

    #[test]
    fn content_types_are_interned_once() {
        let storage = Arc::new(Mutex::new(SqliteStorage::new_in_memory().unwrap()));
        let resolver = ContentTypeResolver::new(storage);

        let a = resolver.resolve("text/html").unwrap();
        let b = resolver.resolve("text/html").unwrap();
        let c = resolver.resolve("image/png").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
