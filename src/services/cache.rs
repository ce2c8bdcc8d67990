use std::time::Duration;
use crate::models::{Reference, ReferenceKind};

/// In-memory cache of resolved reference entities
///
/// References are never deleted by the engine, so a cached `(kind, key)`
/// entry can only go stale through out-of-band deletes; the TTL bounds that.
#[derive(Clone)]
pub struct ReferenceCache {
    l1_cache: moka::future::Cache<String, Reference>,
}

impl ReferenceCache {
    pub fn new(capacity: u64, ttl_secs: u64) -> Self {
        let l1_cache = moka::future::CacheBuilder::new(capacity)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self { l1_cache }
    }

    pub async fn get(&self, kind: ReferenceKind, key: &str) -> Option<Reference> {
        let cache_key = CacheKey::reference(kind, key);
        let hit = self.l1_cache.get(&cache_key).await;
        if hit.is_some() {
            tracing::trace!("Reference cache hit: {}", cache_key);
        }
        hit
    }

    pub async fn insert(&self, key: &str, reference: Reference) {
        let cache_key = CacheKey::reference(reference.kind, key);
        self.l1_cache.insert(cache_key, reference).await;
    }
}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    /// Build a cache key for a normalized reference name
    pub fn reference(kind: ReferenceKind, key: &str) -> String {
        format!("ref:{}:{}", kind, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_cache_key_builder() {
        assert_eq!(CacheKey::reference(ReferenceKind::Hobby, "chess"), "ref:hobby:chess");
        assert_eq!(CacheKey::reference(ReferenceKind::Area, "berlin"), "ref:area:berlin");
    }

    #[tokio::test]
    async fn test_cache_set_get() {
        let cache = ReferenceCache::new(100, 60);
        let reference = Reference {
            id: Uuid::new_v4(),
            kind: ReferenceKind::Language,
            name: "English".to_string(),
        };

        cache.insert("english", reference.clone()).await;

        assert_eq!(cache.get(ReferenceKind::Language, "english").await, Some(reference));
        assert_eq!(cache.get(ReferenceKind::Hobby, "english").await, None);
    }
}
