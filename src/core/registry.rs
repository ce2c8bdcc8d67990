use std::sync::Arc;
use crate::core::error::{LunchError, Result};
use crate::models::{Reference, ReferenceKind};
use crate::services::{ReferenceCache, Store, StoreError};

/// Normalize a self-reported name into its uniqueness key
///
/// Names are compared case-insensitively after trimming and collapsing
/// inner whitespace, so "Spanish", " spanish " and "SPANISH" are one entity.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Get-or-create resolution of reference entities
///
/// The store's unique `(kind, key)` constraint is the only arbiter of
/// uniqueness: a lost insert race comes back as `Duplicate` and is resolved
/// by fetching the winner's row.
#[derive(Clone)]
pub struct ReferenceRegistry {
    store: Arc<dyn Store>,
    cache: ReferenceCache,
    max_retries: u32,
}

impl ReferenceRegistry {
    pub fn new(store: Arc<dyn Store>, cache: ReferenceCache, max_retries: u32) -> Self {
        Self {
            store,
            cache,
            max_retries: max_retries.max(1),
        }
    }

    /// Resolve a name to its entity, creating it on first use
    pub async fn resolve(&self, kind: ReferenceKind, name: &str) -> Result<Reference> {
        let key = normalize_name(name);
        if key.is_empty() {
            return Err(LunchError::Validation(format!("{} name must not be blank", kind)));
        }

        if let Some(reference) = self.cache.get(kind, &key).await {
            return Ok(reference);
        }

        let display_name = name.split_whitespace().collect::<Vec<_>>().join(" ");

        for attempt in 1..=self.max_retries {
            if let Some(existing) = self.store.find_reference(kind, &key).await? {
                self.cache.insert(&key, existing.clone()).await;
                return Ok(existing);
            }

            match self.store.insert_reference(kind, &key, &display_name).await {
                Ok(created) => {
                    tracing::debug!("Created {} '{}' ({})", kind, created.name, created.id);
                    self.cache.insert(&key, created.clone()).await;
                    return Ok(created);
                }
                Err(StoreError::Duplicate(_)) => {
                    tracing::debug!("Lost insert race for {} '{}' (attempt {}), refetching", kind, key, attempt);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(LunchError::DuplicateConflict(format!(
            "{} '{}' could not be resolved after {} attempts",
            kind, key, self.max_retries
        )))
    }

    /// Resolve every name, preserving order and dropping repeats
    ///
    /// Fails on the first name that cannot be resolved; nothing is returned
    /// for a partially resolved list.
    pub async fn resolve_all(&self, kind: ReferenceKind, names: &[String]) -> Result<Vec<Reference>> {
        let mut resolved: Vec<Reference> = Vec::with_capacity(names.len());
        for name in names {
            let reference = self.resolve(kind, name).await?;
            if !resolved.iter().any(|r| r.id == reference.id) {
                resolved.push(reference);
            }
        }
        Ok(resolved)
    }

    pub async fn list(&self, kind: ReferenceKind) -> Result<Vec<Reference>> {
        Ok(self.store.list_references(kind).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{LunchDetails, LunchSchedule, NewUser, SocialRelation, User};
    use crate::services::MemoryStore;
    use async_trait::async_trait;
    use std::collections::BTreeSet;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    fn registry() -> ReferenceRegistry {
        ReferenceRegistry::new(Arc::new(MemoryStore::new()), ReferenceCache::new(100, 60), 3)
    }

    /// Store where another writer always inserts the same key first
    ///
    /// The first lookup misses (or every lookup does with `always_miss`),
    /// then each insert lands the rival's row and reports `Duplicate`.
    struct RacingStore {
        inner: MemoryStore,
        always_miss: bool,
        finds: AtomicUsize,
        duplicates: AtomicUsize,
    }

    impl RacingStore {
        fn new(always_miss: bool) -> Self {
            Self {
                inner: MemoryStore::new(),
                always_miss,
                finds: AtomicUsize::new(0),
                duplicates: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Store for RacingStore {
        async fn create_user(&self, new_user: NewUser) -> std::result::Result<User, StoreError> {
            self.inner.create_user(new_user).await
        }

        async fn get_user(&self, id: Uuid) -> std::result::Result<User, StoreError> {
            self.inner.get_user(id).await
        }

        async fn get_user_by_username(&self, username: &str) -> std::result::Result<User, StoreError> {
            self.inner.get_user_by_username(username).await
        }

        async fn usernames(&self, ids: &[Uuid]) -> std::result::Result<Vec<String>, StoreError> {
            self.inner.usernames(ids).await
        }

        async fn set_bio(&self, user_id: Uuid, bio: &str) -> std::result::Result<(), StoreError> {
            self.inner.set_bio(user_id, bio).await
        }

        async fn find_reference(&self, kind: ReferenceKind, key: &str) -> std::result::Result<Option<Reference>, StoreError> {
            let seen = self.finds.fetch_add(1, Ordering::SeqCst);
            if self.always_miss || seen == 0 {
                return Ok(None);
            }
            self.inner.find_reference(kind, key).await
        }

        async fn insert_reference(&self, kind: ReferenceKind, key: &str, name: &str) -> std::result::Result<Reference, StoreError> {
            self.inner.insert_reference(kind, key, &name.to_uppercase()).await.ok();
            self.duplicates.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::Duplicate(key.to_string()))
        }

        async fn list_references(&self, kind: ReferenceKind) -> std::result::Result<Vec<Reference>, StoreError> {
            self.inner.list_references(kind).await
        }

        async fn replace_user_references(&self, user_id: Uuid, kind: ReferenceKind, reference_ids: &[Uuid]) -> std::result::Result<(), StoreError> {
            self.inner.replace_user_references(user_id, kind, reference_ids).await
        }

        async fn upsert_lunch(&self, user_id: Uuid, details: &LunchDetails) -> std::result::Result<LunchSchedule, StoreError> {
            self.inner.upsert_lunch(user_id, details).await
        }

        async fn append_relation(&self, user_id: Uuid, relation: SocialRelation, targets: &BTreeSet<Uuid>) -> std::result::Result<(), StoreError> {
            self.inner.append_relation(user_id, relation, targets).await
        }

        async fn remove_relation(&self, user_id: Uuid, relation: SocialRelation, targets: &BTreeSet<Uuid>) -> std::result::Result<(), StoreError> {
            self.inner.remove_relation(user_id, relation, targets).await
        }

        async fn replace_relation(&self, user_id: Uuid, relation: SocialRelation, targets: &BTreeSet<Uuid>) -> std::result::Result<(), StoreError> {
            self.inner.replace_relation(user_id, relation, targets).await
        }

        async fn candidate_users(&self, exclude: &BTreeSet<Uuid>) -> std::result::Result<Vec<User>, StoreError> {
            self.inner.candidate_users(exclude).await
        }

        async fn health_check(&self) -> std::result::Result<bool, StoreError> {
            self.inner.health_check().await
        }
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  Spanish "), "spanish");
        assert_eq!(normalize_name("Ice   Hockey"), "ice hockey");
        assert_eq!(normalize_name("   "), "");
    }

    #[tokio::test]
    async fn test_resolve_is_idempotent() {
        let registry = registry();

        let first = registry.resolve(ReferenceKind::Hobby, "chess").await.unwrap();
        let second = registry.resolve(ReferenceKind::Hobby, "chess").await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(registry.list(ReferenceKind::Hobby).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_resolve_is_case_insensitive_and_keeps_first_spelling() {
        let registry = registry();

        let first = registry.resolve(ReferenceKind::Language, "Spanish").await.unwrap();
        let second = registry.resolve(ReferenceKind::Language, "  spanish").await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.name, "Spanish");
    }

    #[tokio::test]
    async fn test_kinds_are_separate_namespaces() {
        let registry = registry();

        let area = registry.resolve(ReferenceKind::Area, "Java").await.unwrap();
        let language = registry.resolve(ReferenceKind::Language, "Java").await.unwrap();

        assert_ne!(area.id, language.id);
    }

    #[tokio::test]
    async fn test_blank_name_rejected() {
        let registry = registry();

        let result = registry.resolve(ReferenceKind::Area, " \t ").await;
        assert!(matches!(result, Err(LunchError::Validation(_))));
    }

    #[tokio::test]
    async fn test_resolve_all_drops_repeats() {
        let registry = registry();
        let names = vec!["Chess".to_string(), "hiking".to_string(), "chess".to_string()];

        let resolved = registry.resolve_all(ReferenceKind::Hobby, &names).await.unwrap();

        let resolved_names: Vec<&str> = resolved.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(resolved_names, vec!["Chess", "hiking"]);
    }

    #[tokio::test]
    async fn test_lost_insert_race_returns_winner() {
        let store = Arc::new(RacingStore::new(false));
        let registry = ReferenceRegistry::new(store.clone(), ReferenceCache::new(100, 60), 3);

        let resolved = registry.resolve(ReferenceKind::Hobby, "chess").await.unwrap();

        let winner = store.inner.find_reference(ReferenceKind::Hobby, "chess").await.unwrap().unwrap();
        assert_eq!(resolved.id, winner.id);
        assert_eq!(resolved.name, "CHESS");
        assert_eq!(store.duplicates.load(Ordering::SeqCst), 1);
        assert_eq!(store.finds.load(Ordering::SeqCst), 2);
        assert_eq!(store.inner.list_references(ReferenceKind::Hobby).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_exhausted_retries_is_duplicate_conflict() {
        let store = Arc::new(RacingStore::new(true));
        let registry = ReferenceRegistry::new(store.clone(), ReferenceCache::new(100, 60), 3);

        let result = registry.resolve(ReferenceKind::Area, "Berlin").await;

        assert!(matches!(result, Err(LunchError::DuplicateConflict(_))));
        assert_eq!(store.duplicates.load(Ordering::SeqCst), 3);
        assert_eq!(store.finds.load(Ordering::SeqCst), 3);
    }
}
