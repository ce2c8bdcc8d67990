// Integration tests for Lunch Buddy

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use lunch_buddy::core::{EngineConfig, FixedClock, LunchEngine, LunchError, UpdateStep};
use lunch_buddy::models::{
    LunchDetails, LunchSchedule, NewUser, ProfileUpdate, Reference, ReferenceKind, SocialRelation, User,
};
use lunch_buddy::services::{MemoryStore, ReferenceCache, Store, StoreError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

fn engine_with(store: Arc<dyn Store>, config: EngineConfig) -> LunchEngine {
    let now = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
    LunchEngine::with_clock(store, ReferenceCache::new(1000, 300), config, Arc::new(FixedClock(now)))
}

fn engine() -> LunchEngine {
    engine_with(Arc::new(MemoryStore::new()), EngineConfig::default())
}

async fn create_user(engine: &LunchEngine, username: &str) -> Uuid {
    engine
        .create_user(NewUser {
            username: username.to_string(),
            first_name: username.to_string(),
            last_name: "Tester".to_string(),
        })
        .await
        .unwrap()
        .id
}

fn strings(values: &[&str]) -> Option<Vec<String>> {
    Some(values.iter().map(|v| v.to_string()).collect())
}

fn profile(area: &str, hobby: &str, language: &str, time: &str) -> ProfileUpdate {
    ProfileUpdate {
        area_names: strings(&[area]),
        hobby_names: strings(&[hobby]),
        language_names: strings(&[language]),
        lunch_location: Some("Canteen".to_string()),
        lunch_time: Some(time.to_string()),
        lunch_type: Some("restaurant".to_string()),
        lunch_food: Some("soup".to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_resolve_same_name_twice() {
    let engine = engine();

    let first = engine.resolve_reference(ReferenceKind::Hobby, "chess").await.unwrap();
    let second = engine.resolve_reference(ReferenceKind::Hobby, "chess").await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(engine.list_references(ReferenceKind::Hobby).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_concurrent_first_resolution_creates_one_entity() {
    let engine = engine();

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let engine = engine.clone();
            tokio::spawn(async move { engine.resolve_reference(ReferenceKind::Language, "Slovak").await })
        })
        .collect();

    let mut ids = BTreeSet::new();
    for handle in handles {
        ids.insert(handle.await.unwrap().unwrap().id);
    }

    assert_eq!(ids.len(), 1);
    assert_eq!(engine.list_references(ReferenceKind::Language).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_same_kind_and_name_are_distinct_across_kinds() {
    let engine = engine();

    let area = engine.resolve_reference(ReferenceKind::Area, "Java").await.unwrap();
    let language = engine.resolve_reference(ReferenceKind::Language, "Java").await.unwrap();

    assert_ne!(area.id, language.id);
}

#[tokio::test]
async fn test_hobby_list_is_replaced() {
    let engine = engine();
    let alice = create_user(&engine, "alice").await;

    let update = ProfileUpdate { hobby_names: strings(&["chess"]), ..Default::default() };
    engine.apply_profile_update(alice, &update).await.unwrap();
    let update = ProfileUpdate { hobby_names: strings(&["chess", "hiking"]), ..Default::default() };
    let outcome = engine.apply_profile_update(alice, &update).await.unwrap();

    let mut hobbies: Vec<&str> = outcome.user.hobbies.iter().map(|h| h.name.as_str()).collect();
    hobbies.sort();
    assert_eq!(hobbies, vec!["chess", "hiking"]);
}

#[tokio::test]
async fn test_append_buddy_twice() {
    let engine = engine();
    let alice = create_user(&engine, "alice").await;
    let bob = create_user(&engine, "bob").await;

    engine.append_social(SocialRelation::Buddies, alice, &[bob]).await.unwrap();
    engine.append_social(SocialRelation::Buddies, alice, &[bob]).await.unwrap();

    let user = engine.get_user(alice).await.unwrap();
    assert_eq!(user.buddies, [bob].into_iter().collect());
}

#[tokio::test]
async fn test_remove_absent_blacklist_entry() {
    let engine = engine();
    let alice = create_user(&engine, "alice").await;
    let bob = create_user(&engine, "bob").await;

    engine.remove_social(SocialRelation::Blacklist, alice, &[bob]).await.unwrap();

    assert!(engine.get_user(alice).await.unwrap().blacklist.is_empty());
}

#[tokio::test]
async fn test_suggest_includes_overlapping_lunch() {
    let engine = engine();
    let alice = create_user(&engine, "alice").await;
    let bob = create_user(&engine, "bob").await;

    engine.apply_profile_update(alice, &profile("Berlin", "chess", "English", "12:30:00")).await.unwrap();
    engine.apply_profile_update(bob, &profile("Berlin", "chess", "English", "12:45:00")).await.unwrap();

    let result = engine.suggest_buddies(alice).await.unwrap();
    assert!(result.suggestion_ids().contains(&bob));
}

#[tokio::test]
async fn test_suggest_excludes_non_overlapping_lunch() {
    let engine = engine();
    let alice = create_user(&engine, "alice").await;
    let bob = create_user(&engine, "bob").await;

    engine.apply_profile_update(alice, &profile("Berlin", "chess", "English", "12:30:00")).await.unwrap();
    engine.apply_profile_update(bob, &profile("Berlin", "chess", "English", "13:30:00")).await.unwrap();

    let result = engine.suggest_buddies(alice).await.unwrap();
    assert!(result.suggestions.is_empty());
}

#[tokio::test]
async fn test_zero_shared_categories_excluded_both_ways() {
    let engine = engine();
    let alice = create_user(&engine, "alice").await;
    let bob = create_user(&engine, "bob").await;

    engine.apply_profile_update(alice, &profile("Berlin", "chess", "English", "12:30:00")).await.unwrap();
    engine.apply_profile_update(bob, &profile("Vienna", "hiking", "German", "12:30:00")).await.unwrap();

    assert!(engine.suggest_buddies(alice).await.unwrap().suggestions.is_empty());
    assert!(engine.suggest_buddies(bob).await.unwrap().suggestions.is_empty());
}

#[tokio::test]
async fn test_bad_lunch_time_keeps_bio() {
    let engine = engine();
    let alice = create_user(&engine, "alice").await;

    let mut update = profile("Berlin", "chess", "English", "25:99");
    update.bio = Some("Always hungry".to_string());
    let outcome = engine.apply_profile_update(alice, &update).await.unwrap();

    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].step, UpdateStep::Lunch);
    assert!(matches!(outcome.errors[0].error, LunchError::ScheduleParse(_)));
    assert_eq!(outcome.user.bio, "Always hungry");
    assert!(outcome.user.lunch.is_none());
}

#[tokio::test]
async fn test_random_users_with_profiles_render_cards() {
    let engine = engine();
    let alice = create_user(&engine, "alice").await;
    engine.apply_profile_update(alice, &profile("Berlin", "chess", "English", "12:30")).await.unwrap();

    let views = engine.random_users_with_profiles(5).await.unwrap();

    assert_eq!(views.len(), 1);
    assert_eq!(views[0].username, "alice");
    assert_eq!(views[0].areas, vec!["Berlin"]);
    assert_eq!(views[0].lunch_end.as_deref(), Some("13:00"));
}

/// Randomized graphs: social exclusions and the suggestion cap hold for any state
#[tokio::test]
async fn test_randomized_graph_properties() {
    let mut rng = StdRng::seed_from_u64(42);
    let areas = ["Berlin", "Vienna"];
    let hobbies = ["chess", "hiking", "climbing"];
    let languages = ["English", "German"];
    let times = ["12:00", "12:15", "12:30", "13:00"];

    for _round in 0..5 {
        let engine = engine();
        let mut ids = Vec::new();
        for i in 0..25 {
            let id = create_user(&engine, &format!("user{}", i)).await;
            let update = profile(
                areas[rng.gen_range(0..areas.len())],
                hobbies[rng.gen_range(0..hobbies.len())],
                languages[rng.gen_range(0..languages.len())],
                times[rng.gen_range(0..times.len())],
            );
            engine.apply_profile_update(id, &update).await.unwrap();
            ids.push(id);
        }

        for &id in &ids {
            for relation in SocialRelation::ALL {
                let targets: Vec<Uuid> = ids
                    .iter()
                    .copied()
                    .filter(|&other| other != id && rng.gen_bool(0.15))
                    .collect();
                engine.append_social(relation, id, &targets).await.unwrap();
            }
        }

        for &id in &ids {
            let user = engine.get_user(id).await.unwrap();
            let result = engine.suggest_buddies(id).await.unwrap();

            assert!(result.suggestions.len() <= 5);
            for candidate in &result.suggestions {
                assert_ne!(candidate.id, id);
                assert!(!user.blacklist.contains(&candidate.id));
                assert!(!user.buddies.contains(&candidate.id));
                assert!(!user.likes.contains(&candidate.id));
                assert!(engine.matcher().qualifies(&user, candidate));
            }
        }
    }
}

/// Store that delegates to memory but fails or stalls on chosen operations
struct FaultyStore {
    inner: MemoryStore,
    fail_kind: Option<ReferenceKind>,
    stall_bio: bool,
}

#[async_trait]
impl Store for FaultyStore {
    async fn create_user(&self, new_user: NewUser) -> Result<User, StoreError> {
        self.inner.create_user(new_user).await
    }

    async fn get_user(&self, id: Uuid) -> Result<User, StoreError> {
        self.inner.get_user(id).await
    }

    async fn get_user_by_username(&self, username: &str) -> Result<User, StoreError> {
        self.inner.get_user_by_username(username).await
    }

    async fn usernames(&self, ids: &[Uuid]) -> Result<Vec<String>, StoreError> {
        self.inner.usernames(ids).await
    }

    async fn set_bio(&self, user_id: Uuid, bio: &str) -> Result<(), StoreError> {
        if self.stall_bio {
            tokio::time::sleep(Duration::from_secs(5)).await;
        }
        self.inner.set_bio(user_id, bio).await
    }

    async fn find_reference(&self, kind: ReferenceKind, key: &str) -> Result<Option<Reference>, StoreError> {
        self.inner.find_reference(kind, key).await
    }

    async fn insert_reference(&self, kind: ReferenceKind, key: &str, name: &str) -> Result<Reference, StoreError> {
        self.inner.insert_reference(kind, key, name).await
    }

    async fn list_references(&self, kind: ReferenceKind) -> Result<Vec<Reference>, StoreError> {
        self.inner.list_references(kind).await
    }

    async fn replace_user_references(&self, user_id: Uuid, kind: ReferenceKind, reference_ids: &[Uuid]) -> Result<(), StoreError> {
        if self.fail_kind == Some(kind) {
            return Err(StoreError::Unavailable("connection reset".to_string()));
        }
        self.inner.replace_user_references(user_id, kind, reference_ids).await
    }

    async fn upsert_lunch(&self, user_id: Uuid, details: &LunchDetails) -> Result<LunchSchedule, StoreError> {
        self.inner.upsert_lunch(user_id, details).await
    }

    async fn append_relation(&self, user_id: Uuid, relation: SocialRelation, targets: &BTreeSet<Uuid>) -> Result<(), StoreError> {
        self.inner.append_relation(user_id, relation, targets).await
    }

    async fn remove_relation(&self, user_id: Uuid, relation: SocialRelation, targets: &BTreeSet<Uuid>) -> Result<(), StoreError> {
        self.inner.remove_relation(user_id, relation, targets).await
    }

    async fn replace_relation(&self, user_id: Uuid, relation: SocialRelation, targets: &BTreeSet<Uuid>) -> Result<(), StoreError> {
        self.inner.replace_relation(user_id, relation, targets).await
    }

    async fn candidate_users(&self, exclude: &BTreeSet<Uuid>) -> Result<Vec<User>, StoreError> {
        self.inner.candidate_users(exclude).await
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        Ok(false)
    }
}

#[tokio::test]
async fn test_storage_failure_is_isolated_to_its_step() {
    let store = Arc::new(FaultyStore {
        inner: MemoryStore::new(),
        fail_kind: Some(ReferenceKind::Hobby),
        stall_bio: false,
    });
    let engine = engine_with(store, EngineConfig::default());
    let alice = create_user(&engine, "alice").await;

    let mut update = profile("Berlin", "chess", "English", "12:30");
    update.bio = Some("Hello".to_string());
    let outcome = engine.apply_profile_update(alice, &update).await.unwrap();

    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].step, UpdateStep::Hobbies);
    assert!(matches!(outcome.errors[0].error, LunchError::Storage(_)));
    assert_eq!(outcome.user.bio, "Hello");
    assert_eq!(outcome.user.areas.len(), 1);
    assert_eq!(outcome.user.languages.len(), 1);
    assert!(outcome.user.hobbies.is_empty());
    assert!(outcome.user.lunch.is_some());
}

#[tokio::test]
async fn test_step_deadline_fails_only_that_step() {
    let store = Arc::new(FaultyStore {
        inner: MemoryStore::new(),
        fail_kind: None,
        stall_bio: true,
    });
    let config = EngineConfig {
        step_deadline: Some(Duration::from_millis(100)),
        ..EngineConfig::default()
    };
    let engine = engine_with(store, config);
    let alice = create_user(&engine, "alice").await;

    let update = ProfileUpdate {
        bio: Some("slow".to_string()),
        hobby_names: strings(&["chess"]),
        ..Default::default()
    };
    let outcome = engine.apply_profile_update(alice, &update).await.unwrap();

    assert!(matches!(outcome.failed(UpdateStep::Bio), Some(LunchError::Timeout(_))));
    assert_eq!(outcome.user.hobbies.len(), 1);
    assert_eq!(outcome.user.bio, "");
}

#[tokio::test]
async fn test_health_reports_store_status() {
    let store = Arc::new(FaultyStore {
        inner: MemoryStore::new(),
        fail_kind: None,
        stall_bio: false,
    });
    let engine = engine_with(store, EngineConfig::default());

    assert!(!engine.health_check().await.unwrap());
}
