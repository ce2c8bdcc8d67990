use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeSet, HashMap};
use tokio::sync::RwLock;
use uuid::Uuid;
use crate::models::{LunchDetails, LunchSchedule, NewUser, Reference, ReferenceKind, SocialRelation, User};
use crate::services::store::{Store, StoreError};

#[derive(Debug, Clone)]
struct UserRecord {
    user: User,
    area_ids: Vec<Uuid>,
    hobby_ids: Vec<Uuid>,
    language_ids: Vec<Uuid>,
}

impl UserRecord {
    fn reference_ids_mut(&mut self, kind: ReferenceKind) -> &mut Vec<Uuid> {
        match kind {
            ReferenceKind::Area => &mut self.area_ids,
            ReferenceKind::Hobby => &mut self.hobby_ids,
            ReferenceKind::Language => &mut self.language_ids,
        }
    }

    fn relation_mut(&mut self, relation: SocialRelation) -> &mut BTreeSet<Uuid> {
        match relation {
            SocialRelation::Buddies => &mut self.user.buddies,
            SocialRelation::Blacklist => &mut self.user.blacklist,
            SocialRelation::Likes => &mut self.user.likes,
        }
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    users: HashMap<Uuid, UserRecord>,
    usernames: HashMap<String, Uuid>,
    references: HashMap<Uuid, Reference>,
    reference_keys: HashMap<(ReferenceKind, String), Uuid>,
    lunches: HashMap<Uuid, LunchSchedule>,
}

impl MemoryState {
    fn record(&self, id: Uuid) -> Result<&UserRecord, StoreError> {
        self.users
            .get(&id)
            .ok_or_else(|| StoreError::NotFound(format!("user {}", id)))
    }

    fn record_mut(&mut self, id: Uuid) -> Result<&mut UserRecord, StoreError> {
        self.users
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("user {}", id)))
    }

    fn hydrate(&self, record: &UserRecord) -> User {
        let resolve = |ids: &[Uuid]| -> Vec<Reference> {
            ids.iter().filter_map(|id| self.references.get(id).cloned()).collect()
        };

        let mut user = record.user.clone();
        user.areas = resolve(&record.area_ids);
        user.hobbies = resolve(&record.hobby_ids);
        user.languages = resolve(&record.language_ids);
        user.lunch = self.lunches.get(&user.id).cloned();
        user
    }

    fn ensure_users_exist(&self, ids: &BTreeSet<Uuid>) -> Result<(), StoreError> {
        match ids.iter().find(|id| !self.users.contains_key(*id)) {
            Some(missing) => Err(StoreError::NotFound(format!("user {}", missing))),
            None => Ok(()),
        }
    }
}

/// In-process store backed by hash maps behind a single async lock
///
/// Used by tests and by `storage.backend = "memory"`. Holding the write lock
/// for the whole of `insert_reference` gives the same uniqueness guarantee the
/// Postgres unique index gives.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, new_user: NewUser) -> Result<User, StoreError> {
        let mut state = self.state.write().await;
        if state.usernames.contains_key(&new_user.username) {
            return Err(StoreError::Duplicate(format!("username {}", new_user.username)));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            username: new_user.username,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            bio: String::new(),
            is_setup: false,
            areas: vec![],
            hobbies: vec![],
            languages: vec![],
            lunch: None,
            buddies: BTreeSet::new(),
            blacklist: BTreeSet::new(),
            likes: BTreeSet::new(),
            created_at: now,
            updated_at: now,
        };

        state.usernames.insert(user.username.clone(), user.id);
        state.users.insert(
            user.id,
            UserRecord {
                user: user.clone(),
                area_ids: vec![],
                hobby_ids: vec![],
                language_ids: vec![],
            },
        );

        Ok(user)
    }

    async fn get_user(&self, id: Uuid) -> Result<User, StoreError> {
        let state = self.state.read().await;
        let record = state.record(id)?;
        Ok(state.hydrate(record))
    }

    async fn get_user_by_username(&self, username: &str) -> Result<User, StoreError> {
        let state = self.state.read().await;
        let id = state
            .usernames
            .get(username)
            .copied()
            .ok_or_else(|| StoreError::NotFound(format!("username {}", username)))?;
        let record = state.record(id)?;
        Ok(state.hydrate(record))
    }

    async fn usernames(&self, ids: &[Uuid]) -> Result<Vec<String>, StoreError> {
        let state = self.state.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.users.get(id).map(|r| r.user.username.clone()))
            .collect())
    }

    async fn set_bio(&self, user_id: Uuid, bio: &str) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let record = state.record_mut(user_id)?;
        record.user.bio = bio.to_string();
        record.user.updated_at = Utc::now();
        Ok(())
    }

    async fn find_reference(&self, kind: ReferenceKind, key: &str) -> Result<Option<Reference>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .reference_keys
            .get(&(kind, key.to_string()))
            .and_then(|id| state.references.get(id))
            .cloned())
    }

    async fn insert_reference(&self, kind: ReferenceKind, key: &str, name: &str) -> Result<Reference, StoreError> {
        let mut state = self.state.write().await;
        let map_key = (kind, key.to_string());
        if state.reference_keys.contains_key(&map_key) {
            return Err(StoreError::Duplicate(format!("{} {}", kind, key)));
        }

        let reference = Reference {
            id: Uuid::new_v4(),
            kind,
            name: name.to_string(),
        };
        state.reference_keys.insert(map_key, reference.id);
        state.references.insert(reference.id, reference.clone());
        Ok(reference)
    }

    async fn list_references(&self, kind: ReferenceKind) -> Result<Vec<Reference>, StoreError> {
        let state = self.state.read().await;
        let mut references: Vec<Reference> = state
            .references
            .values()
            .filter(|r| r.kind == kind)
            .cloned()
            .collect();
        references.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(references)
    }

    async fn replace_user_references(&self, user_id: Uuid, kind: ReferenceKind, reference_ids: &[Uuid]) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if let Some(missing) = reference_ids.iter().find(|id| !state.references.contains_key(*id)) {
            return Err(StoreError::NotFound(format!("{} {}", kind, missing)));
        }

        let mut deduped: Vec<Uuid> = Vec::with_capacity(reference_ids.len());
        for id in reference_ids {
            if !deduped.contains(id) {
                deduped.push(*id);
            }
        }

        let record = state.record_mut(user_id)?;
        *record.reference_ids_mut(kind) = deduped;
        record.user.updated_at = Utc::now();
        Ok(())
    }

    async fn upsert_lunch(&self, user_id: Uuid, details: &LunchDetails) -> Result<LunchSchedule, StoreError> {
        let mut state = self.state.write().await;
        state.record(user_id)?;

        let now = Utc::now();
        let id = state.lunches.get(&user_id).map(|l| l.id).unwrap_or_else(Uuid::new_v4);
        let lunch = LunchSchedule {
            id,
            user_id,
            location: details.location.clone(),
            lunch_type: details.lunch_type.clone(),
            food: details.food.clone(),
            start: details.start,
            updated_at: now,
        };
        state.lunches.insert(user_id, lunch.clone());
        Ok(lunch)
    }

    async fn append_relation(&self, user_id: Uuid, relation: SocialRelation, targets: &BTreeSet<Uuid>) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        state.ensure_users_exist(targets)?;

        let record = state.record_mut(user_id)?;
        let set = record.relation_mut(relation);
        set.extend(targets.iter().copied().filter(|t| *t != user_id));
        Ok(())
    }

    async fn remove_relation(&self, user_id: Uuid, relation: SocialRelation, targets: &BTreeSet<Uuid>) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let record = state.record_mut(user_id)?;
        let set = record.relation_mut(relation);
        set.retain(|member| !targets.contains(member));
        Ok(())
    }

    async fn replace_relation(&self, user_id: Uuid, relation: SocialRelation, targets: &BTreeSet<Uuid>) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        state.ensure_users_exist(targets)?;

        let record = state.record_mut(user_id)?;
        *record.relation_mut(relation) = targets.iter().copied().filter(|t| *t != user_id).collect();
        Ok(())
    }

    async fn candidate_users(&self, exclude: &BTreeSet<Uuid>) -> Result<Vec<User>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .filter(|record| !exclude.contains(&record.user.id))
            .map(|record| state.hydrate(record))
            .collect())
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        Ok(true)
    }
}
