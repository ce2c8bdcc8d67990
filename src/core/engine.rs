use chrono_tz::Tz;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;
use crate::core::error::{with_deadline, LunchError, Result};
use crate::core::matcher::{MatchResult, Matcher, DEFAULT_MAX_SUGGESTIONS};
use crate::core::profile::{ProfileService, ProfileUpdateOutcome};
use crate::core::registry::ReferenceRegistry;
use crate::core::schedule::{Clock, ScheduleResolver, SystemClock};
use crate::core::social::SocialGraph;
use crate::models::{NewUser, ProfileUpdate, Reference, ReferenceKind, SocialRelation, User, UserView};
use crate::services::{ReferenceCache, Store};

/// Tunables for [`LunchEngine`]
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub time_zone: Tz,
    pub window_minutes: i64,
    pub max_suggestions: usize,
    pub max_random: usize,
    pub max_insert_retries: u32,
    pub step_deadline: Option<Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            time_zone: chrono_tz::Europe::Bratislava,
            window_minutes: 30,
            max_suggestions: DEFAULT_MAX_SUGGESTIONS,
            max_random: 50,
            max_insert_retries: 3,
            step_deadline: None,
        }
    }
}

/// The operations the service layer calls into
///
/// Every component gets the same storage handle at construction; the engine
/// itself keeps no state between calls.
#[derive(Clone)]
pub struct LunchEngine {
    store: Arc<dyn Store>,
    registry: ReferenceRegistry,
    profiles: ProfileService,
    social: SocialGraph,
    resolver: ScheduleResolver,
    matcher: Matcher,
    max_random: usize,
    deadline: Option<Duration>,
}

impl LunchEngine {
    pub fn new(store: Arc<dyn Store>, cache: ReferenceCache, config: EngineConfig) -> Self {
        Self::with_clock(store, cache, config, Arc::new(SystemClock))
    }

    pub fn with_clock(
        store: Arc<dyn Store>,
        cache: ReferenceCache,
        config: EngineConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let resolver = ScheduleResolver::new(config.time_zone, config.window_minutes, clock);
        let registry = ReferenceRegistry::new(store.clone(), cache, config.max_insert_retries);
        let profiles = ProfileService::new(
            store.clone(),
            registry.clone(),
            resolver.clone(),
            config.step_deadline,
        );
        let social = SocialGraph::new(store.clone(), config.step_deadline);
        let matcher = Matcher::new(resolver.clone(), config.max_suggestions);

        Self {
            store,
            registry,
            profiles,
            social,
            resolver,
            matcher,
            max_random: config.max_random,
            deadline: config.step_deadline,
        }
    }

    pub fn resolver(&self) -> &ScheduleResolver {
        &self.resolver
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    pub async fn resolve_reference(&self, kind: ReferenceKind, name: &str) -> Result<Reference> {
        with_deadline(self.deadline, self.registry.resolve(kind, name)).await
    }

    /// All entities of one kind, ordered by name
    pub async fn list_references(&self, kind: ReferenceKind) -> Result<Vec<Reference>> {
        with_deadline(self.deadline, self.registry.list(kind)).await
    }

    pub async fn create_user(&self, new_user: NewUser) -> Result<User> {
        if new_user.username.trim().is_empty() {
            return Err(LunchError::Validation("username must not be blank".to_string()));
        }

        let user = with_deadline(self.deadline, async {
            self.store.create_user(new_user).await.map_err(LunchError::from)
        })
        .await?;

        tracing::info!("Created user {} ({})", user.username, user.id);
        Ok(user)
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<User> {
        with_deadline(self.deadline, async {
            self.store.get_user(user_id).await.map_err(LunchError::from)
        })
        .await
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<User> {
        with_deadline(self.deadline, async {
            self.store
                .get_user_by_username(username)
                .await
                .map_err(LunchError::from)
        })
        .await
    }

    /// Render-ready card for a user looked up by username
    pub async fn user_card(&self, username: &str) -> Result<UserView> {
        let user = self.get_user_by_username(username).await?;
        self.render(&user).await
    }

    pub async fn apply_profile_update(&self, user_id: Uuid, update: &ProfileUpdate) -> Result<ProfileUpdateOutcome> {
        self.profiles.apply(user_id, update).await
    }

    pub async fn append_social(&self, relation: SocialRelation, user_id: Uuid, targets: &[Uuid]) -> Result<()> {
        self.social.append(relation, user_id, targets).await
    }

    pub async fn remove_social(&self, relation: SocialRelation, user_id: Uuid, targets: &[Uuid]) -> Result<()> {
        self.social.remove(relation, user_id, targets).await
    }

    pub async fn replace_social(&self, relation: SocialRelation, user_id: Uuid, target: Uuid) -> Result<()> {
        self.social.replace_single(relation, user_id, target).await
    }

    /// Up to `max_suggestions` random compatible users
    ///
    /// Only loading the requester or the candidate pool can fail; an empty
    /// result is a normal outcome.
    pub async fn suggest_buddies(&self, user_id: Uuid) -> Result<MatchResult> {
        let user = self.get_user(user_id).await?;
        let exclusions = user.exclusions();
        let candidates = self.candidates(&exclusions).await?;

        let result = {
            let mut rng = rand::thread_rng();
            self.matcher.find_matches(&user, candidates, &mut rng)
        };

        tracing::info!(
            "Suggesting {} buddies for user {} ({} qualifying of {} candidates)",
            result.suggestions.len(),
            user_id,
            result.qualifying,
            result.total_candidates
        );

        Ok(result)
    }

    /// Random user ids with no constraints applied
    pub async fn random_users(&self, count: usize) -> Result<Vec<Uuid>> {
        let users = self.random_pool(count.min(self.max_random)).await?;
        Ok(users.into_iter().map(|u| u.id).collect())
    }

    /// Random users rendered as cards, at most `max_suggestions` of them
    pub async fn random_users_with_profiles(&self, count: usize) -> Result<Vec<UserView>> {
        let users = self.random_pool(count.min(self.matcher.max_suggestions())).await?;

        let mut views = Vec::with_capacity(users.len());
        for user in &users {
            views.push(self.render(user).await?);
        }
        Ok(views)
    }

    pub async fn health_check(&self) -> Result<bool> {
        with_deadline(self.deadline, async {
            self.store.health_check().await.map_err(LunchError::from)
        })
        .await
    }

    async fn candidates(&self, exclude: &BTreeSet<Uuid>) -> Result<Vec<User>> {
        with_deadline(self.deadline, async {
            self.store.candidate_users(exclude).await.map_err(LunchError::from)
        })
        .await
    }

    async fn random_pool(&self, count: usize) -> Result<Vec<User>> {
        let pool = self.candidates(&BTreeSet::new()).await?;
        let mut rng = rand::thread_rng();
        Ok(self.matcher.random(pool, count, &mut rng))
    }

    async fn render(&self, user: &User) -> Result<UserView> {
        let buddies = self.usernames(&user.buddies).await?;
        let blacklist = self.usernames(&user.blacklist).await?;
        let likes = self.usernames(&user.likes).await?;

        let names = |references: &[Reference]| -> Vec<String> {
            references.iter().map(|r| r.name.clone()).collect()
        };

        let lunch = user.lunch.as_ref();
        let window = lunch.map(|l| self.resolver.window_from(l.start));

        Ok(UserView {
            id: user.id,
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            bio: user.bio.clone(),
            is_setup: user.is_setup,
            hobbies: names(&user.hobbies),
            languages: names(&user.languages),
            areas: names(&user.areas),
            lunch_start: window.as_ref().map(|w| self.resolver.format_hhmm(w.start)),
            lunch_end: window.as_ref().map(|w| self.resolver.format_hhmm(w.end)),
            lunch_type: lunch.map(|l| l.lunch_type.clone()),
            lunch_food: lunch.map(|l| l.food.clone()),
            lunch_location: lunch.map(|l| l.location.clone()),
            buddies,
            blacklist,
            likes,
        })
    }

    async fn usernames(&self, ids: &BTreeSet<Uuid>) -> Result<Vec<String>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = ids.iter().copied().collect();
        with_deadline(self.deadline, async {
            self.store.usernames(&ids).await.map_err(LunchError::from)
        })
        .await
    }
}
