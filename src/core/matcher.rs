use rand::seq::SliceRandom;
use rand::Rng;
use uuid::Uuid;
use crate::core::filters::{is_excluded, lunch_compatible, shares_every_category};
use crate::core::schedule::ScheduleResolver;
use crate::models::User;

/// Default upper bound on suggestions per request
pub const DEFAULT_MAX_SUGGESTIONS: usize = 5;

/// Result of the matching process
#[derive(Debug)]
pub struct MatchResult {
    pub suggestions: Vec<User>,
    pub total_candidates: usize,
    pub qualifying: usize,
}

impl MatchResult {
    pub fn suggestion_ids(&self) -> Vec<Uuid> {
        self.suggestions.iter().map(|u| u.id).collect()
    }
}

/// Lunch buddy matching pipeline
///
/// # Pipeline Stages
/// 1. Social exclusions (self, buddies, blacklist, likes)
/// 2. Category overlap (area AND hobby AND language)
/// 3. Lunch window overlap
/// 4. Uniform random sample of at most `max_suggestions`
#[derive(Clone)]
pub struct Matcher {
    resolver: ScheduleResolver,
    max_suggestions: usize,
}

impl Matcher {
    pub fn new(resolver: ScheduleResolver, max_suggestions: usize) -> Self {
        Self {
            resolver,
            max_suggestions,
        }
    }

    pub fn max_suggestions(&self) -> usize {
        self.max_suggestions
    }

    /// Whether `candidate` may be suggested to `user`
    pub fn qualifies(&self, user: &User, candidate: &User) -> bool {
        candidate.id != user.id
            && !is_excluded(candidate, &user.exclusions())
            && shares_every_category(user, candidate)
            && lunch_compatible(user, candidate, &self.resolver)
    }

    /// Find lunch buddies for a user
    ///
    /// Pure over its inputs: the only source of variation between calls is `rng`.
    ///
    /// # Arguments
    /// * `user` - The requesting user with associations loaded
    /// * `candidates` - Potential candidates from the store
    /// * `rng` - Random source used for sampling
    pub fn find_matches<R: Rng + ?Sized>(
        &self,
        user: &User,
        candidates: Vec<User>,
        rng: &mut R,
    ) -> MatchResult {
        let total_candidates = candidates.len();
        let exclusions = user.exclusions();

        let qualifying: Vec<User> = candidates
            .into_iter()
            // Stage 1: Social exclusions
            .filter(|candidate| !is_excluded(candidate, &exclusions))
            // Stage 2: Category overlap
            .filter(|candidate| shares_every_category(user, candidate))
            // Stage 3: Lunch time
            .filter(|candidate| lunch_compatible(user, candidate, &self.resolver))
            .collect();

        let qualifying_count = qualifying.len();

        // Stage 4: Sample
        let suggestions = sample(qualifying, self.max_suggestions, rng);

        MatchResult {
            suggestions,
            total_candidates,
            qualifying: qualifying_count,
        }
    }

    /// Uniform random users with no constraints applied
    pub fn random<R: Rng + ?Sized>(&self, pool: Vec<User>, count: usize, rng: &mut R) -> Vec<User> {
        sample(pool, count, rng)
    }
}

/// Draw `min(count, pool.len())` items uniformly without replacement
///
/// Order of the result is unspecified.
pub fn sample<T, R: Rng + ?Sized>(mut pool: Vec<T>, count: usize, rng: &mut R) -> Vec<T> {
    let amount = count.min(pool.len());
    pool.shuffle(rng);
    pool.truncate(amount);
    pool
}
