use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;
use crate::core::error::{with_deadline, LunchError, Result};
use crate::core::registry::ReferenceRegistry;
use crate::core::schedule::ScheduleResolver;
use crate::models::{LunchDetails, ProfileUpdate, ReferenceKind, User};
use crate::services::Store;

/// The independent steps of a profile update, in the order they run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateStep {
    Bio,
    Areas,
    Hobbies,
    Languages,
    Lunch,
}

impl UpdateStep {
    fn for_kind(kind: ReferenceKind) -> Self {
        match kind {
            ReferenceKind::Area => UpdateStep::Areas,
            ReferenceKind::Hobby => UpdateStep::Hobbies,
            ReferenceKind::Language => UpdateStep::Languages,
        }
    }
}

impl fmt::Display for UpdateStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UpdateStep::Bio => "bio",
            UpdateStep::Areas => "areas",
            UpdateStep::Hobbies => "hobbies",
            UpdateStep::Languages => "languages",
            UpdateStep::Lunch => "lunch",
        };
        f.write_str(name)
    }
}

/// A failed step of a profile update
#[derive(Debug)]
pub struct StepError {
    pub step: UpdateStep,
    pub error: LunchError,
}

/// Outcome of a profile update: the user as stored afterwards plus every step that failed
#[derive(Debug)]
pub struct ProfileUpdateOutcome {
    pub user: User,
    pub errors: Vec<StepError>,
}

impl ProfileUpdateOutcome {
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn failed(&self, step: UpdateStep) -> Option<&LunchError> {
        self.errors.iter().find(|e| e.step == step).map(|e| &e.error)
    }
}

/// Validated lunch input: all four fields present
#[derive(Debug, Clone, PartialEq)]
struct LunchFields<'a> {
    location: &'a str,
    time: &'a str,
    lunch_type: &'a str,
    food: &'a str,
}

/// Applies profile information updates
///
/// Steps run sequentially and independently: a failing step is recorded in
/// the outcome and the remaining steps still run. Partial application is an
/// accepted result.
#[derive(Clone)]
pub struct ProfileService {
    store: Arc<dyn Store>,
    registry: ReferenceRegistry,
    resolver: ScheduleResolver,
    deadline: Option<Duration>,
}

impl ProfileService {
    pub fn new(
        store: Arc<dyn Store>,
        registry: ReferenceRegistry,
        resolver: ScheduleResolver,
        deadline: Option<Duration>,
    ) -> Self {
        Self {
            store,
            registry,
            resolver,
            deadline,
        }
    }

    /// Apply an update to an existing user
    ///
    /// Empty input (an empty bio or an empty name list) leaves the stored
    /// value as it is. Only loading the user (before any step) and reloading
    /// it (after all steps) can fail the call as a whole.
    pub async fn apply(&self, user_id: Uuid, update: &ProfileUpdate) -> Result<ProfileUpdateOutcome> {
        self.load_user(user_id).await?;

        let mut errors: Vec<StepError> = Vec::new();
        let mut record = |step: UpdateStep, result: Result<()>| {
            if let Err(error) = result {
                tracing::warn!("Profile update step '{}' failed for user {}: {}", step, user_id, error);
                errors.push(StepError { step, error });
            }
        };

        if let Some(bio) = update.bio.as_deref().filter(|b| !b.is_empty()) {
            record(UpdateStep::Bio, self.update_bio(user_id, bio).await);
        }

        let lists = [
            (ReferenceKind::Area, &update.area_names),
            (ReferenceKind::Hobby, &update.hobby_names),
            (ReferenceKind::Language, &update.language_names),
        ];
        for (kind, names) in lists {
            if let Some(names) = names.as_deref().filter(|n| !n.is_empty()) {
                record(UpdateStep::for_kind(kind), self.replace_references(user_id, kind, names).await);
            }
        }

        match lunch_fields(update) {
            Ok(Some(fields)) => record(UpdateStep::Lunch, self.update_lunch(user_id, &fields).await),
            Ok(None) => {}
            Err(e) => record(UpdateStep::Lunch, Err(e)),
        }

        let user = self.load_user(user_id).await?;

        tracing::info!(
            "Applied profile update for user {} ({} step error(s))",
            user_id,
            errors.len()
        );

        Ok(ProfileUpdateOutcome { user, errors })
    }

    async fn load_user(&self, user_id: Uuid) -> Result<User> {
        with_deadline(self.deadline, async {
            self.store.get_user(user_id).await.map_err(LunchError::from)
        })
        .await
    }

    async fn update_bio(&self, user_id: Uuid, bio: &str) -> Result<()> {
        with_deadline(self.deadline, async {
            self.store.set_bio(user_id, bio).await.map_err(LunchError::from)
        })
        .await
    }

    /// Resolve every name, then replace the user's set of this kind with the result
    ///
    /// If any name fails to resolve the stored set is left untouched.
    async fn replace_references(&self, user_id: Uuid, kind: ReferenceKind, names: &[String]) -> Result<()> {
        with_deadline(self.deadline, async {
            let references = self.registry.resolve_all(kind, names).await?;
            let ids: Vec<Uuid> = references.iter().map(|r| r.id).collect();
            self.store.replace_user_references(user_id, kind, &ids).await?;
            tracing::debug!("User {} now has {} {} reference(s)", user_id, ids.len(), kind);
            Ok(())
        })
        .await
    }

    async fn update_lunch(&self, user_id: Uuid, fields: &LunchFields<'_>) -> Result<()> {
        let window = self.resolver.resolve_today(fields.time)?;
        let details = LunchDetails {
            location: fields.location.to_string(),
            lunch_type: fields.lunch_type.to_string(),
            food: fields.food.to_string(),
            start: window.start,
        };

        with_deadline(self.deadline, async {
            self.store.upsert_lunch(user_id, &details).await.map_err(LunchError::from)
        })
        .await?;

        tracing::debug!(
            "Lunch for user {} set to {}-{}",
            user_id,
            self.resolver.format_hhmm(window.start),
            self.resolver.format_hhmm(window.end)
        );
        Ok(())
    }
}

/// Pick the lunch fields out of an update
///
/// Blank strings count as absent. Returns `None` when no lunch field was
/// supplied and a validation error when only some were.
fn lunch_fields(update: &ProfileUpdate) -> Result<Option<LunchFields<'_>>> {
    fn present(value: &Option<String>) -> Option<&str> {
        value.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }

    let location = present(&update.lunch_location);
    let time = present(&update.lunch_time);
    let lunch_type = present(&update.lunch_type);
    let food = present(&update.lunch_food);

    match (location, time, lunch_type, food) {
        (Some(location), Some(time), Some(lunch_type), Some(food)) => Ok(Some(LunchFields {
            location,
            time,
            lunch_type,
            food,
        })),
        (None, None, None, None) => Ok(None),
        _ => {
            let missing: Vec<&str> = [
                ("lunchLocation", location),
                ("lunchTime", time),
                ("lunchType", lunch_type),
                ("lunchFood", food),
            ]
            .iter()
            .filter(|(_, value)| value.is_none())
            .map(|(name, _)| *name)
            .collect();

            Err(LunchError::Validation(format!(
                "lunch fields must be supplied together, missing: {}",
                missing.join(", ")
            )))
        }
    }
}
