use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;
use crate::core::error::{with_deadline, LunchError, Result};
use crate::models::SocialRelation;
use crate::services::Store;

/// Directed buddies / blacklist / likes relations
///
/// Edges are stored as given: appending B to A's buddies says nothing about
/// B's buddies. Callers wanting a mutual relation issue both appends.
#[derive(Clone)]
pub struct SocialGraph {
    store: Arc<dyn Store>,
    deadline: Option<Duration>,
}

impl SocialGraph {
    pub fn new(store: Arc<dyn Store>, deadline: Option<Duration>) -> Self {
        Self { store, deadline }
    }

    /// Add every target; targets already present are left as they are
    pub async fn append(&self, relation: SocialRelation, user_id: Uuid, targets: &[Uuid]) -> Result<()> {
        let targets = target_set(user_id, targets)?;
        if targets.is_empty() {
            return Ok(());
        }
        self.ensure_user(user_id).await?;

        with_deadline(self.deadline, async {
            self.store
                .append_relation(user_id, relation, &targets)
                .await
                .map_err(LunchError::from)
        })
        .await?;

        tracing::info!("Appended {} target(s) to {} of user {}", targets.len(), relation, user_id);
        Ok(())
    }

    /// Remove every target; targets not present are ignored
    pub async fn remove(&self, relation: SocialRelation, user_id: Uuid, targets: &[Uuid]) -> Result<()> {
        let targets = target_set(user_id, targets)?;
        if targets.is_empty() {
            return Ok(());
        }
        self.ensure_user(user_id).await?;

        with_deadline(self.deadline, async {
            self.store
                .remove_relation(user_id, relation, &targets)
                .await
                .map_err(LunchError::from)
        })
        .await?;

        tracing::info!("Removed {} target(s) from {} of user {}", targets.len(), relation, user_id);
        Ok(())
    }

    /// Replace the whole relation with exactly one target
    pub async fn replace_single(&self, relation: SocialRelation, user_id: Uuid, target: Uuid) -> Result<()> {
        let targets = target_set(user_id, &[target])?;
        self.ensure_user(user_id).await?;

        with_deadline(self.deadline, async {
            self.store
                .replace_relation(user_id, relation, &targets)
                .await
                .map_err(LunchError::from)
        })
        .await?;

        tracing::info!("Replaced {} of user {} with {}", relation, user_id, target);
        Ok(())
    }

    async fn ensure_user(&self, user_id: Uuid) -> Result<()> {
        let found = with_deadline(self.deadline, async {
            self.store.usernames(&[user_id]).await.map_err(LunchError::from)
        })
        .await?;

        if found.is_empty() {
            return Err(LunchError::NotFound(format!("user {}", user_id)));
        }
        Ok(())
    }
}

/// Deduplicate targets and reject self-edges
fn target_set(user_id: Uuid, targets: &[Uuid]) -> Result<BTreeSet<Uuid>> {
    if targets.contains(&user_id) {
        return Err(LunchError::Validation(format!(
            "user {} cannot be related to itself",
            user_id
        )));
    }
    Ok(targets.iter().copied().collect())
}
