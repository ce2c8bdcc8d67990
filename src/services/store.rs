use async_trait::async_trait;
use std::collections::BTreeSet;
use thiserror::Error;
use uuid::Uuid;
use crate::models::{LunchDetails, LunchSchedule, NewUser, Reference, ReferenceKind, SocialRelation, User};

/// Errors raised at the storage boundary
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate key: {0}")]
    Duplicate(String),

    #[error("SQLx error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Storage backend for users, reference entities, lunch schedules and the social graph
///
/// Every engine component receives an `Arc<dyn Store>` at construction.
/// Implementations must enforce:
/// - at most one reference per `(kind, key)`; a losing insert returns [`StoreError::Duplicate`]
/// - at most one lunch schedule per user
/// - a user never relates to itself
#[async_trait]
pub trait Store: Send + Sync {
    async fn create_user(&self, new_user: NewUser) -> Result<User, StoreError>;

    async fn get_user(&self, id: Uuid) -> Result<User, StoreError>;

    async fn get_user_by_username(&self, username: &str) -> Result<User, StoreError>;

    /// Usernames for the given ids, in the order given. Unknown ids are skipped.
    async fn usernames(&self, ids: &[Uuid]) -> Result<Vec<String>, StoreError>;

    async fn set_bio(&self, user_id: Uuid, bio: &str) -> Result<(), StoreError>;

    /// Look up a reference by its normalized key
    async fn find_reference(&self, kind: ReferenceKind, key: &str) -> Result<Option<Reference>, StoreError>;

    /// Insert a reference; fails with [`StoreError::Duplicate`] if the key is taken
    async fn insert_reference(&self, kind: ReferenceKind, key: &str, name: &str) -> Result<Reference, StoreError>;

    async fn list_references(&self, kind: ReferenceKind) -> Result<Vec<Reference>, StoreError>;

    /// Replace the user's whole set of references of one kind
    async fn replace_user_references(&self, user_id: Uuid, kind: ReferenceKind, reference_ids: &[Uuid]) -> Result<(), StoreError>;

    /// Create the user's lunch schedule or update the existing one in place
    async fn upsert_lunch(&self, user_id: Uuid, details: &LunchDetails) -> Result<LunchSchedule, StoreError>;

    async fn append_relation(&self, user_id: Uuid, relation: SocialRelation, targets: &BTreeSet<Uuid>) -> Result<(), StoreError>;

    async fn remove_relation(&self, user_id: Uuid, relation: SocialRelation, targets: &BTreeSet<Uuid>) -> Result<(), StoreError>;

    async fn replace_relation(&self, user_id: Uuid, relation: SocialRelation, targets: &BTreeSet<Uuid>) -> Result<(), StoreError>;

    /// All users not in `exclude`, with associations loaded
    async fn candidate_users(&self, exclude: &BTreeSet<Uuid>) -> Result<Vec<User>, StoreError>;

    async fn health_check(&self) -> Result<bool, StoreError>;
}
