use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Request to register a user
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 64))]
    pub username: String,
    #[serde(default)]
    #[serde(alias = "firstname", rename = "firstName")]
    pub first_name: String,
    #[serde(default)]
    #[serde(alias = "lastname", rename = "lastName")]
    pub last_name: String,
}

/// Profile information update
///
/// Every field is optional. `None`, an empty bio or an empty name list
/// leaves the stored value untouched; anything else overwrites it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ProfileUpdate {
    #[serde(default)]
    #[serde(alias = "areaName", rename = "areaNames")]
    pub area_names: Option<Vec<String>>,
    #[serde(default)]
    #[serde(alias = "hobby_names", rename = "hobbyNames")]
    pub hobby_names: Option<Vec<String>>,
    #[serde(default)]
    #[serde(alias = "language_names", rename = "languageNames")]
    pub language_names: Option<Vec<String>>,
    #[serde(default)]
    #[serde(alias = "lunch_location", rename = "lunchLocation")]
    pub lunch_location: Option<String>,
    #[serde(default)]
    #[serde(alias = "lunch_time", rename = "lunchTime")]
    pub lunch_time: Option<String>,
    #[serde(default)]
    #[serde(alias = "lunch_type", rename = "lunchType")]
    pub lunch_type: Option<String>,
    #[serde(default)]
    #[serde(alias = "lunch_food", rename = "lunchFood")]
    pub lunch_food: Option<String>,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub bio: Option<String>,
}

/// Targets for a social relation append/remove
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SocialTargetsRequest {
    #[validate(length(min = 1))]
    pub targets: Vec<Uuid>,
}

/// Request to resolve (get or create) a reference entity by name
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ResolveReferenceRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
}

/// Query for the random user endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomUsersQuery {
    #[serde(default = "default_count")]
    pub count: usize,
}

fn default_count() -> usize {
    5
}
