use serde::{Deserialize, Serialize};
use uuid::Uuid;
use crate::models::domain::{User, UserView};

/// Response for the profile information endpoint
///
/// A profile update applies its steps independently, so a response can carry
/// the updated user together with the steps that failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileUpdateResponse {
    pub user: User,
    pub errors: Vec<StepErrorResponse>,
}

/// One failed step of a profile update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepErrorResponse {
    pub step: String,
    pub error: String,
    pub message: String,
}

/// Response for the suggestion endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionsResponse {
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    pub suggestions: Vec<Uuid>,
    #[serde(rename = "totalCandidates")]
    pub total_candidates: usize,
}

/// Response for the random user endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomUsersResponse {
    pub users: Vec<Uuid>,
}

/// Response for the random profiles endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomProfilesResponse {
    pub users: Vec<UserView>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
