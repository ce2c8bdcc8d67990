// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{LunchDetails, LunchSchedule, NewUser, Reference, ReferenceKind, SocialRelation, TimeWindow, User, UserView};
pub use requests::{CreateUserRequest, ProfileUpdate, RandomUsersQuery, ResolveReferenceRequest, SocialTargetsRequest};
pub use responses::{ErrorResponse, HealthResponse, ProfileUpdateResponse, RandomProfilesResponse, RandomUsersResponse, StepErrorResponse, SuggestionsResponse};
