// Core engine exports
pub mod engine;
pub mod error;
pub mod filters;
pub mod matcher;
pub mod profile;
pub mod registry;
pub mod schedule;
pub mod social;

pub use engine::{EngineConfig, LunchEngine};
pub use error::{LunchError, Result};
pub use filters::{is_excluded, lunch_compatible, shares_any, shares_every_category};
pub use matcher::{sample, MatchResult, Matcher, DEFAULT_MAX_SUGGESTIONS};
pub use profile::{ProfileService, ProfileUpdateOutcome, StepError, UpdateStep};
pub use registry::{normalize_name, ReferenceRegistry};
pub use schedule::{parse_time_of_day, Clock, FixedClock, ScheduleResolver, SystemClock};
pub use social::SocialGraph;
