//! Lunch Buddy - lunch compatibility and social graph engine
//!
//! Keeps user profiles (areas, hobbies, languages, lunch slot), a directed
//! social graph (buddies, blacklist, likes) and suggests up to five random
//! compatible lunch partners.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{EngineConfig, LunchEngine, LunchError, Matcher, ScheduleResolver};
pub use models::{ProfileUpdate, Reference, ReferenceKind, SocialRelation, User, UserView};
pub use services::{MemoryStore, PostgresStore, ReferenceCache, Store};
