use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Kind of a named reference entity shared across users
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceKind {
    Area,
    Hobby,
    Language,
}

impl ReferenceKind {
    pub const ALL: [ReferenceKind; 3] = [ReferenceKind::Area, ReferenceKind::Hobby, ReferenceKind::Language];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceKind::Area => "area",
            ReferenceKind::Hobby => "hobby",
            ReferenceKind::Language => "language",
        }
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReferenceKind {
    type Err = String;

    /// Accepts both singular and plural path segments (`area`, `areas`, `hobbies`, ...)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "area" | "areas" => Ok(ReferenceKind::Area),
            "hobby" | "hobbies" => Ok(ReferenceKind::Hobby),
            "language" | "languages" => Ok(ReferenceKind::Language),
            other => Err(format!("unknown reference kind: {}", other)),
        }
    }
}

/// One of the three directed user-to-user relations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SocialRelation {
    Buddies,
    Blacklist,
    Likes,
}

impl SocialRelation {
    pub const ALL: [SocialRelation; 3] = [SocialRelation::Buddies, SocialRelation::Blacklist, SocialRelation::Likes];

    pub fn as_str(&self) -> &'static str {
        match self {
            SocialRelation::Buddies => "buddies",
            SocialRelation::Blacklist => "blacklist",
            SocialRelation::Likes => "likes",
        }
    }
}

impl fmt::Display for SocialRelation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SocialRelation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "buddy" | "buddies" => Ok(SocialRelation::Buddies),
            "blacklist" | "blacklists" => Ok(SocialRelation::Blacklist),
            "like" | "likes" => Ok(SocialRelation::Likes),
            other => Err(format!("unknown relation: {}", other)),
        }
    }
}

/// A deduplicated, named attribute value (area, hobby or language)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub id: Uuid,
    pub kind: ReferenceKind,
    pub name: String,
}

/// A user's daily lunch slot. At most one per user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LunchSchedule {
    pub id: Uuid,
    #[serde(rename = "userId")]
    pub user_id: Uuid,
    pub location: String,
    #[serde(rename = "type")]
    pub lunch_type: String,
    pub food: String,
    /// Absolute start instant, resolved against the day the schedule was set
    pub start: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// Lunch values written by a profile update
#[derive(Debug, Clone, PartialEq)]
pub struct LunchDetails {
    pub location: String,
    pub lunch_type: String,
    pub food: String,
    pub start: DateTime<Utc>,
}

/// Absolute half-open interval `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// User with every association loaded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    #[serde(rename = "firstName")]
    pub first_name: String,
    #[serde(rename = "lastName")]
    pub last_name: String,
    #[serde(default)]
    pub bio: String,
    #[serde(rename = "isSetup", default)]
    pub is_setup: bool,
    #[serde(default)]
    pub areas: Vec<Reference>,
    #[serde(default)]
    pub hobbies: Vec<Reference>,
    #[serde(default)]
    pub languages: Vec<Reference>,
    #[serde(default)]
    pub lunch: Option<LunchSchedule>,
    #[serde(default)]
    pub buddies: BTreeSet<Uuid>,
    #[serde(default)]
    pub blacklist: BTreeSet<Uuid>,
    #[serde(default)]
    pub likes: BTreeSet<Uuid>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn references(&self, kind: ReferenceKind) -> &[Reference] {
        match kind {
            ReferenceKind::Area => &self.areas,
            ReferenceKind::Hobby => &self.hobbies,
            ReferenceKind::Language => &self.languages,
        }
    }

    pub fn relation(&self, relation: SocialRelation) -> &BTreeSet<Uuid> {
        match relation {
            SocialRelation::Buddies => &self.buddies,
            SocialRelation::Blacklist => &self.blacklist,
            SocialRelation::Likes => &self.likes,
        }
    }

    /// Ids the user must never be suggested: itself plus every related user
    pub fn exclusions(&self) -> BTreeSet<Uuid> {
        let mut excluded: BTreeSet<Uuid> = self
            .buddies
            .iter()
            .chain(self.blacklist.iter())
            .chain(self.likes.iter())
            .copied()
            .collect();
        excluded.insert(self.id);
        excluded
    }
}

/// Fields needed to register a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

/// Render-ready user card
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserView {
    pub id: Uuid,
    pub username: String,
    #[serde(rename = "firstName")]
    pub first_name: String,
    #[serde(rename = "lastName")]
    pub last_name: String,
    pub bio: String,
    #[serde(rename = "isSetup")]
    pub is_setup: bool,
    pub hobbies: Vec<String>,
    pub languages: Vec<String>,
    pub areas: Vec<String>,
    #[serde(rename = "lunchStart")]
    pub lunch_start: Option<String>,
    #[serde(rename = "lunchEnd")]
    pub lunch_end: Option<String>,
    #[serde(rename = "lunchType")]
    pub lunch_type: Option<String>,
    #[serde(rename = "lunchFood")]
    pub lunch_food: Option<String>,
    #[serde(rename = "lunchLocation")]
    pub lunch_location: Option<String>,
    pub buddies: Vec<String>,
    pub blacklist: Vec<String>,
    pub likes: Vec<String>,
}
