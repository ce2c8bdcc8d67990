use std::collections::BTreeSet;
use uuid::Uuid;
use crate::core::schedule::ScheduleResolver;
use crate::models::{Reference, ReferenceKind, User};

/// Check whether two reference sets have at least one entity in common
#[inline]
pub fn shares_any(a: &[Reference], b: &[Reference]) -> bool {
    a.iter().any(|x| b.iter().any(|y| x.id == y.id))
}

/// Check that the candidate overlaps the user in every category
///
/// One shared area is enough for the area category, but areas, hobbies and
/// languages must each have some overlap.
#[inline]
pub fn shares_every_category(user: &User, candidate: &User) -> bool {
    ReferenceKind::ALL
        .iter()
        .all(|kind| shares_any(user.references(*kind), candidate.references(*kind)))
}

/// Check that both users have a lunch slot and the slots overlap
///
/// A user without a schedule never matches on time.
#[inline]
pub fn lunch_compatible(user: &User, candidate: &User, resolver: &ScheduleResolver) -> bool {
    match (&user.lunch, &candidate.lunch) {
        (Some(mine), Some(theirs)) => resolver.daily_windows_overlap(mine.start, theirs.start),
        _ => false,
    }
}

/// Check the candidate against the requester's exclusion set
#[inline]
pub fn is_excluded(candidate: &User, exclusions: &BTreeSet<Uuid>) -> bool {
    exclusions.contains(&candidate.id)
}
