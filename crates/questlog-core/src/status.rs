//! Collection-item status lifecycle.
//!
//! The legality of a status change is a data question, not a logic one: the
//! whole rule set lives in [`TRANSITIONS`], so adding a status means adding a
//! row and a column rather than touching branch code.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Where a title sits in the owner's personal journey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CollectionStatus {
    Wishlist,
    CuriousAbout,
    CurrentlyExploring,
    TookABreak,
    Experienced,
    Revisiting,
}

pub const ALL_STATUSES: [CollectionStatus; 6] = [
    CollectionStatus::Wishlist,
    CollectionStatus::CuriousAbout,
    CollectionStatus::CurrentlyExploring,
    CollectionStatus::TookABreak,
    CollectionStatus::Experienced,
    CollectionStatus::Revisiting,
];

/// `TRANSITIONS[from][to]`. Every pair is allowed except moves into
/// Wishlist, which is a creation-only status. That includes the
/// Wishlist-to-Wishlist case: there is nothing to transition, so it is
/// rejected like every other attempt to target the wishlist.
const TRANSITIONS: [[bool; 6]; 6] = [
    // to: Wishlist CuriousAbout CurrentlyExploring TookABreak Experienced Revisiting
    [false, true, true, true, true, true], // from Wishlist
    [false, true, true, true, true, true], // from CuriousAbout
    [false, true, true, true, true, true], // from CurrentlyExploring
    [false, true, true, true, true, true], // from TookABreak
    [false, true, true, true, true, true], // from Experienced
    [false, true, true, true, true, true], // from Revisiting
];

impl CollectionStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            CollectionStatus::Wishlist => "wishlist",
            CollectionStatus::CuriousAbout => "curious_about",
            CollectionStatus::CurrentlyExploring => "currently_exploring",
            CollectionStatus::TookABreak => "took_a_break",
            CollectionStatus::Experienced => "experienced",
            CollectionStatus::Revisiting => "revisiting",
        }
    }

    /// Human-readable label for CLI output and logs.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            CollectionStatus::Wishlist => "Wishlist",
            CollectionStatus::CuriousAbout => "Curious About",
            CollectionStatus::CurrentlyExploring => "Currently Exploring",
            CollectionStatus::TookABreak => "Taking a Break",
            CollectionStatus::Experienced => "Experienced",
            CollectionStatus::Revisiting => "Revisiting",
        }
    }

    fn index(self) -> usize {
        match self {
            CollectionStatus::Wishlist => 0,
            CollectionStatus::CuriousAbout => 1,
            CollectionStatus::CurrentlyExploring => 2,
            CollectionStatus::TookABreak => 3,
            CollectionStatus::Experienced => 4,
            CollectionStatus::Revisiting => 5,
        }
    }
}

impl std::str::FromStr for CollectionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_STATUSES
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("unknown collection status: {s}"))
    }
}

/// Returns whether `from -> to` is a legal transition.
///
/// Any status is legal at item *creation*; this table only governs changes
/// to an existing item.
#[must_use]
pub fn transition_allowed(from: CollectionStatus, to: CollectionStatus) -> bool {
    TRANSITIONS[from.index()][to.index()]
}

/// Validates `from -> to`, producing the user-facing rejection copy.
///
/// # Errors
///
/// Returns a validation [`DomainError`] when the transition is denied.
pub fn validate_transition(
    from: CollectionStatus,
    to: CollectionStatus,
) -> Result<(), DomainError> {
    if transition_allowed(from, to) {
        Ok(())
    } else {
        Err(DomainError::validation(
            "Wishlist is for new items only; remove the item and add it again",
            "status",
        ))
    }
}

/// Status suggested for a freshly imported title.
///
/// Never-launched titles read as aspirational; anything with recorded
/// playtime reads as already experienced. Suggestion only; creation
/// accepts any status.
#[must_use]
pub fn suggested_status_for_playtime(playtime_minutes: i64) -> CollectionStatus {
    if playtime_minutes == 0 {
        CollectionStatus::Wishlist
    } else {
        CollectionStatus::Experienced
    }
}
