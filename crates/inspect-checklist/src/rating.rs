//! Ratings and item identifiers
//!
//! Both types reject bad input at construction, so a `Rating` or `ItemId`
//! that exists is always valid.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use crate::error::Error;

/// Points an inspector awards to a single checklist item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Rating {
    /// Needs improvement (0 points)
    Poor = 0,
    /// Acceptable (1 point)
    Fair = 1,
    /// Good (2 points)
    Good = 2,
}

impl Rating {
    /// Highest number of points a single item can earn
    pub const MAX_POINTS: u32 = 2;

    /// All ratings, best first, in the order the form presents them
    pub const ALL: [Self; 3] = [Self::Good, Self::Fair, Self::Poor];

    /// Points awarded for this rating
    #[must_use]
    pub const fn points(self) -> u32 {
        self as u32
    }

    /// Label shown next to the score button
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::Fair => "fair",
            Self::Poor => "needs improvement",
        }
    }
}

impl TryFrom<u8> for Rating {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Poor),
            1 => Ok(Self::Fair),
            2 => Ok(Self::Good),
            other => Err(Error::InvalidRating(other)),
        }
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating as u8
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label(), self.points())
    }
}

/// Regulatory numbering: one or more integers joined by dots (1.1, 1.4.2, 3.10.1)
static ITEM_ID_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    // This regex pattern is verified at compile time, unwrap is safe here
    #[allow(clippy::unwrap_used)]
    Regex::new(r"^\d+(\.\d+)*$").unwrap()
});

/// Stable identifier of a checklist item, mirroring the regulatory numbering
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ItemId(pub(crate) String);

impl ItemId {
    /// Parse and validate an item identifier
    pub fn new(id: impl Into<String>) -> Result<Self, Error> {
        let id = id.into();
        let trimmed = id.trim();
        if ITEM_ID_REGEX.is_match(trimmed) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(Error::InvalidItemId(id))
        }
    }

    /// Identifier as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Section number (the leading component, e.g. 1 for "1.4.2")
    #[must_use]
    pub fn section(&self) -> u32 {
        self.0
            .split('.')
            .next()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0)
    }

    /// Nesting depth (1 for "1.1", 2 for "1.4.2")
    #[must_use]
    pub fn depth(&self) -> usize {
        self.0.matches('.').count()
    }
}

impl TryFrom<String> for ItemId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ItemId> for String {
    fn from(id: ItemId) -> Self {
        id.0
    }
}

impl FromStr for ItemId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for ItemId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ItemId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
