//! Checklist items and categories
//!
//! Item state is addressed by its [`ItemId`], never by position, so
//! reordering or inserting items cannot move a rating onto the wrong line.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::rating::{ItemId, Rating};

/// One line of the inspection checklist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    /// Regulatory item number
    pub id: ItemId,
    /// Requirement text shown to the inspector
    pub prompt: String,
    /// Awarded rating (None until the inspector rates the item)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<Rating>,
    /// Item does not apply to this facility and is left out of the score
    #[serde(default)]
    pub excluded: bool,
    /// Free-text inspector note
    #[serde(default)]
    pub note: String,
}

impl ChecklistItem {
    /// Create an unrated, included item
    #[must_use]
    pub fn new(id: ItemId, prompt: impl Into<String>) -> Self {
        Self {
            id,
            prompt: prompt.into(),
            rating: None,
            excluded: false,
            note: String::new(),
        }
    }

    /// Builder: set the rating
    #[must_use]
    pub fn with_rating(mut self, rating: Rating) -> Self {
        self.rating = Some(rating);
        self
    }

    /// Builder: mark as excluded
    #[must_use]
    pub fn excluded(mut self) -> Self {
        self.excluded = true;
        self
    }

    /// Builder: attach a note
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = note.into();
        self
    }

    /// Points this item contributes (0 when excluded or unrated)
    #[must_use]
    pub fn points(&self) -> u32 {
        if self.excluded {
            0
        } else {
            self.rating.map_or(0, Rating::points)
        }
    }

    /// Whether the item carries an inspector judgement that counts
    #[must_use]
    pub fn is_scored(&self) -> bool {
        !self.excluded && self.rating.is_some()
    }
}

/// A checklist section (e.g. "Building and premises")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawCategory")]
pub struct Category {
    /// Stable category identifier (e.g. "building")
    pub id: String,
    /// Category heading
    pub title: String,
    /// Short description of what is inspected
    #[serde(default)]
    pub description: String,
    items: Vec<ChecklistItem>,
}

/// Unvalidated shape used for deserialization
#[derive(Deserialize)]
struct RawCategory {
    id: String,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    items: Vec<ChecklistItem>,
}

impl TryFrom<RawCategory> for Category {
    type Error = Error;

    fn try_from(raw: RawCategory) -> Result<Self> {
        Self::new(raw.id, raw.title, raw.description, raw.items)
    }
}

impl Category {
    /// Build a category, rejecting duplicate item identifiers
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        items: Vec<ChecklistItem>,
    ) -> Result<Self> {
        let id = id.into();
        let mut seen = HashSet::new();
        for item in &items {
            if !seen.insert(item.id.clone()) {
                return Err(Error::DuplicateItem {
                    category: id,
                    item: item.id.to_string(),
                });
            }
        }
        Ok(Self {
            id,
            title: title.into(),
            description: description.into(),
            items,
        })
    }

    /// Items in form order
    #[must_use]
    pub fn items(&self) -> &[ChecklistItem] {
        &self.items
    }

    /// Look up an item by its identifier
    #[must_use]
    pub fn item(&self, id: &str) -> Option<&ChecklistItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Whether the category defines the item
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.item(id).is_some()
    }

    fn item_mut(&mut self, id: &str) -> Result<&mut ChecklistItem> {
        let category = &self.id;
        self.items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or_else(|| Error::UnknownItem {
                category: category.clone(),
                item: id.to_string(),
            })
    }

    /// Record a rating for an item
    pub fn rate(&mut self, id: &str, rating: Rating) -> Result<()> {
        self.item_mut(id)?.rating = Some(rating);
        Ok(())
    }

    /// Record a raw integer rating, rejecting anything outside {0, 1, 2}
    pub fn rate_raw(&mut self, id: &str, value: u8) -> Result<()> {
        let rating = Rating::try_from(value)?;
        self.rate(id, rating)
    }

    /// Remove the rating from an item
    pub fn clear_rating(&mut self, id: &str) -> Result<()> {
        self.item_mut(id)?.rating = None;
        Ok(())
    }

    /// Include or exclude an item from scoring
    pub fn set_excluded(&mut self, id: &str, excluded: bool) -> Result<()> {
        self.item_mut(id)?.excluded = excluded;
        Ok(())
    }

    /// Replace the note on an item
    pub fn annotate(&mut self, id: &str, note: impl Into<String>) -> Result<()> {
        self.item_mut(id)?.note = note.into();
        Ok(())
    }

    /// Number of items in the category
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the category has no items
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> ItemId {
        ItemId::new(s).unwrap()
    }

    fn sample() -> Category {
        Category::new(
            "building",
            "Building",
            "Premises and structure",
            vec![
                ChecklistItem::new(id("1.1"), "Location"),
                ChecklistItem::new(id("1.2"), "Surroundings"),
                ChecklistItem::new(id("1.4.1"), "Floors"),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_duplicate_item_rejected() {
        let result = Category::new(
            "building",
            "Building",
            "",
            vec![
                ChecklistItem::new(id("1.1"), "a"),
                ChecklistItem::new(id("1.1"), "b"),
            ],
        );
        assert!(matches!(result, Err(Error::DuplicateItem { .. })));
    }

    #[test]
    fn test_rate_by_id() {
        let mut cat = sample();
        cat.rate("1.4.1", Rating::Fair).unwrap();
        assert_eq!(cat.item("1.4.1").unwrap().rating, Some(Rating::Fair));
        assert_eq!(cat.item("1.1").unwrap().rating, None);
    }

    #[test]
    fn test_rate_unknown_item() {
        let mut cat = sample();
        let err = cat.rate("9.9", Rating::Good).unwrap_err();
        assert!(matches!(err, Error::UnknownItem { .. }));
    }

    #[test]
    fn test_rate_raw_rejects_out_of_range() {
        let mut cat = sample();
        assert!(matches!(
            cat.rate_raw("1.1", 5),
            Err(Error::InvalidRating(5))
        ));
        assert_eq!(cat.item("1.1").unwrap().rating, None);
    }

    #[test]
    fn test_excluded_item_contributes_nothing() {
        let item = ChecklistItem::new(id("1.1"), "x")
            .with_rating(Rating::Good)
            .excluded();
        assert_eq!(item.points(), 0);
        assert!(!item.is_scored());
    }

    #[test]
    fn test_annotate_and_clear() {
        let mut cat = sample();
        cat.rate("1.2", Rating::Good).unwrap();
        cat.annotate("1.2", "clean").unwrap();
        cat.clear_rating("1.2").unwrap();
        let item = cat.item("1.2").unwrap();
        assert_eq!(item.note, "clean");
        assert_eq!(item.rating, None);
    }

    #[test]
    fn test_deserialize_validates_duplicates() {
        let yaml = r#"
id: building
title: Building
items:
  - { id: "1.1", prompt: a }
  - { id: "1.1", prompt: b }
"#;
        assert!(serde_yaml::from_str::<Category>(yaml).is_err());
    }

    #[test]
    fn test_deserialize_rejects_bad_rating() {
        let yaml = r#"
id: building
title: Building
items:
  - { id: "1.1", prompt: a, rating: 7 }
"#;
        assert!(serde_yaml::from_str::<Category>(yaml).is_err());
    }
}
