//! Proptest strategies for checklist types
//!
//! Used by the scoring property tests in this workspace.

use proptest::prelude::*;

use crate::model::{Category, ChecklistItem};
use crate::rating::{ItemId, Rating};

/// Strategy for ratings
pub fn rating_strategy() -> impl Strategy<Value = Rating> {
    prop_oneof![Just(Rating::Poor), Just(Rating::Fair), Just(Rating::Good)]
}

/// Strategy for an optional rating (unset about one time in five)
pub fn optional_rating_strategy() -> impl Strategy<Value = Option<Rating>> {
    prop_oneof![
        1 => Just(None),
        4 => rating_strategy().prop_map(Some),
    ]
}

/// Strategy for a single item with the given identifier
pub fn item_strategy(id: ItemId) -> impl Strategy<Value = ChecklistItem> {
    (optional_rating_strategy(), any::<bool>(), "[a-z ]{0,20}").prop_map(
        move |(rating, excluded, note)| ChecklistItem {
            id: id.clone(),
            prompt: format!("Requirement {id}"),
            rating,
            excluded,
            note,
        },
    )
}

/// Strategy for item lists with unique identifiers 1.1 .. 1.n
pub fn items_strategy(max_len: usize) -> impl Strategy<Value = Vec<ChecklistItem>> {
    prop::collection::vec(
        (optional_rating_strategy(), any::<bool>()),
        0..=max_len,
    )
    .prop_map(|states| {
        states
            .into_iter()
            .enumerate()
            .map(|(i, (rating, excluded))| ChecklistItem {
                id: ItemId(format!("1.{}", i + 1)),
                prompt: format!("Requirement 1.{}", i + 1),
                rating,
                excluded,
                note: String::new(),
            })
            .collect()
    })
}

/// Strategy for a category with up to `max_items` items
pub fn category_strategy(max_items: usize) -> impl Strategy<Value = Category> {
    items_strategy(max_items).prop_filter_map("valid category", |items| {
        Category::new("generated", "Generated category", "", items).ok()
    })
}

/// Strategy for valid item identifiers
pub fn item_id_strategy() -> impl Strategy<Value = ItemId> {
    prop::collection::vec(1u32..20, 1..4).prop_map(|parts| {
        let joined = parts
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(".");
        ItemId(joined)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_generated_item_ids_parse(id in item_id_strategy()) {
            prop_assert!(ItemId::new(id.as_str()).is_ok());
        }

        #[test]
        fn prop_items_have_unique_ids(items in items_strategy(30)) {
            let mut ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
            ids.sort_unstable();
            ids.dedup();
            prop_assert_eq!(ids.len(), items.len());
        }

        #[test]
        fn prop_item_points_bounded(item in item_strategy(ItemId(String::from("2.1")))) {
            prop_assert!(item.points() <= Rating::MAX_POINTS);
            if item.excluded {
                prop_assert_eq!(item.points(), 0);
            }
        }

        #[test]
        fn prop_rating_roundtrips_through_u8(rating in rating_strategy()) {
            let raw: u8 = rating.into();
            prop_assert_eq!(Rating::try_from(raw).unwrap(), rating);
        }
    }
}
