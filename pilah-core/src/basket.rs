//! Selected waste categories and their bounded quantities.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::model::{CategoryId, LineItem};

/// Highest quantity a single category may reach.
pub const MAX_QUANTITY: u8 = 10;

/// A deserialized basket entry outside `1..=MAX_QUANTITY`.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("quantity {quantity} for {category} is outside 1..={max}", max = MAX_QUANTITY)]
pub struct QuantityOutOfRange {
    /// Offending category.
    pub category: CategoryId,
    /// Offending quantity.
    pub quantity: u8,
}

/// Mapping from category to quantity.
///
/// A category is present only while its quantity is between 1 and
/// [`MAX_QUANTITY`]; dropping to zero removes it. Iteration follows the order
/// in which categories were first added. Serialized as a plain
/// category-to-quantity map; decoding rejects out-of-range quantities.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "IndexMap<CategoryId, u8>",
    into = "IndexMap<CategoryId, u8>"
)]
pub struct LineItemBasket {
    items: IndexMap<CategoryId, u8>,
}

impl TryFrom<IndexMap<CategoryId, u8>> for LineItemBasket {
    type Error = QuantityOutOfRange;

    fn try_from(items: IndexMap<CategoryId, u8>) -> Result<Self, Self::Error> {
        if let Some((category, quantity)) = items
            .iter()
            .find(|(_, quantity)| !(1..=MAX_QUANTITY).contains(*quantity))
        {
            return Err(QuantityOutOfRange {
                category: category.clone(),
                quantity: *quantity,
            });
        }
        Ok(Self { items })
    }
}

impl From<LineItemBasket> for IndexMap<CategoryId, u8> {
    fn from(basket: LineItemBasket) -> Self {
        basket.items
    }
}

impl LineItemBasket {
    /// Empty basket.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adjust a category's quantity by `delta`, clamped to `0..=MAX_QUANTITY`.
    ///
    /// Returns the resulting quantity; zero means the category was removed.
    pub fn set_quantity(&mut self, category: &CategoryId, delta: i32) -> u8 {
        let current = i64::from(self.quantity(category));
        let next = (current + i64::from(delta)).clamp(0, i64::from(MAX_QUANTITY));
        let next = u8::try_from(next).unwrap_or(MAX_QUANTITY);

        if next == 0 {
            self.remove(category);
        } else if let Some(quantity) = self.items.get_mut(category) {
            *quantity = next;
        } else {
            self.items.insert(category.clone(), next);
        }
        tracing::trace!(%category, delta, quantity = next, "basket quantity changed");
        next
    }

    /// Checkbox-style selection.
    ///
    /// Turning an absent category on adds it with quantity 1. Turning an
    /// already selected category on keeps its current quantity; it is not
    /// reset to 1. Turning a category off removes it whatever its quantity.
    pub fn toggle(&mut self, category: &CategoryId, selected: bool) {
        if selected {
            if !self.contains(category) {
                self.set_quantity(category, 1);
            }
        } else {
            self.remove(category);
        }
    }

    /// Drop a category, returning its previous quantity.
    pub fn remove(&mut self, category: &CategoryId) -> Option<u8> {
        self.items.shift_remove(category)
    }

    /// Current quantity, zero when absent.
    #[must_use]
    pub fn quantity(&self, category: &CategoryId) -> u8 {
        self.items.get(category).copied().unwrap_or(0)
    }

    /// Whether the category is selected.
    #[must_use]
    pub fn contains(&self, category: &CategoryId) -> bool {
        self.items.contains_key(category)
    }

    /// Categories with a positive quantity, in insertion order.
    pub fn selected_category_ids(&self) -> impl Iterator<Item = &CategoryId> {
        self.items.keys()
    }

    /// True when nothing is selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of selected categories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Total units across all categories.
    #[must_use]
    pub fn total_units(&self) -> u32 {
        self.items.values().map(|quantity| u32::from(*quantity)).sum()
    }

    /// Selected categories with their quantities, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&CategoryId, u8)> {
        self.items.iter().map(|(category, quantity)| (category, *quantity))
    }

    /// Copy the basket into line items, in insertion order.
    #[must_use]
    pub fn line_items(&self) -> Vec<LineItem> {
        self.iter()
            .map(|(category, quantity)| LineItem {
                category_id: category.clone(),
                quantity,
            })
            .collect()
    }
}
