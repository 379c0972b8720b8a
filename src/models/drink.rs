use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::{validate_catalog, ValidationResult};

/// Number of fractional digits used for every monetary amount
pub const MONEY_SCALE: u32 = 2;

/// One catalog entry together with its currently selected quantity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrinkItem {
    pub id: u32,
    pub name: String,
    pub unit_price: Decimal,
    pub is_alcoholic: bool,
    pub quantity: u32,
}

impl DrinkItem {
    /// Create a catalog entry with nothing selected
    pub fn new(id: u32, name: impl Into<String>, unit_price: Decimal, is_alcoholic: bool) -> Self {
        Self {
            id,
            name: name.into(),
            unit_price,
            is_alcoholic,
            quantity: 0,
        }
    }

    /// Price of this line (unit_price * quantity)
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }

    /// Whether this line contributes alcohol to the order
    pub fn is_alcoholic_selection(&self) -> bool {
        self.is_alcoholic && self.quantity > 0
    }
}

/// The fixed drink catalog, in display order
pub fn default_catalog() -> Vec<DrinkItem> {
    vec![
        DrinkItem::new(1, "Roba Cola", dec!(1.25), false),
        DrinkItem::new(2, "Robo Beer", dec!(2.00), true),
        DrinkItem::new(3, "Rob(w)ine", dec!(3.00), true),
    ]
}

/// A drink order: the catalog plus the quantity selected for each line.
///
/// Lines keep catalog order for the lifetime of the order and quantity is the
/// only field that ever changes. Ids are validated unique on construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    catalog: Vec<DrinkItem>,
    items: Vec<DrinkItem>,
}

impl Order {
    /// Create an order over the fixed catalog
    pub fn new() -> Self {
        let catalog = default_catalog();
        Self {
            items: catalog.clone(),
            catalog,
        }
    }

    /// Create an order over a custom catalog; quantities start at zero
    pub fn with_catalog(catalog: Vec<DrinkItem>) -> ValidationResult<Self> {
        validate_catalog(&catalog)?;

        let catalog: Vec<DrinkItem> = catalog
            .into_iter()
            .map(|item| DrinkItem { quantity: 0, ..item })
            .collect();

        Ok(Self {
            items: catalog.clone(),
            catalog,
        })
    }

    /// Rebuild every line from the catalog with all quantities at zero
    pub fn reset(&mut self) {
        self.items.clone_from(&self.catalog);
    }

    /// Current lines in catalog order
    pub fn list(&self) -> &[DrinkItem] {
        &self.items
    }

    /// Add one of the given drink; unknown ids are ignored
    pub fn increment(&mut self, id: u32) -> &[DrinkItem] {
        if let Some(item) = self.find_mut(id) {
            item.quantity = item.quantity.saturating_add(1);
        }
        &self.items
    }

    /// Remove one of the given drink, never going below zero; unknown ids are ignored
    pub fn decrement(&mut self, id: u32) -> &[DrinkItem] {
        if let Some(item) = self.find_mut(id) {
            item.quantity = item.quantity.saturating_sub(1);
        }
        &self.items
    }

    /// Sum of all line totals, always carrying two fractional digits
    pub fn total_price(&self) -> Decimal {
        let mut total: Decimal = self.items.iter().map(DrinkItem::line_total).sum();
        total.rescale(MONEY_SCALE);
        total
    }

    /// Number of drinks selected across all lines, saturating at `u32::MAX`
    pub fn total_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |total, item| total.saturating_add(item.quantity))
    }

    pub fn has_alcoholic_selection(&self) -> bool {
        self.items.iter().any(DrinkItem::is_alcoholic_selection)
    }

    pub fn is_empty(&self) -> bool {
        self.total_count() == 0
    }

    /// Look up a line by drink id
    pub fn get(&self, id: u32) -> Option<&DrinkItem> {
        self.items.iter().find(|item| item.id == id)
    }

    fn find_mut(&mut self, id: u32) -> Option<&mut DrinkItem> {
        self.items.iter_mut().find(|item| item.id == id)
    }
}

impl Default for Order {
    fn default() -> Self {
        Self::new()
    }
}
