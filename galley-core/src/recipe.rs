//! Recipe - a named, ordered group of ingredients

use crate::ingredient::SharedIngredient;

/// A named, append-only, insertion-ordered group of ingredients
///
/// The name is used for grouping and reporting; this layer does not require
/// it to be unique. Insertion order is the order the engine applies the
/// ingredients in.
pub struct Recipe {
    name: String,
    ingredients: Vec<SharedIngredient>,
}

impl Recipe {
    /// Create an empty recipe.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ingredients: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The current ingredients, in insertion order.
    pub fn ingredients(&self) -> &[SharedIngredient] {
        &self.ingredients
    }

    /// Append ingredients in the given order. Never deduplicates or
    /// validates; avoiding duplicates is the caller's responsibility.
    pub fn append<I>(&mut self, ingredients: I)
    where
        I: IntoIterator<Item = SharedIngredient>,
    {
        self.ingredients.extend(ingredients);
    }
}
