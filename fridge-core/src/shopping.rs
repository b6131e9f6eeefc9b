//! Per-recipe shopping lists.
//!
//! A list is derived from a recipe's ingredient lines the first time the
//! recipe is opened. After that it lives in storage under
//! `shopping-list-<recipeId>` and is loaded instead of re-derived.

use serde::{Deserialize, Serialize};

use crate::store::{KeyValueStore, StoreError};
use crate::types::Recipe;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingListItem {
    /// Ingredient slot number. Older lists stored this as `id`.
    #[serde(alias = "id")]
    pub index: u8,
    pub text: String,
    #[serde(default)]
    pub measure: Option<String>,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub is_hidden: bool,
}

/// A mutation requested by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShoppingListOp {
    Toggle(u8),
    Archive(u8),
    RestoreAll,
    Reset,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShoppingList {
    recipe_id: String,
    items: Vec<ShoppingListItem>,
}

impl ShoppingList {
    pub fn storage_key(recipe_id: &str) -> String {
        format!("shopping-list-{recipe_id}")
    }

    /// Fresh list with nothing completed or hidden.
    pub fn derive(recipe: &Recipe) -> Self {
        let items = recipe
            .ingredients
            .iter()
            .map(|line| ShoppingListItem {
                index: line.position,
                text: line.ingredient.clone(),
                measure: line.measure.clone(),
                is_completed: false,
                is_hidden: false,
            })
            .collect();
        Self {
            recipe_id: recipe.id.clone(),
            items,
        }
    }

    /// Persisted list for `recipe_id`, if any.
    pub fn read(store: &dyn KeyValueStore, recipe_id: &str) -> Result<Option<Self>, StoreError> {
        let Some(raw) = store.get(&Self::storage_key(recipe_id))? else {
            return Ok(None);
        };
        let items: Vec<ShoppingListItem> = serde_json::from_str(&raw)?;
        Ok(Some(Self {
            recipe_id: recipe_id.to_string(),
            items,
        }))
    }

    /// Load the persisted list, or derive one when nothing usable is stored.
    pub fn open(store: &dyn KeyValueStore, recipe: &Recipe) -> Self {
        match Self::read(store, &recipe.id) {
            Ok(Some(list)) => list,
            Ok(None) => Self::derive(recipe),
            Err(e) => {
                tracing::warn!(recipe_id = %recipe.id, error = %e, "shopping: stored list unreadable, deriving");
                Self::derive(recipe)
            }
        }
    }

    /// Persist the list. Empty lists are never written.
    pub fn write(&self, store: &dyn KeyValueStore) -> Result<(), StoreError> {
        if self.items.is_empty() {
            return Ok(());
        }
        let raw = serde_json::to_string(&self.items)?;
        store.set(&Self::storage_key(&self.recipe_id), &raw)
    }

    pub fn recipe_id(&self) -> &str {
        &self.recipe_id
    }

    pub fn items(&self) -> &[ShoppingListItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn item_mut(&mut self, index: u8) -> Option<&mut ShoppingListItem> {
        self.items.iter_mut().find(|item| item.index == index)
    }

    /// Flip the completed flag. Returns false if no item has that index.
    pub fn toggle(&mut self, index: u8) -> bool {
        match self.item_mut(index) {
            Some(item) => {
                item.is_completed = !item.is_completed;
                true
            }
            None => false,
        }
    }

    /// Hide an item. Returns false if no item has that index.
    pub fn archive(&mut self, index: u8) -> bool {
        match self.item_mut(index) {
            Some(item) => {
                item.is_hidden = true;
                true
            }
            None => false,
        }
    }

    pub fn restore_all(&mut self) {
        for item in &mut self.items {
            item.is_hidden = false;
        }
    }

    /// Discard all flags and re-derive from the recipe.
    pub fn reset(&mut self, recipe: &Recipe) {
        *self = Self::derive(recipe);
    }

    /// Apply `op`, returning whether it matched anything.
    pub fn apply(&mut self, op: ShoppingListOp, recipe: &Recipe) -> bool {
        match op {
            ShoppingListOp::Toggle(index) => self.toggle(index),
            ShoppingListOp::Archive(index) => self.archive(index),
            ShoppingListOp::RestoreAll => {
                self.restore_all();
                true
            }
            ShoppingListOp::Reset => {
                self.reset(recipe);
                true
            }
        }
    }

    pub fn has_hidden(&self) -> bool {
        self.items.iter().any(|item| item.is_hidden)
    }

    pub fn visible(&self) -> impl Iterator<Item = &ShoppingListItem> {
        self.items.iter().filter(|item| !item.is_hidden)
    }

    /// Plain-text export of the visible items.
    pub fn to_clipboard_text(&self, title: &str) -> String {
        let lines: Vec<String> = self
            .visible()
            .map(|item| {
                let check = if item.is_completed { "[v]" } else { "[ ]" };
                match item.measure.as_deref() {
                    Some(measure) if !measure.trim().is_empty() => {
                        format!("{check} {} ({measure})", item.text)
                    }
                    _ => format!("{check} {}", item.text),
                }
            })
            .collect();
        format!("{title} - shopping list:\n\n{}", lines.join("\n"))
    }
}
