use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Context as _;

use crate::recipe::Recipe;
use crate::storage::KeyValueStore;

/// Storage key the selected recipes are persisted under.
pub const SELECTION_KEY: &str = "selectedRecipes";

/// The user's chosen recipes, unique by id, in selection order.
///
/// Every mutation is written to storage before the in-memory list changes,
/// so a failed write leaves the selection as it was.
pub struct SelectionStore {
    storage: Arc<dyn KeyValueStore>,
    recipes: Vec<Recipe>,
}

impl SelectionStore {
    /// Loads the persisted selection. Missing or unreadable data yields an empty one.
    pub fn open(storage: Arc<dyn KeyValueStore>) -> Self {
        let recipes = load(storage.as_ref());
        tracing::debug!(count = recipes.len(), "loaded selection");
        Self { storage, recipes }
    }

    pub fn recipes(&self) -> &[Recipe] {
        &self.recipes
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// The stored copy of a selected recipe.
    pub fn get(&self, id: &str) -> Option<&Recipe> {
        self.recipes.iter().find(|r| r.id == id)
    }

    /// Removes the recipe if selected, appends it otherwise.
    /// Returns whether it is selected afterwards.
    pub fn toggle(&mut self, recipe: &Recipe) -> anyhow::Result<bool> {
        let selected = self.is_selected(&recipe.id);
        let updated: Vec<Recipe> = if selected {
            self.recipes
                .iter()
                .filter(|r| r.id != recipe.id)
                .cloned()
                .collect()
        } else {
            let mut updated = self.recipes.clone();
            updated.push(recipe.clone());
            updated
        };

        self.persist(&updated)
            .with_context(|| format!("persist selection after toggling {}", recipe.id))?;
        self.recipes = updated;
        Ok(!selected)
    }

    pub fn clear(&mut self) -> anyhow::Result<()> {
        self.persist(&[]).context("persist cleared selection")?;
        self.recipes.clear();
        Ok(())
    }

    fn persist(&self, recipes: &[Recipe]) -> anyhow::Result<()> {
        let json = serde_json::to_string(recipes).context("serialize selection")?;
        self.storage.set(SELECTION_KEY, &json)
    }
}

fn load(storage: &dyn KeyValueStore) -> Vec<Recipe> {
    let raw = match storage.get(SELECTION_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(err) => {
            tracing::warn!(?err, "read stored selection failed; starting empty");
            return Vec::new();
        }
    };

    let stored: Vec<Recipe> = match serde_json::from_str(&raw) {
        Ok(stored) => stored,
        Err(err) => {
            tracing::warn!(%err, "stored selection is corrupt; starting empty");
            return Vec::new();
        }
    };

    let mut seen = HashSet::new();
    stored
        .into_iter()
        .filter(|recipe| seen.insert(recipe.id.clone()))
        .collect()
}
