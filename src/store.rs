use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::StreamExt as _;
use futures::stream;

use crate::api::RecipeApi;
use crate::error::ApiError;
use crate::recipe::Recipe;

/// Starting letters the API can be browsed by, in fetch order.
pub const ALPHABET: [char; 26] = [
    'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's',
    't', 'u', 'v', 'w', 'x', 'y', 'z',
];

/// Letters fetched for the first paint, before progressive loading catches up.
pub const INITIAL_LETTERS: [char; 3] = ['a', 'b', 'c'];

pub const DEFAULT_BATCH_SIZE: usize = 5;

#[derive(Debug, Default)]
struct Caches {
    recipes: HashMap<String, Recipe>,
    letters: HashMap<char, Vec<Recipe>>,
    categories: Option<Vec<String>>,
    all_recipes: Option<Vec<Recipe>>,
}

impl Caches {
    fn remember(&mut self, recipes: &[Recipe]) {
        for recipe in recipes {
            self.recipes.insert(recipe.id.clone(), recipe.clone());
        }
    }
}

/// Caching front for a [`RecipeApi`].
///
/// Caches live as long as the store and are never invalidated except by
/// [`RecipeStore::clear_all`]. None of the public lookups fail: remote errors
/// are logged and surface as empty results.
pub struct RecipeStore {
    api: Arc<dyn RecipeApi>,
    caches: Mutex<Caches>,
}

impl RecipeStore {
    pub fn new(api: Arc<dyn RecipeApi>) -> Self {
        Self {
            api,
            caches: Mutex::new(Caches::default()),
        }
    }

    fn caches(&self) -> MutexGuard<'_, Caches> {
        self.caches.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Searches by name. A blank term falls back to the initial recipes.
    pub async fn search_by_name(&self, term: &str) -> Vec<Recipe> {
        if term.trim().is_empty() {
            return self.get_initial_recipes().await;
        }

        match self.api.search_by_name(term).await {
            Ok(recipes) => {
                self.caches().remember(&recipes);
                recipes
            }
            Err(err) => {
                tracing::warn!(term, kind = err.kind(), %err, "search by name failed");
                Vec::new()
            }
        }
    }

    pub async fn get_by_id(&self, id: &str) -> Option<Recipe> {
        if let Some(recipe) = self.caches().recipes.get(id) {
            return Some(recipe.clone());
        }

        match self.api.lookup_by_id(id).await {
            Ok(Some(recipe)) => {
                self.caches().recipes.insert(id.to_owned(), recipe.clone());
                Some(recipe)
            }
            Ok(None) => {
                tracing::debug!(id, "recipe not found");
                None
            }
            Err(err) => {
                tracing::warn!(id, kind = err.kind(), %err, "lookup by id failed");
                None
            }
        }
    }

    pub async fn get_by_starting_letter(&self, letter: char) -> Vec<Recipe> {
        match self.try_get_by_starting_letter(letter).await {
            Ok(recipes) => recipes,
            Err(err) => {
                tracing::warn!(%letter, kind = err.kind(), %err, "fetch by letter failed");
                Vec::new()
            }
        }
    }

    /// Like [`RecipeStore::get_by_starting_letter`] but reports the failure.
    /// Failed letters are not cached.
    pub async fn try_get_by_starting_letter(&self, letter: char) -> Result<Vec<Recipe>, ApiError> {
        let letter = letter.to_ascii_lowercase();
        if let Some(recipes) = self.caches().letters.get(&letter) {
            return Ok(recipes.clone());
        }

        let recipes = self.api.search_by_first_letter(letter).await?;
        let mut caches = self.caches();
        caches.remember(&recipes);
        caches.letters.insert(letter, recipes.clone());
        Ok(recipes)
    }

    /// An empty list is not cached, so the next call asks again.
    pub async fn get_categories(&self) -> Vec<String> {
        if let Some(categories) = &self.caches().categories {
            return categories.clone();
        }

        match self.api.list_categories().await {
            Ok(categories) => {
                if !categories.is_empty() {
                    self.caches().categories = Some(categories.clone());
                }
                categories
            }
            Err(err) => {
                tracing::warn!(kind = err.kind(), %err, "list categories failed");
                Vec::new()
            }
        }
    }

    /// Recipes in a category. The API only returns id, name and thumbnail here.
    pub async fn filter_by_category(&self, category: &str) -> Vec<Recipe> {
        match self.api.filter_by_category(category).await {
            Ok(recipes) => {
                self.caches().remember(&recipes);
                recipes
            }
            Err(err) => {
                tracing::warn!(category, kind = err.kind(), %err, "filter by category failed");
                Vec::new()
            }
        }
    }

    /// Fetches [`INITIAL_LETTERS`] concurrently and concatenates them in letter order.
    pub async fn get_initial_recipes(&self) -> Vec<Recipe> {
        let fetches = INITIAL_LETTERS
            .iter()
            .map(|letter| self.get_by_starting_letter(*letter));
        futures::future::join_all(fetches)
            .await
            .into_iter()
            .flatten()
            .collect()
    }

    /// Loads every letter in sequential batches of `batch_size` concurrent
    /// fetches, reporting percentage progress after each batch.
    pub async fn load_all_batched<F>(&self, batch_size: usize, mut on_progress: F) -> Vec<Recipe>
    where
        F: FnMut(f64),
    {
        if let Some(all) = &self.caches().all_recipes {
            on_progress(100.0);
            return all.clone();
        }

        let batch_size = batch_size.max(1);
        let mut all = Vec::new();
        let mut completed = 0usize;

        for batch in ALPHABET.chunks(batch_size) {
            let results: Vec<Vec<Recipe>> = stream::iter(batch.iter().copied())
                .map(|letter| self.get_by_starting_letter(letter))
                .buffered(batch.len())
                .collect()
                .await;
            for recipes in results {
                all.extend(recipes);
            }

            completed += batch.len();
            on_progress(completed as f64 / ALPHABET.len() as f64 * 100.0);
        }

        self.caches().all_recipes = Some(all.clone());
        all
    }

    pub fn clear_all(&self) {
        *self.caches() = Caches::default();
    }
}
