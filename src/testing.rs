use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::api::RecipeApi;
use crate::error::ApiError;
use crate::recipe::{IngredientSlot, Recipe};

pub fn recipe(id: &str, name: &str, category: &str) -> Recipe {
    Recipe {
        id: id.to_owned(),
        name: name.to_owned(),
        category: category.to_owned(),
        ..Recipe::default()
    }
}

pub fn with_ingredients(mut recipe: Recipe, pairs: &[(&str, &str)]) -> Recipe {
    for (slot, (ingredient, measure)) in recipe.slots.iter_mut().zip(pairs) {
        *slot = IngredientSlot {
            ingredient: Some((*ingredient).to_owned()),
            measure: Some((*measure).to_owned()),
        };
    }
    recipe
}

fn decode_failure() -> ApiError {
    ApiError::Decode {
        endpoint: "fake".to_owned(),
        source: serde_json::from_str::<serde_json::Value>("{").unwrap_err(),
    }
}

/// In-memory [`RecipeApi`] that counts calls per endpoint.
#[derive(Default)]
pub struct FakeRecipeApi {
    letters: HashMap<char, Vec<Recipe>>,
    searches: HashMap<String, Vec<Recipe>>,
    categories: Vec<String>,
    failing_letters: HashSet<char>,
    fail_all: bool,
    calls: Mutex<HashMap<&'static str, usize>>,
}

impl FakeRecipeApi {
    pub fn with_letter(mut self, letter: char, recipes: Vec<Recipe>) -> Self {
        self.letters.insert(letter, recipes);
        self
    }

    pub fn with_search(mut self, term: &str, recipes: Vec<Recipe>) -> Self {
        self.searches.insert(term.to_owned(), recipes);
        self
    }

    pub fn with_categories(mut self, categories: &[&str]) -> Self {
        self.categories = categories.iter().map(|c| (*c).to_owned()).collect();
        self
    }

    pub fn failing_letter(mut self, letter: char) -> Self {
        self.failing_letters.insert(letter);
        self
    }

    pub fn failing_everything(mut self) -> Self {
        self.fail_all = true;
        self
    }

    pub fn calls(&self, endpoint: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .get(endpoint)
            .copied()
            .unwrap_or(0)
    }

    fn record(&self, endpoint: &'static str) -> Result<(), ApiError> {
        *self.calls.lock().unwrap().entry(endpoint).or_default() += 1;
        if self.fail_all {
            return Err(decode_failure());
        }
        Ok(())
    }

    fn all_recipes(&self) -> impl Iterator<Item = &Recipe> {
        self.letters
            .values()
            .chain(self.searches.values())
            .flatten()
    }
}

#[async_trait]
impl RecipeApi for FakeRecipeApi {
    async fn search_by_name(&self, term: &str) -> Result<Vec<Recipe>, ApiError> {
        self.record("search")?;
        Ok(self.searches.get(term).cloned().unwrap_or_default())
    }

    async fn lookup_by_id(&self, id: &str) -> Result<Option<Recipe>, ApiError> {
        self.record("lookup")?;
        Ok(self.all_recipes().find(|r| r.id == id).cloned())
    }

    async fn search_by_first_letter(&self, letter: char) -> Result<Vec<Recipe>, ApiError> {
        self.record("letter")?;
        if self.failing_letters.contains(&letter) {
            return Err(decode_failure());
        }
        Ok(self.letters.get(&letter).cloned().unwrap_or_default())
    }

    async fn list_categories(&self) -> Result<Vec<String>, ApiError> {
        self.record("categories")?;
        Ok(self.categories.clone())
    }

    async fn filter_by_category(&self, category: &str) -> Result<Vec<Recipe>, ApiError> {
        self.record("filter")?;
        Ok(self
            .all_recipes()
            .filter(|r| r.category == category)
            .cloned()
            .collect())
    }
}
