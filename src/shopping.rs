use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::recipe::Recipe;

/// One shopping-list line: an ingredient merged across recipes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngredientAggregate {
    /// Casing of the first occurrence.
    pub name: String,
    pub measures: Vec<String>,
    pub recipes: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ShoppingList {
    pub ingredients: Vec<IngredientAggregate>,
    pub recipe_count: usize,
    /// Non-blank ingredient slots across all recipes, duplicates included.
    pub ingredient_instances: usize,
    pub unique_ingredients: usize,
}

impl ShoppingList {
    pub fn from_recipes(recipes: &[Recipe]) -> Self {
        let mut ingredients: Vec<IngredientAggregate> = Vec::new();
        let mut index_by_key: HashMap<String, usize> = HashMap::new();
        let mut instances = 0usize;

        for recipe in recipes {
            for (name, measure) in recipe.ingredients() {
                instances += 1;

                let key = name.to_lowercase();
                let idx = *index_by_key.entry(key).or_insert_with(|| {
                    ingredients.push(IngredientAggregate {
                        name: name.to_owned(),
                        measures: Vec::new(),
                        recipes: Vec::new(),
                    });
                    ingredients.len() - 1
                });

                let entry = &mut ingredients[idx];
                if !measure.is_empty() && !entry.measures.iter().any(|m| m == measure) {
                    entry.measures.push(measure.to_owned());
                }
                if !entry.recipes.iter().any(|r| r == &recipe.name) {
                    entry.recipes.push(recipe.name.clone());
                }
            }
        }

        Self {
            unique_ingredients: ingredients.len(),
            ingredients,
            recipe_count: recipes.len(),
            ingredient_instances: instances,
        }
    }

    pub fn get(&self, name: &str) -> Option<&IngredientAggregate> {
        let key = name.trim().to_lowercase();
        self.ingredients
            .iter()
            .find(|entry| entry.name.to_lowercase() == key)
    }
}

/// Ingredients ticked off while shopping. Session-only, case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct CheckedIngredients {
    names: HashSet<String>,
}

impl CheckedIngredients {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether the ingredient is checked afterwards.
    pub fn toggle(&mut self, name: &str) -> bool {
        let key = name.trim().to_lowercase();
        if self.names.remove(&key) {
            false
        } else {
            self.names.insert(key);
            true
        }
    }

    pub fn is_checked(&self, name: &str) -> bool {
        self.names.contains(&name.trim().to_lowercase())
    }

    pub fn clear(&mut self) {
        self.names.clear();
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
