use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Number of numbered `strIngredientN` / `strMeasureN` pairs on the wire.
pub const INGREDIENT_SLOTS: usize = 20;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngredientSlot {
    pub ingredient: Option<String>,
    pub measure: Option<String>,
}

/// A recipe as returned by the remote API. Immutable once fetched.
///
/// Serializes back to the exact wire shape (`idMeal`, `strMeal`, ...,
/// `strIngredient1..20`, `strMeasure1..20`) so persisted selections stay
/// readable by anything speaking the API's schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WireRecipe", into = "WireRecipe")]
pub struct Recipe {
    pub id: String,
    pub name: String,
    pub category: String,
    pub area: String,
    pub thumbnail: String,
    pub instructions: String,
    pub tags: Option<String>,
    pub youtube: Option<String>,
    pub source: Option<String>,
    pub slots: [IngredientSlot; INGREDIENT_SLOTS],
}

impl Recipe {
    /// Non-blank ingredients with their (possibly empty) measures, trimmed.
    pub fn ingredients(&self) -> impl Iterator<Item = (&str, &str)> {
        self.slots.iter().filter_map(|slot| {
            let ingredient = non_blank(slot.ingredient.as_deref())?;
            let measure = non_blank(slot.measure.as_deref()).unwrap_or("");
            Some((ingredient, measure))
        })
    }

    pub fn tags(&self) -> Vec<&str> {
        self.tags
            .as_deref()
            .map(|tags| {
                tags.split(',')
                    .map(str::trim)
                    .filter(|tag| !tag.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn youtube_url(&self) -> Option<&str> {
        non_blank(self.youtube.as_deref())
    }

    pub fn source_url(&self) -> Option<&str> {
        non_blank(self.source.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[derive(Debug, Serialize, Deserialize)]
struct WireRecipe {
    #[serde(rename = "idMeal")]
    id: String,
    #[serde(rename = "strMeal", default)]
    name: Option<String>,
    #[serde(rename = "strCategory", default)]
    category: Option<String>,
    #[serde(rename = "strArea", default)]
    area: Option<String>,
    #[serde(rename = "strMealThumb", default)]
    thumbnail: Option<String>,
    #[serde(rename = "strInstructions", default)]
    instructions: Option<String>,
    #[serde(rename = "strTags", default)]
    tags: Option<String>,
    #[serde(rename = "strYoutube", default)]
    youtube: Option<String>,
    #[serde(rename = "strSource", default)]
    source: Option<String>,
    #[serde(flatten)]
    rest: BTreeMap<String, Value>,
}

fn ingredient_key(n: usize) -> String {
    format!("strIngredient{n}")
}

fn measure_key(n: usize) -> String {
    format!("strMeasure{n}")
}

impl From<WireRecipe> for Recipe {
    fn from(wire: WireRecipe) -> Self {
        let mut slots: [IngredientSlot; INGREDIENT_SLOTS] = Default::default();
        for (idx, slot) in slots.iter_mut().enumerate() {
            let n = idx + 1;
            slot.ingredient = wire
                .rest
                .get(&ingredient_key(n))
                .and_then(Value::as_str)
                .map(str::to_owned);
            slot.measure = wire
                .rest
                .get(&measure_key(n))
                .and_then(Value::as_str)
                .map(str::to_owned);
        }

        Self {
            id: wire.id,
            name: wire.name.unwrap_or_default(),
            category: wire.category.unwrap_or_default(),
            area: wire.area.unwrap_or_default(),
            thumbnail: wire.thumbnail.unwrap_or_default(),
            instructions: wire.instructions.unwrap_or_default(),
            tags: wire.tags,
            youtube: wire.youtube,
            source: wire.source,
            slots,
        }
    }
}

impl From<Recipe> for WireRecipe {
    fn from(recipe: Recipe) -> Self {
        let mut rest = BTreeMap::new();
        for (idx, slot) in recipe.slots.into_iter().enumerate() {
            let n = idx + 1;
            rest.insert(
                ingredient_key(n),
                slot.ingredient.map_or(Value::Null, Value::String),
            );
            rest.insert(
                measure_key(n),
                slot.measure.map_or(Value::Null, Value::String),
            );
        }

        Self {
            id: recipe.id,
            name: Some(recipe.name),
            category: Some(recipe.category),
            area: Some(recipe.area),
            thumbnail: Some(recipe.thumbnail),
            instructions: Some(recipe.instructions),
            tags: recipe.tags,
            youtube: recipe.youtube,
            source: recipe.source,
            rest,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    #[serde(rename = "strCategory")]
    pub name: String,
}

/// Envelope of every meals-returning endpoint. `null` means no match.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MealsResponse {
    #[serde(default)]
    pub meals: Option<Vec<Recipe>>,
}

impl MealsResponse {
    pub fn into_recipes(self) -> Vec<Recipe> {
        self.meals.unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoriesResponse {
    #[serde(default)]
    pub categories: Option<Vec<Category>>,
}
