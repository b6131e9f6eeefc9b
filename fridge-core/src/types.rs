//! Recipe data model.
//!
//! TheMealDB describes a meal with up to twenty numbered `strIngredientN` /
//! `strMeasureN` pairs. [`Recipe`] folds those into one ordered list of
//! [`IngredientLine`]s and writes them back out in the same shape.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Highest numbered ingredient slot TheMealDB uses.
pub const MAX_INGREDIENT_SLOTS: u8 = 20;

/// Category presented to the classifier when a recipe has none.
pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// One used ingredient slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientLine {
    /// 1-based slot number from the source record.
    pub position: u8,
    pub ingredient: String,
    pub measure: Option<String>,
}

/// A recipe as returned by the recipe database.
///
/// Rows from the multi-ingredient filter endpoint only carry id, title and
/// thumbnail; the remaining fields are empty until a full lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "MealRecord", into = "MealRecord")]
pub struct Recipe {
    pub id: String,
    pub title: String,
    pub thumbnail_url: Option<String>,
    pub category: Option<String>,
    pub area: Option<String>,
    pub instructions: Option<String>,
    pub tags: Option<String>,
    pub youtube_url: Option<String>,
    pub source_url: Option<String>,
    pub ingredients: Vec<IngredientLine>,
}

impl Recipe {
    /// Category name, or "Unknown" when the source omitted it.
    pub fn category_or_unknown(&self) -> &str {
        self.category
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(UNKNOWN_CATEGORY)
    }

    /// Comma-separated ingredient names, or `None` when the record has none.
    pub fn ingredients_text(&self) -> Option<String> {
        if self.ingredients.is_empty() {
            return None;
        }
        Some(
            self.ingredients
                .iter()
                .map(|line| line.ingredient.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        )
    }
}

/// Wire shape of a TheMealDB meal.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct MealRecord {
    #[serde(rename = "idMeal", deserialize_with = "string_or_number")]
    id: String,
    #[serde(rename = "strMeal", default)]
    title: String,
    #[serde(rename = "strMealThumb", default, skip_serializing_if = "Option::is_none")]
    thumbnail: Option<String>,
    #[serde(rename = "strCategory", default, skip_serializing_if = "Option::is_none")]
    category: Option<String>,
    #[serde(rename = "strArea", default, skip_serializing_if = "Option::is_none")]
    area: Option<String>,
    #[serde(rename = "strInstructions", default, skip_serializing_if = "Option::is_none")]
    instructions: Option<String>,
    #[serde(rename = "strTags", default, skip_serializing_if = "Option::is_none")]
    tags: Option<String>,
    #[serde(rename = "strYoutube", default, skip_serializing_if = "Option::is_none")]
    youtube: Option<String>,
    #[serde(rename = "strSource", default, skip_serializing_if = "Option::is_none")]
    source: Option<String>,
    /// Numbered ingredient/measure slots plus anything else the API sends.
    #[serde(flatten)]
    rest: Map<String, Value>,
}

fn non_blank(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

impl From<MealRecord> for Recipe {
    fn from(record: MealRecord) -> Self {
        let ingredients = (1..=MAX_INGREDIENT_SLOTS)
            .filter_map(|position| {
                let ingredient = non_blank(record.rest.get(&format!("strIngredient{position}")))?;
                let measure = non_blank(record.rest.get(&format!("strMeasure{position}")));
                Some(IngredientLine {
                    position,
                    ingredient,
                    measure,
                })
            })
            .collect();

        Recipe {
            id: record.id,
            title: record.title,
            thumbnail_url: record.thumbnail,
            category: record.category,
            area: record.area,
            instructions: record.instructions,
            tags: record.tags,
            youtube_url: record.youtube,
            source_url: record.source,
            ingredients,
        }
    }
}

impl From<Recipe> for MealRecord {
    fn from(recipe: Recipe) -> Self {
        let mut rest = Map::new();
        for line in recipe.ingredients {
            rest.insert(
                format!("strIngredient{}", line.position),
                Value::String(line.ingredient),
            );
            if let Some(measure) = line.measure {
                rest.insert(format!("strMeasure{}", line.position), Value::String(measure));
            }
        }

        MealRecord {
            id: recipe.id,
            title: recipe.title,
            thumbnail: recipe.thumbnail_url,
            category: recipe.category,
            area: recipe.area,
            instructions: recipe.instructions,
            tags: recipe.tags,
            youtube: recipe.youtube_url,
            source: recipe.source_url,
            rest,
        }
    }
}

/// Accept ids sent either as JSON strings or numbers.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

static NEXT_RESULT_SET_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a published result set.
///
/// Every call to [`ResultSet::new`] allocates a fresh id, so two sets compare
/// equal only when one is a clone of the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResultSetId(u64);

impl ResultSetId {
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Ordered recipes returned by one search, in API order.
#[derive(Debug, Clone)]
pub struct ResultSet {
    id: ResultSetId,
    recipes: Arc<[Recipe]>,
}

impl ResultSet {
    pub fn new(recipes: Vec<Recipe>) -> Self {
        Self {
            id: ResultSetId(NEXT_RESULT_SET_ID.fetch_add(1, Ordering::Relaxed)),
            recipes: recipes.into(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn id(&self) -> ResultSetId {
        self.id
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
}

impl Default for ResultSet {
    fn default() -> Self {
        Self::empty()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sparse_ingredients_become_ordered_lines() {
        let recipe: Recipe = serde_json::from_value(json!({
            "idMeal": "52772",
            "strMeal": "Teriyaki Chicken Casserole",
            "strCategory": "Chicken",
            "strIngredient1": "soy sauce",
            "strMeasure1": "3/4 cup",
            "strIngredient2": "",
            "strMeasure2": "",
            "strIngredient3": "brown sugar",
            "strMeasure3": null,
            "strIngredient4": null,
            "strIngredient5": "  garlic ",
            "strMeasure5": "2 cloves",
            "dateModified": null
        }))
        .unwrap();

        assert_eq!(recipe.id, "52772");
        assert_eq!(recipe.ingredients.len(), 3);
        assert_eq!(recipe.ingredients[0].position, 1);
        assert_eq!(recipe.ingredients[1].ingredient, "brown sugar");
        assert_eq!(recipe.ingredients[1].measure, None);
        assert_eq!(recipe.ingredients[2].position, 5);
        assert_eq!(recipe.ingredients[2].ingredient, "garlic");
        assert_eq!(
            recipe.ingredients_text().as_deref(),
            Some("soy sauce, brown sugar, garlic")
        );
    }

    #[test]
    fn test_filter_projection_has_no_ingredients() {
        let recipe: Recipe = serde_json::from_value(json!({
            "strMeal": "Shakshuka",
            "strMealThumb": "https://example.com/shakshuka.jpg",
            "idMeal": 52963
        }))
        .unwrap();

        assert_eq!(recipe.id, "52963");
        assert_eq!(recipe.category_or_unknown(), "Unknown");
        assert!(recipe.ingredients_text().is_none());
    }

    #[test]
    fn test_serializes_back_to_numbered_fields() {
        let recipe = fixtures::meal("1", "Tomato Soup", "Vegetarian");
        let value = serde_json::to_value(&recipe).unwrap();

        assert_eq!(value["idMeal"], "1");
        assert_eq!(value["strMeal"], "Tomato Soup");
        assert_eq!(value["strIngredient1"], "Tomato");
        assert_eq!(value["strMeasure1"], "2");

        let back: Recipe = serde_json::from_value(value).unwrap();
        assert_eq!(back, recipe);
    }

    #[test]
    fn test_result_set_identity() {
        let a = ResultSet::new(vec![fixtures::meal("1", "Soup", "Vegetarian")]);
        let b = ResultSet::new(a.recipes().to_vec());
        assert_ne!(a.id(), b.id());
        assert_eq!(a.clone().id(), a.id());
        assert_ne!(ResultSet::empty().id(), ResultSet::empty().id());
    }
}
