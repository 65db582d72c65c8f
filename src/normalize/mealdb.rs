use crate::model::{CommonRecipe, IngredientLine, RecipeSource};
use crate::normalize::{each, non_empty, string_or_number};
use serde::Deserialize;
use serde_json::{Map, Value};

/// TheMealDB encodes at most this many ingredient/measure pairs per meal
pub const MAX_INGREDIENTS: usize = 20;

/// Envelope shared by every TheMealDB endpoint; `meals` is `null` when nothing matched
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MealsResponse {
    #[serde(deserialize_with = "each")]
    pub meals: Vec<MealRecord>,
}

impl MealsResponse {
    pub fn into_meals(self) -> Vec<MealRecord> {
        self.meals
    }
}

/// A meal record. `filter.php` only fills id, name and thumbnail.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MealRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub id_meal: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub str_meal: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub str_meal_thumb: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub str_category: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub str_area: Option<String>,
    #[serde(deserialize_with = "string_or_number")]
    pub str_instructions: Option<String>,
    /// `strIngredientN` / `strMeasureN` and any other flat fields
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl MealRecord {
    fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }
}

/// Convert a fallback-provider meal into a [`CommonRecipe`]
pub fn fallback_to_common(meal: &MealRecord) -> CommonRecipe {
    let ingredients = (1..=MAX_INGREDIENTS)
        .filter_map(|i| {
            let name = non_empty(meal.field(&format!("strIngredient{}", i)))?;
            Some(IngredientLine {
                name,
                measure: non_empty(meal.field(&format!("strMeasure{}", i))),
            })
        })
        .collect();

    CommonRecipe {
        id: meal.id_meal.clone().unwrap_or_default(),
        source: RecipeSource::Api,
        title: non_empty(meal.str_meal.as_deref()).unwrap_or_else(|| "Untitled".to_string()),
        image: non_empty(meal.str_meal_thumb.as_deref()),
        category: non_empty(meal.str_category.as_deref()),
        area: non_empty(meal.str_area.as_deref()),
        ingredients,
        instructions: meal.str_instructions.as_deref().and_then(instructions),
        minutes: None,
        servings: None,
    }
}

// Blank lines are dropped, so paragraph breaks do not survive
fn instructions(raw: &str) -> Option<String> {
    let lines: Vec<&str> = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}
