use crate::model::{CommonRecipe, IngredientLine, RecipeSource};
use crate::normalize::{each, lenient, non_empty, strip_html};
use serde::Deserialize;

/// Recipe record as returned by `/recipes/{id}/information`, `/recipes/random`,
/// `/recipes/informationBulk` and `complexSearch` with `addRecipeInformation`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SpoonacularRecipe {
    #[serde(deserialize_with = "lenient")]
    pub id: Option<u64>,
    #[serde(deserialize_with = "lenient")]
    pub title: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub image: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub ready_in_minutes: Option<u32>,
    #[serde(deserialize_with = "lenient")]
    pub servings: Option<u32>,
    #[serde(deserialize_with = "each")]
    pub cuisines: Vec<String>,
    #[serde(deserialize_with = "each")]
    pub dish_types: Vec<String>,
    #[serde(deserialize_with = "each")]
    pub extended_ingredients: Vec<SpoonacularIngredient>,
    #[serde(deserialize_with = "each")]
    pub analyzed_instructions: Vec<AnalyzedInstruction>,
    #[serde(deserialize_with = "lenient")]
    pub instructions: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SpoonacularIngredient {
    #[serde(deserialize_with = "lenient")]
    pub name: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub original: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub amount: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    pub unit: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AnalyzedInstruction {
    #[serde(deserialize_with = "each")]
    pub steps: Vec<InstructionStep>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct InstructionStep {
    #[serde(deserialize_with = "lenient")]
    pub number: Option<u32>,
    #[serde(deserialize_with = "lenient")]
    pub step: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ComplexSearchResponse {
    #[serde(deserialize_with = "each")]
    pub results: Vec<SpoonacularRecipe>,
    #[serde(deserialize_with = "lenient")]
    pub total_results: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RandomResponse {
    #[serde(deserialize_with = "each")]
    pub recipes: Vec<SpoonacularRecipe>,
}

/// Entry of the `/recipes/findByIngredients` array
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IngredientMatch {
    #[serde(deserialize_with = "lenient")]
    pub id: Option<u64>,
    #[serde(deserialize_with = "lenient")]
    pub title: Option<String>,
    #[serde(deserialize_with = "lenient")]
    pub used_ingredient_count: Option<u32>,
    #[serde(deserialize_with = "lenient")]
    pub missed_ingredient_count: Option<u32>,
}

/// Convert a primary-provider recipe into a [`CommonRecipe`]
pub fn to_common(recipe: &SpoonacularRecipe) -> CommonRecipe {
    CommonRecipe {
        id: recipe.id.map(|id| id.to_string()).unwrap_or_default(),
        source: RecipeSource::Api,
        title: non_empty(recipe.title.as_deref()).unwrap_or_else(|| "Untitled".to_string()),
        image: non_empty(recipe.image.as_deref()),
        category: recipe.dish_types.first().and_then(|d| non_empty(Some(d))),
        area: recipe.cuisines.first().and_then(|c| non_empty(Some(c))),
        ingredients: recipe
            .extended_ingredients
            .iter()
            .map(|ingredient| IngredientLine {
                name: ingredient.name.clone().unwrap_or_default(),
                measure: measure(ingredient),
            })
            .collect(),
        instructions: instructions(recipe),
        minutes: recipe.ready_in_minutes,
        servings: recipe.servings,
    }
}

fn measure(ingredient: &SpoonacularIngredient) -> Option<String> {
    if let Some(original) = non_empty(ingredient.original.as_deref()) {
        return Some(original);
    }

    let parts: Vec<String> = [
        ingredient.amount.map(|a| a.to_string()),
        non_empty(ingredient.unit.as_deref()),
        non_empty(ingredient.name.as_deref()),
    ]
    .into_iter()
    .flatten()
    .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

fn instructions(recipe: &SpoonacularRecipe) -> Option<String> {
    let steps: Vec<String> = recipe
        .analyzed_instructions
        .first()
        .map(|block| {
            block
                .steps
                .iter()
                .filter_map(|s| non_empty(s.step.as_deref()))
                .collect()
        })
        .unwrap_or_default();

    if !steps.is_empty() {
        return Some(steps.join("\n"));
    }

    recipe
        .instructions
        .as_deref()
        .map(strip_html)
        .filter(|text| !text.is_empty())
}
