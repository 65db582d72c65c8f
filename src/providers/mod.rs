mod mealdb;
mod spoonacular;

pub use mealdb::MealDbProvider;
pub use spoonacular::SpoonacularProvider;

use crate::error::UpstreamError;
use crate::model::CommonRecipe;
use async_trait::async_trait;
use url::Url;

/// One query shape a provider can answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Fetch a single recipe by provider id
    Lookup(String),
    /// `n` random recipes from the provider's random endpoint
    Random(usize),
    /// `n` random recipes obtained through a randomly sorted search
    RandomSearch(usize),
    /// Free-text search by recipe name
    Search {
        query: String,
        area: Option<String>,
        limit: usize,
    },
    /// Recipes using any of the given ingredient terms
    Ingredients { terms: Vec<String>, limit: usize },
}

/// Unified trait for upstream recipe providers
#[async_trait]
pub trait RecipeProvider: Send + Sync {
    /// Get the provider name (e.g., "spoonacular", "mealdb")
    fn provider_name(&self) -> &str;

    /// Run one operation and return normalized recipes
    async fn execute(&self, op: &Operation) -> Result<Vec<CommonRecipe>, UpstreamError>;
}

/// Build `base/segments...?params`, percent-encoding every segment and value.
/// Parameters keep their order; `None` values are omitted.
pub(crate) fn endpoint(base: &Url, segments: &[&str], params: &[(&str, Option<String>)]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }

    let present: Vec<(&str, &str)> = params
        .iter()
        .filter_map(|(key, value)| value.as_deref().map(|v| (*key, v)))
        .collect();
    if !present.is_empty() {
        url.query_pairs_mut().extend_pairs(present);
    }
    url
}
