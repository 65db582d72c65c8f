use crate::error::UpstreamError;
use crate::model::CommonRecipe;
use crate::normalize::{fallback_to_common, MealRecord, MealsResponse};
use crate::providers::{endpoint, Operation, RecipeProvider};
use async_trait::async_trait;
use futures::future::join_all;
use log::{debug, info, warn};
use reqwest::Client;
use std::collections::HashSet;
use url::Url;

/// Secondary provider: TheMealDB free tier.
///
/// No authentication and no rate limit, but only single-ingredient filtering
/// and single-result random calls, so several operations fan out.
pub struct MealDbProvider {
    client: Client,
    base_url: Url,
}

impl MealDbProvider {
    pub fn new(client: Client, base_url: Url) -> Self {
        MealDbProvider { client, base_url }
    }

    async fn get(
        &self,
        file: &str,
        params: Vec<(&'static str, Option<String>)>,
    ) -> Result<Vec<MealRecord>, UpstreamError> {
        let url = endpoint(&self.base_url, &[file], &params);
        debug!("GET {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(UpstreamError::from_status(status.as_u16()));
        }

        // Meals are decoded one by one; only an unreadable envelope fails here
        let body: MealsResponse = serde_json::from_str(&text).unwrap_or_else(|e| {
            warn!("Unexpected {} payload: {}", file, e);
            MealsResponse::default()
        });
        Ok(body.into_meals())
    }

    async fn lookup(&self, id: &str) -> Result<Vec<CommonRecipe>, UpstreamError> {
        let meals = self.get("lookup.php", vec![("i", Some(id.to_string()))]).await?;
        Ok(meals.first().map(fallback_to_common).into_iter().collect())
    }

    /// `n` independent `random.php` calls; a failed call contributes nothing
    async fn random(&self, n: usize) -> Vec<CommonRecipe> {
        let calls = (0..n).map(|_| self.get("random.php", Vec::new()));
        let meals = join_all(calls)
            .await
            .into_iter()
            .flat_map(|result| {
                result.unwrap_or_else(|e| {
                    warn!("Dropping failed random.php call: {}", e);
                    Vec::new()
                })
            })
            .map(|meal| fallback_to_common(&meal));

        dedupe_by_id(meals)
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<CommonRecipe>, UpstreamError> {
        let meals = self.get("search.php", vec![("s", Some(query.to_string()))]).await?;
        Ok(meals.iter().take(limit).map(fallback_to_common).collect())
    }

    /// One `filter.php` call per term, union of ids in first-seen order,
    /// then one `lookup.php` per surviving id.
    async fn by_ingredients(&self, terms: &[String], limit: usize) -> Vec<CommonRecipe> {
        let filters = terms
            .iter()
            .map(|term| self.get("filter.php", vec![("i", Some(term.clone()))]));

        let mut seen = HashSet::new();
        let ids: Vec<String> = join_all(filters)
            .await
            .into_iter()
            .flat_map(|result| {
                result.unwrap_or_else(|e| {
                    warn!("Dropping failed filter.php call: {}", e);
                    Vec::new()
                })
            })
            .filter_map(|meal| meal.id_meal)
            .filter(|id| seen.insert(id.clone()))
            .take(limit)
            .collect();

        let lookups = ids.iter().map(|id| async move {
            match self.lookup(id).await {
                Ok(recipes) => recipes.into_iter().next(),
                Err(e) => {
                    warn!("Dropping failed lookup of meal {}: {}", id, e);
                    None
                }
            }
        });

        join_all(lookups).await.into_iter().flatten().collect()
    }
}

fn dedupe_by_id(recipes: impl Iterator<Item = CommonRecipe>) -> Vec<CommonRecipe> {
    let mut seen = HashSet::new();
    recipes.filter(|r| seen.insert(r.id.clone())).collect()
}

#[async_trait]
impl RecipeProvider for MealDbProvider {
    fn provider_name(&self) -> &str {
        "mealdb"
    }

    async fn execute(&self, op: &Operation) -> Result<Vec<CommonRecipe>, UpstreamError> {
        let recipes = match op {
            Operation::Lookup(id) => self.lookup(id).await?,
            // No sorted search here; a random request is a random request
            Operation::Random(n) | Operation::RandomSearch(n) => self.random(*n).await,
            // No cuisine parameter on search.php
            Operation::Search { query, limit, .. } => self.search(query, *limit).await?,
            Operation::Ingredients { terms, limit } => self.by_ingredients(terms, *limit).await,
        };
        info!("mealdb answered {:?} with {} recipes", op, recipes.len());
        Ok(recipes)
    }
}
