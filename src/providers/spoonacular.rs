use crate::cache::CacheStore;
use crate::error::UpstreamError;
use crate::model::CommonRecipe;
use crate::normalize::spoonacular::{
    ComplexSearchResponse, IngredientMatch, RandomResponse, SpoonacularRecipe,
};
use crate::normalize::{decode_each, to_common};
use crate::providers::{endpoint, Operation, RecipeProvider};
use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Primary provider: Spoonacular served through RapidAPI.
///
/// Every successful response is cached by its full URL; a cached payload is
/// returned without touching the network.
pub struct SpoonacularProvider {
    client: Client,
    base_url: Url,
    api_key: String,
    host: String,
    cache: Arc<dyn CacheStore>,
    ttl: Duration,
}

impl SpoonacularProvider {
    pub fn new(
        client: Client,
        base_url: Url,
        api_key: String,
        host: String,
        cache: Arc<dyn CacheStore>,
        ttl: Duration,
    ) -> Self {
        SpoonacularProvider {
            client,
            base_url,
            api_key,
            host,
            cache,
            ttl,
        }
    }

    /// Authenticated, cached GET decoded into `T`
    async fn upstream<T>(
        &self,
        segments: &[&str],
        params: &[(&str, Option<String>)],
    ) -> Result<T, UpstreamError>
    where
        T: DeserializeOwned + Default,
    {
        Ok(decode(self.fetch(segments, params).await?))
    }

    /// Authenticated, cached GET of an endpoint answering with a JSON array
    async fn upstream_list<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        params: &[(&str, Option<String>)],
    ) -> Result<Vec<T>, UpstreamError> {
        Ok(decode_each(self.fetch(segments, params).await?))
    }

    async fn fetch(
        &self,
        segments: &[&str],
        params: &[(&str, Option<String>)],
    ) -> Result<Value, UpstreamError> {
        let url = endpoint(&self.base_url, segments, params);
        let key = url.to_string();

        if let Some(cached) = self.cache.get(&key) {
            debug!("Cache hit: {}", key);
            return Ok(cached);
        }

        debug!("GET {}", key);
        let response = self
            .client
            .get(url)
            .header("x-rapidapi-key", &self.api_key)
            .header("x-rapidapi-host", &self.host)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(UpstreamError::from_status(status.as_u16()));
        }

        let body = serde_json::from_str::<Value>(&text)
            .ok()
            .filter(|v| !v.is_null())
            .unwrap_or_else(|| Value::Object(Default::default()));
        self.cache.put(&key, body.clone(), self.ttl);
        Ok(body)
    }

    async fn lookup(&self, id: &str) -> Result<Vec<CommonRecipe>, UpstreamError> {
        let recipe: SpoonacularRecipe = self
            .upstream(
                &["recipes", id, "information"],
                &[("includeNutrition", Some("false".to_string()))],
            )
            .await?;

        Ok(recipe.id.map(|_| to_common(&recipe)).into_iter().collect())
    }

    async fn random(&self, n: usize) -> Result<Vec<CommonRecipe>, UpstreamError> {
        let response: RandomResponse = self
            .upstream(&["recipes", "random"], &[("number", Some(n.to_string()))])
            .await?;
        Ok(response.recipes.iter().map(to_common).collect())
    }

    async fn random_search(&self, n: usize) -> Result<Vec<CommonRecipe>, UpstreamError> {
        let response: ComplexSearchResponse = self
            .upstream(
                &["recipes", "complexSearch"],
                &[
                    ("sort", Some("random".to_string())),
                    ("number", Some(n.to_string())),
                    ("addRecipeInformation", Some("true".to_string())),
                    ("fillIngredients", Some("true".to_string())),
                ],
            )
            .await?;
        Ok(response.results.iter().map(to_common).collect())
    }

    async fn search(
        &self,
        query: &str,
        area: Option<&str>,
        limit: usize,
    ) -> Result<Vec<CommonRecipe>, UpstreamError> {
        let response: ComplexSearchResponse = self
            .upstream(
                &["recipes", "complexSearch"],
                &[
                    ("query", Some(query.to_string())),
                    ("cuisine", area.map(str::to_string)),
                    ("number", Some(limit.to_string())),
                    ("addRecipeInformation", Some("true".to_string())),
                    ("fillIngredients", Some("true".to_string())),
                ],
            )
            .await?;
        debug!(
            "complexSearch '{}' matched {:?} recipes",
            query, response.total_results
        );
        Ok(response.results.iter().map(to_common).collect())
    }

    /// `findByIngredients` only returns ids and ingredient counts, so full
    /// records are fetched with one `informationBulk` call.
    async fn by_ingredients(
        &self,
        terms: &[String],
        limit: usize,
    ) -> Result<Vec<CommonRecipe>, UpstreamError> {
        let matches: Vec<IngredientMatch> = self
            .upstream_list(
                &["recipes", "findByIngredients"],
                &[
                    ("ingredients", Some(terms.join(","))),
                    ("number", Some(limit.to_string())),
                    ("ranking", Some("1".to_string())),
                    ("ignorePantry", Some("true".to_string())),
                ],
            )
            .await?;

        let ids: Vec<u64> = matches.iter().filter_map(|m| m.id).collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let joined = ids
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let mut recipes: Vec<SpoonacularRecipe> = self
            .upstream_list(
                &["recipes", "informationBulk"],
                &[
                    ("ids", Some(joined)),
                    ("includeNutrition", Some("false".to_string())),
                ],
            )
            .await?;

        // Keep the ranking of findByIngredients
        recipes.sort_by_key(|r| {
            r.id
                .and_then(|id| ids.iter().position(|&x| x == id))
                .unwrap_or(usize::MAX)
        });
        Ok(recipes.iter().map(to_common).collect())
    }
}

fn decode<T: DeserializeOwned + Default>(value: Value) -> T {
    serde_json::from_value(value).unwrap_or_else(|e| {
        warn!("Unexpected primary payload shape: {}", e);
        T::default()
    })
}

#[async_trait]
impl RecipeProvider for SpoonacularProvider {
    fn provider_name(&self) -> &str {
        "spoonacular"
    }

    async fn execute(&self, op: &Operation) -> Result<Vec<CommonRecipe>, UpstreamError> {
        let recipes = match op {
            Operation::Lookup(id) => self.lookup(id).await?,
            Operation::Random(n) => self.random(*n).await?,
            Operation::RandomSearch(n) => self.random_search(*n).await?,
            Operation::Search { query, area, limit } => {
                self.search(query, area.as_deref(), *limit).await?
            }
            Operation::Ingredients { terms, limit } => self.by_ingredients(terms, *limit).await?,
        };
        info!("spoonacular answered {:?} with {} recipes", op, recipes.len());
        Ok(recipes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryCache;
    use mockito::{Matcher, Server};

    fn provider(server_url: &str, cache: Arc<dyn CacheStore>) -> SpoonacularProvider {
        SpoonacularProvider::new(
            Client::new(),
            Url::parse(server_url).unwrap(),
            "test-key".to_string(),
            "spoonacular.test".to_string(),
            cache,
            Duration::from_secs(300),
        )
    }

    #[tokio::test]
    async fn test_lookup_sends_rapidapi_headers() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/recipes/716429/information")
            .match_query(Matcher::UrlEncoded(
                "includeNutrition".into(),
                "false".into(),
            ))
            .match_header("x-rapidapi-key", "test-key")
            .match_header("x-rapidapi-host", "spoonacular.test")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": 716429, "title": "Pasta with Garlic", "cuisines": ["Italian"]}"#)
            .create_async()
            .await;

        let spoon = provider(&server.url(), Arc::new(MemoryCache::new()));
        let recipes = spoon
            .execute(&Operation::Lookup("716429".to_string()))
            .await
            .unwrap();

        assert_eq!(recipes.len(), 1);
        assert_eq!(recipes[0].title, "Pasta with Garlic");
        assert_eq!(recipes[0].area.as_deref(), Some("Italian"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_second_call_is_served_from_cache() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/recipes/random")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"recipes": [{"id": 1, "title": "One"}]}"#)
            .expect(1)
            .create_async()
            .await;

        let cache = Arc::new(MemoryCache::new());
        let spoon = provider(&server.url(), cache.clone());

        let first = spoon.execute(&Operation::Random(1)).await.unwrap();
        let second = spoon.execute(&Operation::Random(1)).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(cache.len(), 1);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_rate_limit_is_typed_and_not_cached() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/recipes/complexSearch")
            .match_query(Matcher::Any)
            .with_status(429)
            .with_body(r#"{"message": "Too many requests"}"#)
            .create_async()
            .await;

        let cache = Arc::new(MemoryCache::new());
        let spoon = provider(&server.url(), cache.clone());
        let err = spoon
            .execute(&Operation::Search {
                query: "pasta".to_string(),
                area: None,
                limit: 5,
            })
            .await
            .unwrap_err();

        assert!(err.is_rate_limited());
        assert_eq!(err.status(), Some(429));
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_body_degrades_to_empty() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/recipes/random")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("<html>not json</html>")
            .create_async()
            .await;

        let cache = Arc::new(MemoryCache::new());
        let spoon = provider(&server.url(), cache.clone());
        let recipes = spoon.execute(&Operation::Random(3)).await.unwrap();

        assert!(recipes.is_empty());
        // `{}` is what gets cached for an unparseable success body
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn test_ingredients_fetch_bulk_in_ranked_order() {
        let mut server = Server::new_async().await;
        let _find = server
            .mock("GET", "/recipes/findByIngredients")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("ingredients".into(), "tomato,basil".into()),
                Matcher::UrlEncoded("number".into(), "2".into()),
            ]))
            .with_status(200)
            .with_body(r#"[{"id": 20, "title": "B"}, {"id": 10, "title": "A"}]"#)
            .create_async()
            .await;
        let _bulk = server
            .mock("GET", "/recipes/informationBulk")
            .match_query(Matcher::UrlEncoded("ids".into(), "20,10".into()))
            .with_status(200)
            .with_body(r#"[{"id": 10, "title": "A"}, {"id": 20, "title": "B"}]"#)
            .create_async()
            .await;

        let spoon = provider(&server.url(), Arc::new(MemoryCache::new()));
        let recipes = spoon
            .execute(&Operation::Ingredients {
                terms: vec!["tomato".to_string(), "basil".to_string()],
                limit: 2,
            })
            .await
            .unwrap();

        let ids: Vec<&str> = recipes.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["20", "10"]);
    }

    #[tokio::test]
    async fn test_ingredients_without_matches_skip_bulk_call() {
        let mut server = Server::new_async().await;
        let _find = server
            .mock("GET", "/recipes/findByIngredients")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;
        let bulk = server
            .mock("GET", "/recipes/informationBulk")
            .match_query(Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let spoon = provider(&server.url(), Arc::new(MemoryCache::new()));
        let recipes = spoon
            .execute(&Operation::Ingredients {
                terms: vec!["durian".to_string()],
                limit: 5,
            })
            .await
            .unwrap();

        assert!(recipes.is_empty());
        bulk.assert_async().await;
    }

    #[tokio::test]
    async fn test_mistyped_search_result_does_not_empty_the_page() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/recipes/complexSearch")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                r#"{"results": [
                    {"id": 1, "title": "Pad Thai", "cuisines": ["Thai"]},
                    {"id": 2, "title": "Mystery", "cuisines": null, "dishTypes": "soup"}
                ]}"#,
            )
            .create_async()
            .await;

        let spoon = provider(&server.url(), Arc::new(MemoryCache::new()));
        let recipes = spoon
            .execute(&Operation::Search {
                query: "noodles".to_string(),
                area: None,
                limit: 5,
            })
            .await
            .unwrap();

        let ids: Vec<&str> = recipes.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(recipes[0].area.as_deref(), Some("Thai"));
        assert!(recipes[1].area.is_none());
        assert!(recipes[1].category.is_none());
    }

    #[tokio::test]
    async fn test_bulk_drops_only_records_that_are_not_objects() {
        let mut server = Server::new_async().await;
        let _find = server
            .mock("GET", "/recipes/findByIngredients")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"[{"id": 10}, {"id": "eleven"}, {"id": 12}]"#)
            .create_async()
            .await;
        let _bulk = server
            .mock("GET", "/recipes/informationBulk")
            .match_query(Matcher::UrlEncoded("ids".into(), "10,12".into()))
            .with_status(200)
            .with_body(r#"[{"id": 12, "title": "Twelve"}, null, {"id": 10, "title": "Ten"}]"#)
            .create_async()
            .await;

        let spoon = provider(&server.url(), Arc::new(MemoryCache::new()));
        let recipes = spoon
            .execute(&Operation::Ingredients {
                terms: vec!["egg".to_string()],
                limit: 3,
            })
            .await
            .unwrap();

        let titles: Vec<&str> = recipes.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Ten", "Twelve"]);
    }

    #[test]
    fn test_provider_name() {
        let spoon = provider("http://127.0.0.1:1", Arc::new(MemoryCache::new()));
        assert_eq!(spoon.provider_name(), "spoonacular");
    }
}
