use crate::builder::GatewayBuilder;
use crate::config::GatewayConfig;
use crate::error::{GatewayError, UpstreamError};
use crate::model::{CommonRecipe, RecipesResponse};
use crate::providers::RecipeProvider;
use crate::router::RecipeQuery;
use crate::strategy::{plan, Attempt, Tier};
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::Duration;

/// Recipe aggregation gateway: runs each query's attempt plan against the
/// primary provider (when configured) and the fallback provider.
pub struct Gateway {
    primary: Option<Arc<dyn RecipeProvider>>,
    fallback: Arc<dyn RecipeProvider>,
    deadline: Duration,
}

impl Gateway {
    /// Assemble a gateway from already constructed providers
    pub fn new(
        primary: Option<Arc<dyn RecipeProvider>>,
        fallback: Arc<dyn RecipeProvider>,
        deadline: Duration,
    ) -> Self {
        Gateway {
            primary,
            fallback,
            deadline,
        }
    }

    pub fn builder() -> GatewayBuilder {
        GatewayBuilder::default()
    }

    pub fn from_config(config: &GatewayConfig) -> Result<Self, GatewayError> {
        GatewayBuilder::from_config(config).build()
    }

    pub fn has_primary(&self) -> bool {
        self.primary.is_some()
    }

    /// Resolve a query to normalized recipes within the request deadline
    pub async fn recipes(&self, query: &RecipeQuery) -> Result<Vec<CommonRecipe>, GatewayError> {
        let mode = query.mode();
        debug!("Resolved {:?} to {:?}", query, mode);

        match tokio::time::timeout(self.deadline, self.run(plan(&mode))).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(GatewayError::DeadlineExceeded(self.deadline)),
        }
    }

    /// Same as [`Gateway::recipes`] but folded into the response envelope
    pub async fn respond(&self, query: &RecipeQuery) -> RecipesResponse {
        match self.recipes(query).await {
            Ok(recipes) => RecipesResponse::success(recipes),
            Err(e) => {
                error!("Recipe request failed: {}", e);
                RecipesResponse::failure(e.to_string())
            }
        }
    }

    /// Run one raw query string and render the envelope as pretty JSON
    pub async fn query_json(&self, query_string: &str) -> serde_json::Result<String> {
        let response = self.respond(&RecipeQuery::parse(query_string)).await;
        serde_json::to_string_pretty(&response)
    }

    fn provider(&self, tier: Tier) -> Option<&dyn RecipeProvider> {
        match tier {
            Tier::Primary => self.primary.as_deref(),
            Tier::Fallback => Some(self.fallback.as_ref()),
        }
    }

    async fn run(&self, plan: Vec<Attempt>) -> Result<Vec<CommonRecipe>, UpstreamError> {
        // Primary attempts drop out when no key is configured
        let mut attempts = plan
            .into_iter()
            .filter_map(|attempt| self.provider(attempt.tier).map(|p| (p, attempt)))
            .peekable();

        while let Some((provider, attempt)) = attempts.next() {
            let is_last = attempts.peek().is_none();
            match provider.execute(&attempt.op).await {
                Ok(recipes) => {
                    let total = recipes.len();
                    let kept = attempt.apply(recipes);
                    if kept.len() != total {
                        debug!("Filters kept {} of {} recipes", kept.len(), total);
                    }
                    return Ok(kept);
                }
                Err(e) if !is_last && attempt.advance.permits(&e) => {
                    warn!(
                        "{} failed on {:?}, trying next strategy: {}",
                        provider.provider_name(),
                        attempt.op,
                        e
                    );
                }
                Err(e) => return Err(e),
            }
        }

        info!("Empty attempt plan");
        Ok(Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{IngredientLine, RecipeSource};
    use crate::providers::Operation;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Provider answering every call with a scripted outcome
    struct Scripted {
        name: &'static str,
        outcomes: Mutex<Vec<Result<Vec<CommonRecipe>, u16>>>,
        calls: Mutex<Vec<Operation>>,
    }

    impl Scripted {
        fn new(name: &'static str, outcomes: Vec<Result<Vec<CommonRecipe>, u16>>) -> Arc<Self> {
            Arc::new(Scripted {
                name,
                outcomes: Mutex::new(outcomes),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<Operation> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RecipeProvider for Scripted {
        fn provider_name(&self) -> &str {
            self.name
        }

        async fn execute(&self, op: &Operation) -> Result<Vec<CommonRecipe>, UpstreamError> {
            self.calls.lock().unwrap().push(op.clone());
            let mut outcomes = self.outcomes.lock().unwrap();
            let outcome = if outcomes.len() > 1 {
                outcomes.remove(0)
            } else {
                outcomes[0].clone()
            };
            outcome.map_err(UpstreamError::from_status)
        }
    }

    fn recipe(id: &str, area: Option<&str>, ingredients: &[&str]) -> CommonRecipe {
        CommonRecipe {
            id: id.to_string(),
            source: RecipeSource::Api,
            title: format!("Recipe {}", id),
            image: None,
            category: None,
            area: area.map(str::to_string),
            ingredients: ingredients
                .iter()
                .map(|name| IngredientLine {
                    name: name.to_string(),
                    measure: None,
                })
                .collect(),
            instructions: None,
            minutes: None,
            servings: None,
        }
    }

    fn gateway(primary: Option<Arc<Scripted>>, fallback: Arc<Scripted>) -> Gateway {
        Gateway::new(
            primary.map(|p| p as Arc<dyn RecipeProvider>),
            fallback,
            Duration::from_secs(5),
        )
    }

    fn ids(recipes: &[CommonRecipe]) -> Vec<&str> {
        recipes.iter().map(|r| r.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_rate_limit_falls_back() {
        let primary = Scripted::new("primary", vec![Err(429)]);
        let fallback = Scripted::new("fallback", vec![Ok(vec![recipe("f1", None, &[])])]);
        let gw = gateway(Some(primary.clone()), fallback.clone());

        let response = gw.respond(&RecipeQuery::parse("q=pasta")).await;

        assert!(response.ok);
        assert_eq!(ids(&response.recipes.unwrap()), vec!["f1"]);
        assert_eq!(primary.calls().len(), 1);
        assert_eq!(fallback.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_server_error_does_not_fall_back() {
        let primary = Scripted::new("primary", vec![Err(500)]);
        let fallback = Scripted::new("fallback", vec![Ok(vec![recipe("f1", None, &[])])]);
        let gw = gateway(Some(primary), fallback.clone());

        let response = gw.respond(&RecipeQuery::parse("q=pasta")).await;

        assert!(!response.ok);
        assert!(response.error.unwrap().contains("500"));
        assert!(fallback.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_key_goes_straight_to_fallback() {
        let fallback = Scripted::new("fallback", vec![Ok(vec![recipe("f1", None, &[])])]);
        let gw = gateway(None, fallback.clone());

        let recipes = gw.recipes(&RecipeQuery::parse("id=52772")).await.unwrap();

        assert_eq!(ids(&recipes), vec!["f1"]);
        assert_eq!(fallback.calls(), vec![Operation::Lookup("52772".to_string())]);
    }

    #[tokio::test]
    async fn test_random_tries_search_before_fallback() {
        let primary = Scripted::new(
            "primary",
            vec![Err(500), Ok(vec![recipe("p1", None, &[])])],
        );
        let fallback = Scripted::new("fallback", vec![Ok(vec![])]);
        let gw = gateway(Some(primary.clone()), fallback.clone());

        let recipes = gw.recipes(&RecipeQuery::parse("random=2")).await.unwrap();

        assert_eq!(ids(&recipes), vec!["p1"]);
        assert_eq!(
            primary.calls(),
            vec![Operation::Random(2), Operation::RandomSearch(2)]
        );
        assert!(fallback.calls().is_empty());
    }

    #[tokio::test]
    async fn test_random_search_rate_limit_reaches_fallback() {
        let primary = Scripted::new("primary", vec![Err(429)]);
        let fallback = Scripted::new("fallback", vec![Ok(vec![recipe("f1", None, &[])])]);
        let gw = gateway(Some(primary.clone()), fallback.clone());

        let recipes = gw.recipes(&RecipeQuery::default()).await.unwrap();

        assert_eq!(ids(&recipes), vec!["f1"]);
        assert_eq!(primary.calls().len(), 2);
        assert_eq!(fallback.calls(), vec![Operation::Random(8)]);
    }

    #[tokio::test]
    async fn test_fallback_failure_is_reported() {
        let primary = Scripted::new("primary", vec![Err(429)]);
        let fallback = Scripted::new("fallback", vec![Err(429)]);
        let gw = gateway(Some(primary), fallback);

        let response = gw.respond(&RecipeQuery::parse("q=pasta")).await;
        assert!(!response.ok);
        assert!(response.recipes.is_none());
    }

    #[tokio::test]
    async fn test_intersect_vs_union() {
        let results = vec![
            recipe("tomato-only", None, &["Tomato"]),
            recipe("both", None, &["Tomato", "Basil"]),
        ];
        let fallback = Scripted::new("fallback", vec![Ok(results)]);
        let gw = gateway(None, fallback);

        let intersect = gw
            .recipes(&RecipeQuery::parse("ingredients=tomato,basil&mode=intersect"))
            .await
            .unwrap();
        assert_eq!(ids(&intersect), vec!["both"]);

        let union = gw
            .recipes(&RecipeQuery::parse("ingredients=tomato,basil&mode=union"))
            .await
            .unwrap();
        assert_eq!(ids(&union), vec!["tomato-only", "both"]);

        let single = gw
            .recipes(&RecipeQuery::parse("ingredients=tomato"))
            .await
            .unwrap();
        assert_eq!(ids(&single), vec!["tomato-only", "both"]);
    }

    #[tokio::test]
    async fn test_area_filter_on_primary_path_only() {
        let results = vec![
            recipe("it", Some("Italian"), &["Tomato"]),
            recipe("mx", Some("Mexican"), &["Tomato"]),
        ];

        let primary = Scripted::new("primary", vec![Ok(results.clone())]);
        let fallback = Scripted::new("fallback", vec![Ok(vec![])]);
        let with_key = gateway(Some(primary), fallback);
        let filtered = with_key
            .recipes(&RecipeQuery::parse("ingredients=tomato&area=italian"))
            .await
            .unwrap();
        assert_eq!(ids(&filtered), vec!["it"]);

        let fallback = Scripted::new("fallback", vec![Ok(results)]);
        let without_key = gateway(None, fallback);
        let unfiltered = without_key
            .recipes(&RecipeQuery::parse("ingredients=tomato&area=italian"))
            .await
            .unwrap();
        assert_eq!(ids(&unfiltered), vec!["it", "mx"]);
    }

    /// Provider that never answers
    struct Hanging;

    #[async_trait]
    impl RecipeProvider for Hanging {
        fn provider_name(&self) -> &str {
            "hanging"
        }

        async fn execute(&self, _op: &Operation) -> Result<Vec<CommonRecipe>, UpstreamError> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_exceeded() {
        let gw = Gateway::new(None, Arc::new(Hanging), Duration::from_secs(2));

        let response = gw.respond(&RecipeQuery::parse("q=pasta")).await;

        assert!(!response.ok);
        assert!(response.error.unwrap().contains("deadline"));
    }
}
