//! Query-string parsing and mode selection for `GET /api/recipes`.

use url::form_urlencoded;

pub const PRIMARY_MAX_LIMIT: usize = 60;
pub const FALLBACK_MAX_LIMIT: usize = 24;
pub const DEFAULT_LIMIT: usize = 12;
pub const MAX_RANDOM: usize = 24;
pub const DEFAULT_RANDOM: usize = 8;

/// Ingredient-match strictness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    /// Every queried term must appear in a result's ingredients
    #[default]
    Intersect,
    /// Any queried term is enough
    Union,
}

impl MatchMode {
    fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) if v == "union" => MatchMode::Union,
            _ => MatchMode::Intersect,
        }
    }
}

/// Raw `/api/recipes` parameters. Blank values are stored as `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeQuery {
    pub id: Option<String>,
    pub random: Option<String>,
    pub q: Option<String>,
    pub ingredients: Option<String>,
    pub area: Option<String>,
    pub limit: Option<String>,
    pub mode: Option<String>,
}

impl RecipeQuery {
    /// Parse a raw query string such as `q=pasta&limit=5`
    pub fn parse(query_string: &str) -> Self {
        Self::from_pairs(form_urlencoded::parse(query_string.as_bytes()).into_owned())
    }

    /// Build from decoded key/value pairs. Unknown keys are ignored and the
    /// first occurrence of a repeated key wins.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut query = RecipeQuery::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "id" => &mut query.id,
                "random" => &mut query.random,
                "q" => &mut query.q,
                "ingredients" => &mut query.ingredients,
                "area" => &mut query.area,
                "limit" => &mut query.limit,
                "mode" => &mut query.mode,
                _ => continue,
            };
            let value = value.trim();
            if slot.is_none() && !value.is_empty() {
                *slot = Some(value.to_string());
            }
        }
        query
    }

    /// Requested result count clamped to the primary provider's range
    pub fn limit(&self) -> usize {
        clamp_param(self.limit.as_deref(), DEFAULT_LIMIT, PRIMARY_MAX_LIMIT)
    }

    /// Ingredient terms, trimmed, blanks removed
    pub fn ingredient_terms(&self) -> Vec<String> {
        self.ingredients
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Select the single mode this query runs in: `id` > `random` > `q` > `ingredients` > default
    pub fn mode(&self) -> QueryMode {
        if let Some(id) = &self.id {
            return QueryMode::ById(id.clone());
        }
        if let Some(random) = &self.random {
            return QueryMode::Random(clamp_param(Some(random), DEFAULT_RANDOM, MAX_RANDOM));
        }
        if let Some(q) = &self.q {
            return QueryMode::ByName {
                query: q.clone(),
                area: self.area.clone(),
                limit: self.limit(),
            };
        }
        let terms = self.ingredient_terms();
        if !terms.is_empty() {
            return QueryMode::ByIngredients {
                terms,
                area: self.area.clone(),
                limit: self.limit(),
                mode: MatchMode::parse(self.mode.as_deref()),
            };
        }
        QueryMode::DefaultRandom(DEFAULT_RANDOM)
    }
}

/// The five mutually exclusive request modes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryMode {
    ById(String),
    Random(usize),
    ByName {
        query: String,
        area: Option<String>,
        limit: usize,
    },
    ByIngredients {
        terms: Vec<String>,
        area: Option<String>,
        limit: usize,
        mode: MatchMode,
    },
    DefaultRandom(usize),
}

/// Parse an integer parameter; unparseable values take `default`, the result is kept in `1..=max`
fn clamp_param(value: Option<&str>, default: usize, max: usize) -> usize {
    value
        .and_then(|v| v.parse::<i64>().ok())
        .map(|n| n.clamp(1, max as i64) as usize)
        .unwrap_or(default)
}
