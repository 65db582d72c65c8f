//! Ordered attempt plans per query mode.
//!
//! A plan lists which provider tier runs which operation, which errors allow
//! evaluation to move on to the next attempt, and which filters apply to a
//! successful answer. Evaluation stops at the first success or at the first
//! error the current attempt does not advance on.

use crate::error::UpstreamError;
use crate::model::CommonRecipe;
use crate::providers::Operation;
use crate::router::{MatchMode, QueryMode, FALLBACK_MAX_LIMIT};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Primary,
    Fallback,
}

/// Errors that let evaluation continue past a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    OnAnyError,
    OnRateLimit,
}

impl Advance {
    pub fn permits(self, err: &UpstreamError) -> bool {
        match self {
            Advance::OnAnyError => true,
            Advance::OnRateLimit => err.is_rate_limited(),
        }
    }
}

/// Post-processing applied to one attempt's results
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultFilter {
    /// Keep recipes whose ingredient text contains every (lowercase) term
    AllIngredients(Vec<String>),
    /// Keep recipes whose area equals this one, ignoring case
    Area(String),
}

impl ResultFilter {
    pub fn keeps(&self, recipe: &CommonRecipe) -> bool {
        match self {
            ResultFilter::AllIngredients(terms) => {
                let blob = recipe.ingredient_blob();
                terms.iter().all(|term| blob.contains(term.as_str()))
            }
            ResultFilter::Area(area) => recipe
                .area
                .as_deref()
                .is_some_and(|a| a.to_lowercase() == area.to_lowercase()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub tier: Tier,
    pub op: Operation,
    pub advance: Advance,
    pub filters: Vec<ResultFilter>,
}

impl Attempt {
    fn new(tier: Tier, op: Operation, advance: Advance) -> Self {
        Attempt {
            tier,
            op,
            advance,
            filters: Vec::new(),
        }
    }

    fn with_filters(mut self, filters: Vec<ResultFilter>) -> Self {
        self.filters = filters;
        self
    }

    pub fn apply(&self, recipes: Vec<CommonRecipe>) -> Vec<CommonRecipe> {
        recipes
            .into_iter()
            .filter(|r| self.filters.iter().all(|f| f.keeps(r)))
            .collect()
    }
}

/// Build the attempt plan for a query mode
pub fn plan(mode: &QueryMode) -> Vec<Attempt> {
    use Advance::*;
    use Tier::*;

    match mode {
        QueryMode::ById(id) => vec![
            Attempt::new(Primary, Operation::Lookup(id.clone()), OnRateLimit),
            Attempt::new(Fallback, Operation::Lookup(id.clone()), OnRateLimit),
        ],
        QueryMode::Random(n) | QueryMode::DefaultRandom(n) => vec![
            Attempt::new(Primary, Operation::Random(*n), OnAnyError),
            Attempt::new(Primary, Operation::RandomSearch(*n), OnRateLimit),
            Attempt::new(Fallback, Operation::Random(*n), OnRateLimit),
        ],
        QueryMode::ByName { query, area, limit } => vec![
            Attempt::new(
                Primary,
                Operation::Search {
                    query: query.clone(),
                    area: area.clone(),
                    limit: *limit,
                },
                OnRateLimit,
            ),
            Attempt::new(
                Fallback,
                Operation::Search {
                    query: query.clone(),
                    area: area.clone(),
                    limit: (*limit).min(FALLBACK_MAX_LIMIT),
                },
                OnRateLimit,
            ),
        ],
        QueryMode::ByIngredients {
            terms,
            area,
            limit,
            mode,
        } => {
            let mut shared = Vec::new();
            if *mode == MatchMode::Intersect && terms.len() > 1 {
                shared.push(ResultFilter::AllIngredients(
                    terms.iter().map(|t| t.to_lowercase()).collect(),
                ));
            }

            // Only the primary answer is narrowed by area
            let mut primary = shared.clone();
            if let Some(area) = area {
                primary.push(ResultFilter::Area(area.clone()));
            }

            vec![
                Attempt::new(
                    Primary,
                    Operation::Ingredients {
                        terms: terms.clone(),
                        limit: *limit,
                    },
                    OnRateLimit,
                )
                .with_filters(primary),
                Attempt::new(
                    Fallback,
                    Operation::Ingredients {
                        terms: terms.clone(),
                        limit: (*limit).min(FALLBACK_MAX_LIMIT),
                    },
                    OnRateLimit,
                )
                .with_filters(shared),
            ]
        }
    }
}
