//! Recipe aggregation gateway.
//!
//! Normalizes recipe lookups across a primary paid provider (Spoonacular via
//! RapidAPI) and a free fallback (TheMealDB) behind one `GET /api/recipes`
//! endpoint. Primary responses are cached for a few minutes; a rate-limited
//! primary falls through to the fallback provider, and the endpoint always
//! answers `200` with an `{ok, recipes}` or `{ok: false, error}` envelope.
//!
//! ```no_run
//! # use clean_kitchen_gateway::{Gateway, RecipeQuery};
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let gateway = Gateway::builder().api_key("your-rapidapi-key").build()?;
//! let recipes = gateway.recipes(&RecipeQuery::parse("q=pasta&limit=5")).await?;
//! println!("{} recipes", recipes.len());
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod cache;
pub mod config;
pub mod error;
pub mod gateway;
pub mod model;
pub mod normalize;
pub mod providers;
pub mod router;
pub mod server;
pub mod strategy;

pub use builder::GatewayBuilder;
pub use cache::{CacheStore, MemoryCache};
pub use config::GatewayConfig;
pub use error::{GatewayError, UpstreamError};
pub use gateway::Gateway;
pub use model::{CommonRecipe, IngredientLine, RecipeSource, RecipesResponse};
pub use router::{MatchMode, QueryMode, RecipeQuery};
pub use server::{app, start_server};
