//! Basic usage of the Gateway builder API
//!
//! Runs each query mode once against the live providers:
//! 1. Name search
//! 2. Ingredient search (intersect)
//! 3. Random recipes
//!
//! Set `RAPIDAPI_KEY` to go through Spoonacular first; without it every
//! query is answered by TheMealDB.

use clean_kitchen_gateway::{Gateway, RecipeQuery};
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut builder = Gateway::builder();
    if let Ok(key) = env::var("RAPIDAPI_KEY") {
        builder = builder.api_key(key);
    }
    let gateway = builder.build()?;

    println!("=== Name search ===");
    for recipe in gateway.recipes(&RecipeQuery::parse("q=carbonara&limit=3")).await? {
        println!("{} [{}]", recipe.title, recipe.area.as_deref().unwrap_or("?"));
    }

    println!("\n=== Ingredients: chicken AND garlic ===");
    let recipes = gateway
        .recipes(&RecipeQuery::parse("ingredients=chicken,garlic&limit=5"))
        .await?;
    for recipe in &recipes {
        println!("{} ({} ingredients)", recipe.title, recipe.ingredients.len());
    }

    println!("\n=== Random ===");
    let recipes = gateway.recipes(&RecipeQuery::parse("random=2")).await?;
    if let Some(recipe) = recipes.first() {
        println!("{}", recipe.title);
        for ingredient in &recipe.ingredients {
            match &ingredient.measure {
                Some(measure) => println!("  - {} ({})", ingredient.name, measure),
                None => println!("  - {}", ingredient.name),
            }
        }
        if let Some(instructions) = &recipe.instructions {
            println!("\n{}", instructions);
        }
    }

    Ok(())
}
