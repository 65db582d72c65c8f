//! Provider payload schemas and their conversion into [`CommonRecipe`](crate::model::CommonRecipe).
//!
//! Conversions are total: missing, blank, `null` or mistyped fields become
//! `None` or empty collections, never errors. A record that is not an object
//! at all is dropped from its list without taking its neighbours with it.

pub mod mealdb;
pub mod spoonacular;

pub use mealdb::{fallback_to_common, MealRecord, MealsResponse};
pub use spoonacular::{to_common, SpoonacularRecipe};

use log::warn;
use scraper::Html;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Trimmed copy of `value`, or `None` when absent or blank
pub(crate) fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Remove markup from an HTML fragment and collapse runs of whitespace
pub(crate) fn strip_html(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    fragment
        .root_element()
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Decode every element of a JSON array on its own, dropping the ones that
/// do not fit `T`. Anything other than an array yields an empty list.
pub(crate) fn decode_each<T: DeserializeOwned>(value: Value) -> Vec<T> {
    let Value::Array(items) = value else {
        return Vec::new();
    };

    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Dropping malformed record: {}", e);
                None
            }
        })
        .collect()
}

/// `deserialize_with` for list fields, see [`decode_each`]
pub(crate) fn each<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(decode_each(Value::deserialize(deserializer)?))
}

/// `deserialize_with` for scalar fields: `null` or a value of the wrong type
/// becomes `T::default()`
pub(crate) fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(serde_json::from_value(Value::deserialize(deserializer)?).unwrap_or_default())
}

/// `deserialize_with` for ids and text that sometimes arrive as numbers
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}
