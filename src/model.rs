use serde::{Deserialize, Serialize};

/// Origin tag of a [`CommonRecipe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RecipeSource {
    #[default]
    Api,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientLine {
    pub name: String,
    pub measure: Option<String>,
}

/// Provider-independent recipe record returned by the gateway
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommonRecipe {
    pub id: String,
    pub source: RecipeSource,
    pub title: String,
    pub image: Option<String>,
    pub category: Option<String>,
    pub area: Option<String>,
    pub ingredients: Vec<IngredientLine>,
    pub instructions: Option<String>,
    pub minutes: Option<u32>,
    pub servings: Option<u32>,
}

impl CommonRecipe {
    /// Lowercased `name measure` text of every ingredient, used for substring matching
    pub fn ingredient_blob(&self) -> String {
        self.ingredients
            .iter()
            .map(|line| match &line.measure {
                Some(measure) => format!("{} {}", line.name, measure),
                None => line.name.clone(),
            })
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }
}

/// JSON body of every `/api/recipes` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipesResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipes: Option<Vec<CommonRecipe>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RecipesResponse {
    pub fn success(recipes: Vec<CommonRecipe>) -> Self {
        Self {
            ok: true,
            recipes: Some(recipes),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            recipes: None,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn recipe() -> CommonRecipe {
        CommonRecipe {
            id: "52772".to_string(),
            source: RecipeSource::Api,
            title: "Teriyaki Chicken Casserole".to_string(),
            image: None,
            category: Some("Chicken".to_string()),
            area: Some("Japanese".to_string()),
            ingredients: vec![
                IngredientLine {
                    name: "Soy Sauce".to_string(),
                    measure: Some("3/4 cup".to_string()),
                },
                IngredientLine {
                    name: "Water".to_string(),
                    measure: None,
                },
            ],
            instructions: None,
            minutes: None,
            servings: None,
        }
    }

    #[test]
    fn test_ingredient_blob() {
        assert_eq!(recipe().ingredient_blob(), "soy sauce 3/4 cup water");
    }

    #[test]
    fn test_source_serializes_as_api() {
        let value = serde_json::to_value(recipe()).unwrap();
        assert_eq!(value["source"], json!("api"));
        assert_eq!(value["ingredients"][1]["measure"], json!(null));
    }

    #[test]
    fn test_envelope_shapes() {
        let ok = serde_json::to_value(RecipesResponse::success(vec![])).unwrap();
        assert_eq!(ok, json!({"ok": true, "recipes": []}));

        let err = serde_json::to_value(RecipesResponse::failure("boom")).unwrap();
        assert_eq!(err, json!({"ok": false, "error": "boom"}));
    }
}
