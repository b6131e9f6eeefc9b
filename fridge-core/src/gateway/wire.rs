//! Request and response bodies of the inference gateway.
//!
//! Shared by [`super::GatewayClient`] and the server crate so both ends agree
//! on field names.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

use crate::types::Recipe;

/// Sent in place of an ingredient list the recipe database did not provide.
pub const MISSING_INGREDIENTS_NOTE: &str =
    "Ingredients data missing from API. Please judge based on Title and Category only.";

/// One recipe as presented to the classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ClassifyRecipe {
    pub id: String,
    pub title: String,
    pub category: String,
    pub ingredients_text: String,
}

impl ClassifyRecipe {
    pub fn from_recipe(recipe: &Recipe) -> Self {
        Self {
            id: recipe.id.clone(),
            title: recipe.title.clone(),
            category: recipe.category_or_unknown().to_string(),
            ingredients_text: recipe
                .ingredients_text()
                .unwrap_or_else(|| MISSING_INGREDIENTS_NOTE.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ClassifyVeganRequest {
    pub recipes: Vec<ClassifyRecipe>,
}

/// What the server returns from `/classify-vegan`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct SafeIdsResponse {
    pub safe_ids: Vec<String>,
}

/// Per-recipe verdict in the older array response format.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyVerdict {
    pub id: Value,
    #[serde(default)]
    pub is_vegan: bool,
}

/// Classifier answers the client accepts.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ClassifyVeganResponse {
    SafeIds {
        #[serde(rename = "safeIds")]
        safe_ids: Vec<Value>,
    },
    Legacy(Vec<LegacyVerdict>),
}

fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

impl ClassifyVeganResponse {
    /// Ids judged safe, as strings.
    pub fn safe_ids(&self) -> HashSet<String> {
        match self {
            ClassifyVeganResponse::SafeIds { safe_ids } => {
                safe_ids.iter().filter_map(id_string).collect()
            }
            ClassifyVeganResponse::Legacy(verdicts) => verdicts
                .iter()
                .filter(|v| v.is_vegan)
                .filter_map(|v| id_string(&v.id))
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct EnrichRecipeRequest {
    /// TheMealDB-shaped recipe record.
    #[cfg_attr(feature = "openapi", schema(value_type = Object))]
    pub recipe_data: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct SmartSearchRequest {
    pub search_term: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SmartSearchResponse {
    #[serde(default)]
    pub original_input: String,
    #[serde(default)]
    pub english_keyword: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_multiple: Option<bool>,
}

/// Error body returned by every gateway endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}
