//! Client for the inference gateway.
//!
//! The gateway is an opaque HTTP service with three endpoints: vegan
//! classification, recipe enrichment, and keyword translation. This client
//! only moves bodies; deciding what a failure means is left to the callers.

pub mod wire;

use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

use crate::error::FetchError;
use crate::http::{join_url, HttpClient};
use crate::json::{parse_lenient, preview};
use crate::types::Recipe;
use wire::{
    ClassifyRecipe, ClassifyVeganRequest, ClassifyVeganResponse, EnrichRecipeRequest,
    SmartSearchRequest, SmartSearchResponse,
};

pub const DEFAULT_GATEWAY_URL: &str = "http://localhost:3000/api";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Malformed gateway response: {0}")]
    Malformed(String),
}

#[derive(Clone)]
pub struct GatewayClient {
    http: Arc<dyn HttpClient>,
    base_url: String,
}

impl GatewayClient {
    pub fn new(http: Arc<dyn HttpClient>, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    pub fn classify_url(&self) -> String {
        join_url(&self.base_url, "classify-vegan")
    }

    pub fn enrich_url(&self) -> String {
        join_url(&self.base_url, "enrich-recipe")
    }

    pub fn smart_search_url(&self) -> String {
        join_url(&self.base_url, "smart-search")
    }

    async fn post<T: serde::Serialize>(&self, url: &str, body: &T) -> Result<String, GatewayError> {
        let body = serde_json::to_value(body).map_err(|e| GatewayError::Malformed(e.to_string()))?;
        Ok(self.http.post_json(url, &body).await?)
    }

    /// Ids of the recipes the classifier judged safe.
    pub async fn classify_vegan(&self, recipes: &[Recipe]) -> Result<HashSet<String>, GatewayError> {
        let request = ClassifyVeganRequest {
            recipes: recipes.iter().map(ClassifyRecipe::from_recipe).collect(),
        };
        let text = self.post(&self.classify_url(), &request).await?;
        let response: ClassifyVeganResponse = parse_lenient(&text).map_err(|e| {
            GatewayError::Malformed(format!("{e}; body: {}", preview(&text, 200)))
        })?;
        Ok(response.safe_ids())
    }

    /// Raw enrichment text. Parsing and validation belong to the enrichment module.
    pub async fn enrich_recipe(&self, recipe: &Recipe) -> Result<String, GatewayError> {
        let request = EnrichRecipeRequest {
            recipe_data: serde_json::to_value(recipe)
                .map_err(|e| GatewayError::Malformed(e.to_string()))?,
        };
        self.post(&self.enrich_url(), &request).await
    }

    pub async fn smart_search(&self, search_term: &str) -> Result<SmartSearchResponse, GatewayError> {
        let request = SmartSearchRequest {
            search_term: search_term.to_string(),
        };
        let text = self.post(&self.smart_search_url(), &request).await?;
        parse_lenient(&text)
            .map_err(|e| GatewayError::Malformed(format!("{e}; body: {}", preview(&text, 200))))
    }
}
