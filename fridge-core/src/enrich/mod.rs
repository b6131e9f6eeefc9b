//! On-demand recipe enrichment with a per-session cache.
//!
//! Successful results are cached by recipe id for the life of the
//! [`Enricher`]. Concurrent requests for one id share a single gateway call.
//! Failures are not cached, so the next request retries.

mod model;

pub use model::{Difficulty, EnrichedIngredient, EnrichedRecipe, NutritionEstimate, Step};

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tokio::sync::OnceCell;

use crate::error::FetchError;
use crate::gateway::wire::ErrorBody;
use crate::gateway::{GatewayClient, GatewayError};
use crate::json::{parse_lenient, preview};
use crate::types::Recipe;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnrichmentError {
    #[error("Enrichment request failed: {0}")]
    Gateway(GatewayError),

    #[error("Enrichment response is not valid JSON: {0}")]
    Parse(String),

    #[error("Enrichment response is incomplete: {0}")]
    Validation(String),

    #[error("No recipe is open")]
    NoSelection,
}

impl EnrichmentError {
    /// Message shown next to the enrichment control.
    ///
    /// Gateway error bodies carry `{error, details}`; those are preferred over
    /// the raw status line.
    pub fn user_message(&self) -> String {
        if let EnrichmentError::Gateway(GatewayError::Fetch(FetchError::Status { status, body })) =
            self
        {
            if let Ok(ErrorBody { error, details }) = serde_json::from_str::<ErrorBody>(body) {
                return match details {
                    Some(details) => format!("{error}: {details}"),
                    None => error,
                };
            }
            return format!("Enrichment failed (HTTP {status})");
        }
        self.to_string()
    }
}

impl From<GatewayError> for EnrichmentError {
    fn from(err: GatewayError) -> Self {
        EnrichmentError::Gateway(err)
    }
}

/// Parse and validate an enrichment response body.
pub fn parse_enriched(text: &str) -> Result<EnrichedRecipe, EnrichmentError> {
    let mut recipe: EnrichedRecipe = parse_lenient(text).map_err(|e| {
        tracing::warn!(error = %e, body = %preview(text, 200), "enrich: unparseable response");
        EnrichmentError::Parse(e.to_string())
    })?;
    recipe.validate().map_err(EnrichmentError::Validation)?;
    Ok(recipe)
}

type Slot = Arc<OnceCell<Arc<EnrichedRecipe>>>;

pub struct Enricher {
    gateway: GatewayClient,
    cache: Mutex<HashMap<String, Slot>>,
}

impl Enricher {
    pub fn new(gateway: GatewayClient) -> Self {
        Self {
            gateway,
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn slot(&self, id: &str) -> Slot {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(cache.entry(id.to_string()).or_default())
    }

    /// Cached result for `id`, if enrichment already succeeded.
    pub fn cached(&self, id: &str) -> Option<Arc<EnrichedRecipe>> {
        let cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        cache.get(id).and_then(|slot| slot.get().cloned())
    }

    /// Remove `slot` for `id` if it still holds no result.
    fn release(&self, id: &str, slot: &Slot) {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(current) = cache.get(id) {
            if Arc::ptr_eq(current, slot) && current.get().is_none() {
                cache.remove(id);
            }
        }
    }

    pub async fn enrich(&self, recipe: &Recipe) -> Result<Arc<EnrichedRecipe>, EnrichmentError> {
        let slot = self.slot(&recipe.id);
        if let Some(hit) = slot.get() {
            tracing::debug!(recipe_id = %recipe.id, "enrich: cache hit");
            return Ok(Arc::clone(hit));
        }

        let result = slot
            .get_or_try_init(|| async {
                tracing::info!(recipe_id = %recipe.id, title = %recipe.title, "enrich: requesting");
                let text = self.gateway.enrich_recipe(recipe).await?;
                let mut enriched = parse_enriched(&text)?;
                enriched.id = recipe.id.clone();
                Ok::<_, EnrichmentError>(Arc::new(enriched))
            })
            .await;

        match result {
            Ok(enriched) => {
                // A failed sharer of this slot may have released it meanwhile.
                self.cache
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .entry(recipe.id.clone())
                    .or_insert_with(|| Arc::clone(&slot));
                Ok(Arc::clone(enriched))
            }
            Err(err) => {
                tracing::warn!(recipe_id = %recipe.id, error = %err, "enrich: failed");
                self.release(&recipe.id, &slot);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use serde_json::{json, Value};

    pub fn enriched_json(id: &str) -> Value {
        json!({
            "id": id,
            "title_en": "Tomato Soup",
            "title_zh": "番茄湯",
            "description_zh": "酸甜濃郁。",
            "difficulty": "簡單",
            "time_estimate": "20分鐘",
            "tags": ["湯品"],
            "nutrition_estimate": {"calories": 180, "protein": "4g", "carbon": "20g"},
            "ingredients": [{"item": "番茄", "amount": "2 顆", "original_text": "2 Tomato"}],
            "steps": [{"step_number": 1, "content": "番茄切塊煮滾。", "action_tag": "切塊"}]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{MockClient, MockResponse};
    use crate::types::fixtures::meal;

    const URL: &str = "http://gw.test/api/enrich-recipe";

    fn enricher(mock: Arc<MockClient>) -> Enricher {
        Enricher::new(GatewayClient::new(mock, "http://gw.test/api"))
    }

    #[tokio::test]
    async fn test_success_is_cached() {
        let mock = Arc::new(MockClient::new().with_json(URL, fixtures::enriched_json("1")));
        let enricher = enricher(mock.clone());
        let recipe = meal("1", "Tomato Soup", "Vegetarian");

        let first = enricher.enrich(&recipe).await.unwrap();
        let second = enricher.enrich(&recipe).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.title_localized, "番茄湯");
        assert_eq!(mock.request_count(URL), 1);
        assert!(enricher.cached("1").is_some());
    }

    #[tokio::test]
    async fn test_concurrent_requests_share_one_call() {
        let mock = Arc::new(MockClient::new().with_response(
            URL,
            MockResponse::delayed(
                std::time::Duration::from_millis(50),
                MockResponse::json(fixtures::enriched_json("1")),
            ),
        ));
        let enricher = enricher(mock.clone());
        let recipe = meal("1", "Tomato Soup", "Vegetarian");

        let (a, b) = tokio::join!(enricher.enrich(&recipe), enricher.enrich(&recipe));
        assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));
        assert_eq!(mock.request_count(URL), 1);
    }

    #[tokio::test]
    async fn test_failure_is_not_cached() {
        let mock = Arc::new(
            MockClient::new()
                .with_response(
                    URL,
                    MockResponse::Status(500, r#"{"error":"AI failed","details":"quota"}"#.into()),
                )
                .with_json(URL, fixtures::enriched_json("1")),
        );
        let enricher = enricher(mock.clone());
        let recipe = meal("1", "Tomato Soup", "Vegetarian");

        let err = enricher.enrich(&recipe).await.unwrap_err();
        assert_eq!(err.user_message(), "AI failed: quota");
        assert!(enricher.cached("1").is_none());

        assert!(enricher.enrich(&recipe).await.is_ok());
        assert_eq!(mock.request_count(URL), 2);
    }

    #[test]
    fn test_fenced_response_is_unwrapped() {
        let text = format!("```json\n{}\n```", fixtures::enriched_json("1"));
        assert_eq!(parse_enriched(&text).unwrap().difficulty, Difficulty::Easy);
    }

    #[test]
    fn test_unparseable_response() {
        assert!(matches!(
            parse_enriched("Sorry, I can't help with that."),
            Err(EnrichmentError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn test_failures_leave_no_empty_slots() {
        let mock = Arc::new(MockClient::new().with_response(
            URL,
            MockResponse::Status(500, r#"{"error":"AI failed"}"#.into()),
        ));
        let enricher = enricher(mock.clone());

        for id in ["1", "2", "3"] {
            assert!(enricher.enrich(&meal(id, "Soup", "Vegetarian")).await.is_err());
        }
        assert!(enricher.cache.lock().unwrap().is_empty());
        assert_eq!(mock.request_count(URL), 3);
    }
}
