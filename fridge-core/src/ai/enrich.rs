//! Recipe enrichment: localize and restructure one recipe.

use serde_json::Value;

use crate::ai::prompts::enrich_recipe::{render_enrich_recipe_prompt, ENRICH_RECIPE_PROMPT_NAME};
use crate::ai::AiError;
use crate::enrich::{parse_enriched, EnrichedRecipe};
use crate::llm::LlmProvider;

/// Enrich a TheMealDB-shaped recipe, writing localized text in `locale`.
pub async fn enrich_recipe(
    provider: &dyn LlmProvider,
    recipe_data: &Value,
    locale: &str,
) -> Result<EnrichedRecipe, AiError> {
    let prompt = render_enrich_recipe_prompt(&recipe_data.to_string(), locale);

    tracing::debug!(
        prompt = ENRICH_RECIPE_PROMPT_NAME,
        provider = provider.provider_name(),
        model = provider.model_name(),
        "ai: enriching"
    );
    let text = provider.complete(&prompt, true).await?;

    let mut enriched = parse_enriched(&text).map_err(|e| AiError::ParseError(e.to_string()))?;
    if enriched.id.is_empty() {
        if let Some(id) = recipe_data.get("idMeal").and_then(Value::as_str) {
            enriched.id = id.to_string();
        }
    }
    Ok(enriched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrich::fixtures::enriched_json;
    use crate::llm::FakeProvider;
    use serde_json::json;

    #[tokio::test]
    async fn test_enrich_parses_model_output() {
        let mut body = enriched_json("");
        body["id"] = json!(null);
        let provider = FakeProvider::with_response("chef and nutritionist", &body.to_string());

        let enriched = enrich_recipe(&provider, &json!({"idMeal": "77", "strMeal": "Soup"}), "English")
            .await
            .unwrap();
        assert_eq!(enriched.id, "77");
        assert_eq!(enriched.steps.len(), 1);
    }

    #[tokio::test]
    async fn test_enrich_rejects_stepless_output() {
        let mut body = enriched_json("1");
        body["steps"] = json!([]);
        let provider = FakeProvider::new().with_default_response(&body.to_string());
        let err = enrich_recipe(&provider, &json!({}), "English").await.unwrap_err();
        assert!(err.to_string().contains("no steps"));
    }
}
