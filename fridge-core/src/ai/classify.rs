//! Vegetarian-safety classification.

use crate::ai::prompts::classify_vegan::{render_classify_vegan_prompt, CLASSIFY_VEGAN_PROMPT_NAME};
use crate::ai::AiError;
use crate::gateway::wire::{ClassifyRecipe, ClassifyVeganResponse, SafeIdsResponse};
use crate::json::{parse_lenient, preview};
use crate::llm::LlmProvider;

/// Ask the model which recipes are safe.
///
/// Only ids that were in the input are returned, in input order.
pub async fn classify_vegan(
    provider: &dyn LlmProvider,
    recipes: &[ClassifyRecipe],
) -> Result<SafeIdsResponse, AiError> {
    if recipes.is_empty() {
        return Ok(SafeIdsResponse::default());
    }

    let recipes_json = serde_json::to_string(recipes)
        .map_err(|e| AiError::ParseError(format!("Failed to encode recipes: {e}")))?;
    let prompt = render_classify_vegan_prompt(&recipes_json);

    tracing::debug!(
        prompt = CLASSIFY_VEGAN_PROMPT_NAME,
        provider = provider.provider_name(),
        count = recipes.len(),
        "ai: classifying"
    );
    let text = provider.complete(&prompt, true).await?;

    let response: ClassifyVeganResponse = parse_lenient(&text).map_err(|e| {
        AiError::ParseError(format!(
            "Failed to parse classification: {e}; got {}",
            preview(&text, 200)
        ))
    })?;
    let safe = response.safe_ids();

    Ok(SafeIdsResponse {
        safe_ids: recipes
            .iter()
            .filter(|r| safe.contains(&r.id))
            .map(|r| r.id.clone())
            .collect(),
    })
}
