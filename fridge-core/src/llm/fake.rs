//! Canned-answer provider for tests and offline gateway runs.

use super::{LlmError, LlmProvider};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

/// Answers by case-insensitive substring match on the prompt, first
/// registered pattern wins. Unmatched prompts get the default answer, or an
/// error when there is none.
#[derive(Debug, Default)]
pub struct FakeProvider {
    /// Lowercased pattern and its answer.
    responses: RwLock<Vec<(String, String)>>,
    default_response: Option<String>,
    calls: AtomicUsize,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider with a single pattern.
    pub fn with_response(prompt_contains: &str, response: &str) -> Self {
        let provider = Self::new();
        provider.add_response(prompt_contains, response);
        provider
    }

    /// Register another pattern. Earlier patterns take precedence.
    pub fn add_response(&self, prompt_contains: &str, response: &str) {
        self.responses
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((prompt_contains.to_lowercase(), response.to_string()));
    }

    /// Answer for prompts no pattern matches.
    pub fn with_default_response(mut self, response: &str) -> Self {
        self.default_response = Some(response.to_string());
        self
    }

    /// Number of completions requested so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Canned answers for the three gateway prompts, for offline runs.
    pub fn with_gateway_responses() -> Self {
        let provider = Self::new();

        provider.add_response("strict vegetarian filter", r#"{"safeIds": []}"#);

        provider.add_response(
            "culinary search assistant",
            r#"{"original_input": "", "english_keyword": "egg", "is_multiple": false}"#,
        );

        provider.add_response(
            "chef and nutritionist",
            r#"{
                "id": "",
                "title_original": "Recipe",
                "title_localized": "食譜",
                "description_localized": "離線模式產生的範例內容。",
                "difficulty": "easy",
                "time_estimate": "30 分鐘",
                "tags": ["範例"],
                "nutrition_estimate": {"calories": 300, "protein": "10g", "carbohydrates": "40g"},
                "ingredients": [],
                "steps": [{"step_number": 1, "content": "依照原始食譜操作。", "action_tag": ""}]
            }"#,
        );

        provider
    }
}

#[async_trait]
impl LlmProvider for FakeProvider {
    async fn complete(&self, prompt: &str, _json_output: bool) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let responses = self.responses.read().unwrap_or_else(PoisonError::into_inner);

        let prompt_lower = prompt.to_lowercase();
        if let Some((_, response)) = responses
            .iter()
            .find(|(pattern, _)| prompt_lower.contains(pattern))
        {
            return Ok(response.clone());
        }

        match &self.default_response {
            Some(response) => Ok(response.clone()),
            None => Err(LlmError::RequestFailed(format!(
                "fake provider has no answer for prompt starting {:?}",
                prompt.chars().take(80).collect::<String>()
            ))),
        }
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }

    fn model_name(&self) -> &str {
        "fake-model"
    }
}
