use crate::ai::prompts::smart_search::{render_smart_search_prompt, SMART_SEARCH_PROMPT_NAME};
use crate::ai::AiError;
use crate::gateway::wire::SmartSearchResponse;
use crate::json::{parse_lenient, preview};
use crate::llm::LlmProvider;

/// Turn free text into comma-joined English ingredient keywords.
pub async fn interpret_search(
    provider: &dyn LlmProvider,
    search_term: &str,
) -> Result<SmartSearchResponse, AiError> {
    let prompt = render_smart_search_prompt(search_term);
    tracing::debug!(prompt = SMART_SEARCH_PROMPT_NAME, search_term, "ai: interpreting search");
    let text = provider.complete(&prompt, true).await?;

    let mut response: SmartSearchResponse = parse_lenient(&text).map_err(|e| {
        AiError::ParseError(format!("{e}; got {}", preview(&text, 200)))
    })?;

    response.english_keyword = response.english_keyword.trim().to_string();
    if response.english_keyword.is_empty() {
        return Err(AiError::ParseError("model returned no keywords".to_string()));
    }
    if response.original_input.is_empty() {
        response.original_input = search_term.to_string();
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::FakeProvider;

    #[tokio::test]
    async fn test_interpret_fenced_output() {
        let provider = FakeProvider::with_response(
            "culinary search assistant",
            "```json\n{\"english_keyword\": \" egg,tomato \", \"is_multiple\": true}\n```",
        );
        let response = interpret_search(&provider, "蛋,番茄").await.unwrap();
        assert_eq!(response.english_keyword, "egg,tomato");
        assert_eq!(response.original_input, "蛋,番茄");
        assert_eq!(response.is_multiple, Some(true));
    }

    #[tokio::test]
    async fn test_empty_keyword_is_an_error() {
        let provider = FakeProvider::new().with_default_response(r#"{"english_keyword": ""}"#);
        assert!(interpret_search(&provider, "蛋").await.is_err());
    }
}
