//! Free-text to English ingredient keywords.

/// Prompt name for logs.
pub const SMART_SEARCH_PROMPT_NAME: &str = "smart_search";

pub fn render_smart_search_prompt(search_term: &str) -> String {
    // Quoted as a JSON string so the input cannot break out of the prompt.
    let quoted = serde_json::Value::String(search_term.to_string()).to_string();
    format!(
        r#"You are a culinary search assistant. The user writes a sentence or a list of ingredients, usually in Chinese.

Your goal:
1. Identify every key food ingredient in the input.
2. Translate them into English keywords.
3. Join them with commas into a single string, e.g. "chicken_breast,garlic".
4. Use underscores instead of spaces inside multi-word ingredients.

User input: {quoted}

Respond with JSON only, no other text:
{{"original_input": {quoted}, "english_keyword": "pork,apple", "is_multiple": true}}"#,
        quoted = quoted
    )
}
