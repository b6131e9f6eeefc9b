//! Lenient JSON extraction for model-generated text.
//!
//! Models asked for "JSON only" still wrap answers in markdown fences or add
//! a sentence before the object. These helpers peel that off before parsing.

use serde::de::DeserializeOwned;

/// Remove markdown code fences (```` ```json ```` / ```` ``` ````) and trim.
pub fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "")
        .replace("```JSON", "")
        .replace("```", "")
        .trim()
        .to_string()
}

/// Slice from the first `{` to the last `}`, if both exist in that order.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

/// Parse `text` as `T`, first after stripping fences, then from the outermost
/// object embedded in it.
pub fn parse_lenient<T: DeserializeOwned>(text: &str) -> Result<T, serde_json::Error> {
    let stripped = strip_code_fences(text);
    match serde_json::from_str(&stripped) {
        Ok(value) => Ok(value),
        Err(err) => match extract_json_object(&stripped) {
            Some(object) if object.len() < stripped.len() => serde_json::from_str(object),
            _ => Err(err),
        },
    }
}

/// First `max_chars` characters of `text`, for log and error messages.
pub fn preview(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_plain_json() {
        let value: Value = parse_lenient(r#"{"a": 1}"#).unwrap();
        assert_eq!(value["a"], 1);
    }

    #[test]
    fn test_fenced_json() {
        let value: Value = parse_lenient("```json\n{\"a\": 2}\n```").unwrap();
        assert_eq!(value["a"], 2);
    }

    #[test]
    fn test_json_with_surrounding_prose() {
        let value: Value =
            parse_lenient("Sure! Here is the recipe:\n{\"a\": {\"b\": 3}}\nEnjoy.").unwrap();
        assert_eq!(value["a"]["b"], 3);
    }

    #[test]
    fn test_no_object_is_an_error() {
        assert!(parse_lenient::<Value>("I could not do that").is_err());
        assert!(extract_json_object("} backwards {").is_none());
    }

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        assert_eq!(preview("番茄炒蛋", 2), "番茄...");
        assert_eq!(preview("egg", 10), "egg");
    }
}
