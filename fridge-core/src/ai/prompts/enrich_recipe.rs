//! Recipe localization and restructuring prompt.

/// Prompt name for logs.
pub const ENRICH_RECIPE_PROMPT_NAME: &str = "enrich_recipe";

/// Language the enrichment is written in unless configured otherwise.
pub const DEFAULT_LOCALE: &str = "Traditional Chinese as used in Taiwan";

/// Render the enrichment prompt for a TheMealDB-shaped recipe.
pub fn render_enrich_recipe_prompt(recipe_json: &str, locale: &str) -> String {
    format!(
        r#"You are a professional chef and nutritionist. Rewrite the raw recipe data below for home cooks who read {locale}.

Raw data:
{recipe_json}

Respond with JSON only, no markdown, exactly in this shape:
{{
  "id": "the original id",
  "title_original": "the original English title",
  "title_localized": "an appetizing title in {locale}",
  "description_localized": "30 to 50 words describing texture and flavour, in {locale}",
  "difficulty": "easy" | "medium" | "hard",
  "time_estimate": "estimated total time, e.g. 25 minutes, in {locale}",
  "tags": ["tag1", "tag2", "tag3"],
  "nutrition_estimate": {{
    "calories": 450,
    "protein": "estimated protein in grams",
    "carbohydrates": "estimated carbohydrates in grams"
  }},
  "ingredients": [
    {{
      "item": "ingredient name in {locale}",
      "amount": "amount in units common to {locale} cooks",
      "original_text": "the original English ingredient and measure"
    }}
  ],
  "steps": [
    {{
      "step_number": 1,
      "content": "clear, friendly instruction in {locale}",
      "action_tag": "the key technique in two to four characters or words, or an empty string"
    }}
  ]
}}

Notes:
1. Estimate missing values such as nutrition from the ingredients.
2. Localize ingredient names the way local cooks say them.
3. Number steps from 1 with no gaps."#,
        recipe_json = recipe_json,
        locale = locale
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_prompt() {
        let prompt = render_enrich_recipe_prompt(r#"{"strMeal":"Dal"}"#, DEFAULT_LOCALE);
        assert!(prompt.contains(r#"{"strMeal":"Dal"}"#));
        assert!(prompt.contains("Traditional Chinese"));
        assert!(prompt.contains("step_number"));
    }
}
