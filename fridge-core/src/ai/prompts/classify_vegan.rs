//! Vegetarian-safety classification prompt.

/// Prompt name for logs.
pub const CLASSIFY_VEGAN_PROMPT_NAME: &str = "classify_vegan";

/// Render the classification prompt for a JSON array of recipes.
pub fn render_classify_vegan_prompt(recipes_json: &str) -> String {
    format!(
        r#"You are a strict vegetarian filter. Analyze the provided recipes and identify which ones contain no meat.

Rules:
1. EXCLUDE anything with beef, pork, chicken, lamb, seafood, fish, bacon, ham, sausage, gelatin, lard, meat stock, fish sauce or oyster sauce.
2. Eggs, milk, cheese, butter, cream and honey are allowed.

Missing data:
- If "ingredientsText" says the data is missing, judge from the title and category.
- Example: "Beef Wellington" is unsafe. "Avocado Salad" is safe.
- If unsure, exclude the recipe.

Input data:
{recipes_json}

Respond with JSON only, no other text: {{"safeIds": ["52772", "53380"]}}"#,
        recipes_json = recipes_json
    )
}
