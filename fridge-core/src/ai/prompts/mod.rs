//! AI prompt templates.

pub mod classify_vegan;
pub mod enrich_recipe;
pub mod smart_search;

pub use classify_vegan::render_classify_vegan_prompt;
pub use enrich_recipe::render_enrich_recipe_prompt;
pub use smart_search::render_smart_search_prompt;
