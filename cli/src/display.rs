//! Plain-text rendering for the terminal.

use fridge_core::{EnrichedRecipe, Recipe, ShoppingList};
use std::fmt::Write;

pub fn results(recipes: &[Recipe], total: usize, vegan: bool) -> String {
    let mut out = String::new();
    if recipes.is_empty() {
        out.push_str("No recipes found.\n");
        return out;
    }
    if vegan && recipes.len() < total {
        let _ = writeln!(out, "{} of {} recipes are meat-free:", recipes.len(), total);
    }
    for recipe in recipes {
        let _ = writeln!(
            out,
            "{:>8}  {}  [{}]",
            recipe.id,
            recipe.title,
            recipe.category_or_unknown()
        );
    }
    out
}

pub fn recipe(recipe: &Recipe) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} (#{})", recipe.title, recipe.id);
    let origin: Vec<&str> = [recipe.category.as_deref(), recipe.area.as_deref()]
        .into_iter()
        .flatten()
        .filter(|s| !s.trim().is_empty())
        .collect();
    if !origin.is_empty() {
        let _ = writeln!(out, "{}", origin.join(" / "));
    }
    if let Some(instructions) = recipe.instructions.as_deref() {
        let _ = writeln!(out, "\n{}", instructions.trim());
    }
    if let Some(url) = recipe.youtube_url.as_deref().filter(|u| !u.is_empty()) {
        let _ = writeln!(out, "\nVideo: {url}");
    }
    out
}

pub fn shopping_list(list: &ShoppingList) -> String {
    let mut out = String::from("\nShopping list:\n");
    for item in list.visible() {
        let check = if item.is_completed { "x" } else { " " };
        let _ = write!(out, "  {:>2}. [{check}] {}", item.index, item.text);
        if let Some(measure) = item.measure.as_deref().filter(|m| !m.trim().is_empty()) {
            let _ = write!(out, " ({measure})");
        }
        out.push('\n');
    }
    let hidden = list.items().len() - list.visible().count();
    if hidden > 0 {
        let _ = writeln!(out, "  ({hidden} archived; `restore-all` brings them back)");
    }
    out
}

pub fn enriched(recipe: &EnrichedRecipe) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n== {} ==", recipe.display_title());
    if !recipe.description_localized.is_empty() {
        let _ = writeln!(out, "{}", recipe.description_localized);
    }
    let _ = writeln!(
        out,
        "{} · {} · {:.0} kcal",
        recipe.difficulty.label_zh(),
        recipe.time_estimate,
        recipe.nutrition_estimate.calories
    );
    if !recipe.tags.is_empty() {
        let tags: Vec<&str> = recipe.tags.iter().map(String::as_str).collect();
        let _ = writeln!(out, "#{}", tags.join(" #"));
    }

    out.push('\n');
    for ingredient in &recipe.ingredients {
        let _ = writeln!(out, "  - {} {}", ingredient.item, ingredient.amount);
    }
    out.push('\n');
    for step in &recipe.steps {
        match &step.action_tag {
            Some(tag) => {
                let _ = writeln!(out, "{}. [{tag}] {}", step.step_number, step.content);
            }
            None => {
                let _ = writeln!(out, "{}. {}", step.step_number, step.content);
            }
        }
    }
    out
}
