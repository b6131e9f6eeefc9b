//! Structured, localized recipe content produced by enrichment.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Traditional Chinese label.
    pub fn label_zh(self) -> &'static str {
        match self {
            Difficulty::Easy => "簡單",
            Difficulty::Medium => "中等",
            Difficulty::Hard => "困難",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        };
        f.write_str(label)
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" | "簡單" | "简单" | "容易" => Ok(Difficulty::Easy),
            "medium" | "中等" | "普通" => Ok(Difficulty::Medium),
            "hard" | "困難" | "困难" | "difficult" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty: {other:?}")),
        }
    }
}

impl<'de> Deserialize<'de> for Difficulty {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Strings that models sometimes send as numbers or null.
fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Numbers that models sometimes send as "450" or "450 kcal".
fn lenient_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| serde::de::Error::custom("calories out of range")),
        Value::String(s) => {
            let digits: String = s
                .trim()
                .chars()
                .take_while(|c| c.is_ascii_digit() || *c == '.')
                .collect();
            digits
                .parse()
                .map_err(|_| serde::de::Error::custom(format!("calories is not a number: {s:?}")))
        }
        Value::Null => Ok(0.0),
        other => Err(serde::de::Error::custom(format!(
            "calories is not a number: {other}"
        ))),
    }
}

fn blank_as_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NutritionEstimate {
    #[serde(default, deserialize_with = "lenient_number")]
    pub calories: f64,
    #[serde(default, deserialize_with = "lenient_text")]
    pub protein: String,
    #[serde(default, alias = "carbon", alias = "carbs", deserialize_with = "lenient_text")]
    pub carbohydrates: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedIngredient {
    pub item: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub amount: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub original_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// 1-based.
    pub step_number: u32,
    pub content: String,
    #[serde(default, deserialize_with = "blank_as_none", skip_serializing_if = "Option::is_none")]
    pub action_tag: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRecipe {
    #[serde(default, deserialize_with = "lenient_text")]
    pub id: String,
    #[serde(default, alias = "title_en")]
    pub title_original: String,
    #[serde(default, alias = "title_zh")]
    pub title_localized: String,
    #[serde(default, alias = "description_zh")]
    pub description_localized: String,
    pub difficulty: Difficulty,
    #[serde(default, deserialize_with = "lenient_text")]
    pub time_estimate: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub nutrition_estimate: NutritionEstimate,
    #[serde(default)]
    pub ingredients: Vec<EnrichedIngredient>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl EnrichedRecipe {
    /// Sort steps and check they read 1, 2, 3, ...
    pub fn validate(&mut self) -> Result<(), String> {
        if self.title_localized.trim().is_empty() && self.title_original.trim().is_empty() {
            return Err("missing title".to_string());
        }
        if self.steps.is_empty() {
            return Err("no steps".to_string());
        }

        self.steps.sort_by_key(|step| step.step_number);
        for (expected, step) in (1u32..).zip(&self.steps) {
            if step.step_number != expected {
                return Err(format!(
                    "steps must be numbered from 1 without gaps, found {} at position {expected}",
                    step.step_number
                ));
            }
            if step.content.trim().is_empty() {
                return Err(format!("step {expected} is empty"));
            }
        }
        Ok(())
    }

    /// Localized title, falling back to the original.
    pub fn display_title(&self) -> &str {
        if self.title_localized.trim().is_empty() {
            &self.title_original
        } else {
            &self.title_localized
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "id": 52772,
            "title_en": "Teriyaki Chicken Casserole",
            "title_zh": "照燒雞肉焗烤",
            "description_zh": "甜鹹醬汁包覆嫩雞。",
            "difficulty": "中等",
            "time_estimate": "45分鐘",
            "tags": ["日式", "烤箱", "日式"],
            "nutrition_estimate": {"calories": "520 kcal", "protein": 32, "carbon": "48g"},
            "ingredients": [{"item": "醬油", "amount": "3/4 杯", "original_text": "3/4 cup soy sauce"}],
            "steps": [
                {"step_number": 2, "content": "淋上醬汁。", "action_tag": ""},
                {"step_number": 1, "content": "烤箱預熱。", "action_tag": "預熱"}
            ]
        })
    }

    #[test]
    fn test_accepts_gateway_field_names() {
        let mut recipe: EnrichedRecipe = serde_json::from_value(sample()).unwrap();
        recipe.validate().unwrap();

        assert_eq!(recipe.id, "52772");
        assert_eq!(recipe.title_localized, "照燒雞肉焗烤");
        assert_eq!(recipe.difficulty, Difficulty::Medium);
        assert_eq!(recipe.tags.len(), 2);
        assert_eq!(recipe.nutrition_estimate.calories, 520.0);
        assert_eq!(recipe.nutrition_estimate.protein, "32");
        assert_eq!(recipe.nutrition_estimate.carbohydrates, "48g");
        assert_eq!(recipe.steps[0].step_number, 1);
        assert_eq!(recipe.steps[0].action_tag.as_deref(), Some("預熱"));
        assert_eq!(recipe.steps[1].action_tag, None);
    }

    #[test]
    fn test_difficulty_is_closed() {
        assert_eq!("Easy".parse(), Ok(Difficulty::Easy));
        assert_eq!("困難".parse(), Ok(Difficulty::Hard));
        let mut value = sample();
        value["difficulty"] = json!("extreme");
        assert!(serde_json::from_value::<EnrichedRecipe>(value).is_err());
    }

    #[test]
    fn test_rejects_gapped_steps() {
        let mut value = sample();
        value["steps"] = json!([
            {"step_number": 1, "content": "a"},
            {"step_number": 3, "content": "b"}
        ]);
        let mut recipe: EnrichedRecipe = serde_json::from_value(value).unwrap();
        assert!(recipe.validate().is_err());
    }

    #[test]
    fn test_rejects_missing_steps() {
        let mut value = sample();
        value["steps"] = json!([]);
        let mut recipe: EnrichedRecipe = serde_json::from_value(value).unwrap();
        assert_eq!(recipe.validate().unwrap_err(), "no steps");
    }
}
