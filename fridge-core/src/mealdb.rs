//! TheMealDB client.
//!
//! Three endpoints are used: free-text search by name, the multi-ingredient
//! filter, and lookup by id. All of them answer `{"meals": [...]}` with
//! `null` (or occasionally a string) when nothing matched.

use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use url::Url;

use crate::error::FetchError;
use crate::http::HttpClient;
use crate::json::preview;
use crate::types::Recipe;

pub const DEFAULT_MEALDB_URL: &str = "https://www.themealdb.com/api/json/v1/1";

#[derive(Debug, Deserialize)]
struct MealsEnvelope {
    #[serde(default)]
    meals: Value,
}

/// Decode a `{"meals": ...}` body. Anything other than an array means no matches.
fn decode_meals(url: &str, body: &str) -> Result<Vec<Recipe>, FetchError> {
    let envelope: MealsEnvelope = serde_json::from_str(body).map_err(|e| {
        tracing::warn!(url, error = %e, body = %preview(body, 200), "mealdb: undecodable body");
        FetchError::InvalidBody(e.to_string())
    })?;

    match envelope.meals {
        Value::Array(_) => serde_json::from_value(envelope.meals)
            .map_err(|e| FetchError::InvalidBody(e.to_string())),
        _ => Ok(Vec::new()),
    }
}

/// Recipe database client.
#[derive(Clone)]
pub struct MealDb {
    http: Arc<dyn HttpClient>,
    base: Url,
}

impl MealDb {
    pub fn new(http: Arc<dyn HttpClient>, base_url: &str) -> Result<Self, FetchError> {
        let base = Url::parse(base_url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
        Ok(Self { http, base })
    }

    fn endpoint(&self, file: &str, key: &str, value: &str) -> String {
        let mut url = self.base.clone();
        let path = format!("{}/{}", url.path().trim_end_matches('/'), file);
        url.set_path(&path);
        url.query_pairs_mut().clear().append_pair(key, value);
        url.to_string()
    }

    /// URL of the single-term search endpoint for `term`.
    pub fn search_url(&self, term: &str) -> String {
        self.endpoint("search.php", "s", term)
    }

    /// URL of the multi-ingredient filter endpoint for a comma-joined list.
    pub fn filter_url(&self, ingredients: &str) -> String {
        self.endpoint("filter.php", "i", ingredients)
    }

    pub fn lookup_url(&self, id: &str) -> String {
        self.endpoint("lookup.php", "i", id)
    }

    /// Recipes whose name matches `term`.
    pub async fn search_by_name(&self, term: &str) -> Result<Vec<Recipe>, FetchError> {
        let url = self.search_url(term);
        let body = self.http.get_text(&url).await?;
        let meals = decode_meals(&url, &body)?;
        tracing::debug!(term, count = meals.len(), "mealdb: search");
        Ok(meals)
    }

    /// Recipes containing every ingredient in the comma-joined list.
    ///
    /// Rows only carry id, title and thumbnail.
    pub async fn filter_by_ingredients(&self, ingredients: &str) -> Result<Vec<Recipe>, FetchError> {
        let url = self.filter_url(ingredients);
        let body = self.http.get_text(&url).await?;
        let meals = decode_meals(&url, &body)?;
        tracing::debug!(ingredients, count = meals.len(), "mealdb: filter");
        Ok(meals)
    }

    /// Full record for one recipe, or `None` if the id is unknown.
    pub async fn lookup(&self, id: &str) -> Result<Option<Recipe>, FetchError> {
        let url = self.lookup_url(id);
        let body = self.http.get_text(&url).await?;
        Ok(decode_meals(&url, &body)?.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{MockClient, MockResponse};
    use serde_json::json;

    fn db(mock: MockClient) -> MealDb {
        MealDb::new(Arc::new(mock), "http://mealdb.test/api/json/v1/1/").unwrap()
    }

    #[test]
    fn test_urls_are_encoded() {
        let db = db(MockClient::new());
        assert_eq!(
            db.search_url("fried rice"),
            "http://mealdb.test/api/json/v1/1/search.php?s=fried+rice"
        );
        assert_eq!(
            db.filter_url("egg,tomato"),
            "http://mealdb.test/api/json/v1/1/filter.php?i=egg%2Ctomato"
        );
        assert_eq!(
            db.lookup_url("52772"),
            "http://mealdb.test/api/json/v1/1/lookup.php?i=52772"
        );
    }

    #[tokio::test]
    async fn test_null_meals_is_empty() {
        let probe = db(MockClient::new());
        let url = probe.search_url("zzz");
        let db = db(MockClient::new().with_json(&url, json!({"meals": null})));
        assert!(db.search_by_name("zzz").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_string_meals_is_empty() {
        let probe = db(MockClient::new());
        let url = probe.filter_url("a,b");
        let db = db(MockClient::new().with_json(&url, json!({"meals": "no data found"})));
        assert!(db.filter_by_ingredients("a,b").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_lookup_returns_first_meal() {
        let probe = db(MockClient::new());
        let url = probe.lookup_url("7");
        let db = db(MockClient::new().with_json(
            &url,
            json!({"meals": [{"idMeal": "7", "strMeal": "Dal", "strIngredient1": "Lentils"}]}),
        ));
        let recipe = db.lookup("7").await.unwrap().unwrap();
        assert_eq!(recipe.title, "Dal");
        assert_eq!(recipe.ingredients[0].ingredient, "Lentils");
    }

    #[tokio::test]
    async fn test_garbage_body_is_invalid() {
        let probe = db(MockClient::new());
        let url = probe.search_url("x");
        let db = db(MockClient::new().with_response(&url, MockResponse::Body("<html>".into())));
        assert!(matches!(
            db.search_by_name("x").await,
            Err(FetchError::InvalidBody(_))
        ));
    }
}
