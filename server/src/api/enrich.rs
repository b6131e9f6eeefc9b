use crate::api::{ai_error_status, error_response};
use crate::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use fridge_core::ai;
use fridge_core::gateway::wire::EnrichRecipeRequest;
use utoipa::OpenApi;

/// Localize and restructure a recipe
///
/// Takes a TheMealDB recipe record and returns an enriched recipe: localized
/// title and description, difficulty, time estimate, tags, a nutrition
/// estimate, converted ingredient amounts and numbered steps.
#[utoipa::path(
    post,
    path = "/api/enrich-recipe",
    tag = "gateway",
    request_body = EnrichRecipeRequest,
    responses(
        (status = 200, description = "Enriched recipe"),
        (status = 400, description = "No recipe data received", body = crate::api::ErrorResponse),
        (status = 429, description = "Model rate limited", body = crate::api::ErrorResponse),
        (status = 500, description = "Enrichment failed", body = crate::api::ErrorResponse)
    )
)]
pub async fn enrich_recipe(
    State(state): State<AppState>,
    payload: Result<Json<EnrichRecipeRequest>, JsonRejection>,
) -> Response {
    let recipe_data = match payload {
        Ok(Json(request)) if !request.recipe_data.is_null() => request.recipe_data,
        _ => return error_response(StatusCode::BAD_REQUEST, "No recipe data received", None),
    };

    match ai::enrich_recipe(state.provider.as_ref(), &recipe_data, &state.locale).await {
        Ok(enriched) => {
            tracing::info!(recipe_id = %enriched.id, steps = enriched.steps.len(), "enrich-recipe: done");
            (StatusCode::OK, Json(enriched)).into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "enrich-recipe: failed");
            error_response(ai_error_status(&e), "AI conversion failed", Some(e.to_string()))
        }
    }
}

#[derive(OpenApi)]
#[openapi(paths(enrich_recipe), components(schemas(EnrichRecipeRequest)))]
pub struct ApiDoc;
