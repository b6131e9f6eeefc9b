use crate::api::{ai_error_status, error_response};
use crate::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use fridge_core::ai;
use fridge_core::gateway::wire::{ClassifyRecipe, ClassifyVeganRequest, SafeIdsResponse};
use utoipa::OpenApi;

/// Pick out the meat-free recipes
///
/// Returns the ids of recipes the model judged safe, in input order. Recipes
/// it is unsure about are left out.
#[utoipa::path(
    post,
    path = "/api/classify-vegan",
    tag = "gateway",
    request_body = ClassifyVeganRequest,
    responses(
        (status = 200, description = "Ids judged safe", body = SafeIdsResponse),
        (status = 400, description = "No recipes provided", body = crate::api::ErrorResponse),
        (status = 429, description = "Model rate limited", body = crate::api::ErrorResponse),
        (status = 500, description = "Analysis failed", body = crate::api::ErrorResponse)
    )
)]
pub async fn classify_vegan(
    State(state): State<AppState>,
    payload: Result<Json<ClassifyVeganRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "classify-vegan: bad request body");
            return error_response(StatusCode::BAD_REQUEST, "No recipes provided", None);
        }
    };

    match ai::classify_vegan(state.provider.as_ref(), &request.recipes).await {
        Ok(response) => {
            tracing::info!(
                recipes = request.recipes.len(),
                safe = response.safe_ids.len(),
                "classify-vegan: done"
            );
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "classify-vegan: analysis failed");
            error_response(ai_error_status(&e), "Analysis failed", Some(e.to_string()))
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(classify_vegan),
    components(schemas(ClassifyVeganRequest, ClassifyRecipe, SafeIdsResponse))
)]
pub struct ApiDoc;
