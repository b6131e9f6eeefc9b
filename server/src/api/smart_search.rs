use crate::api::{ai_error_status, error_response};
use crate::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use fridge_core::ai;
use fridge_core::gateway::wire::{SmartSearchRequest, SmartSearchResponse};
use utoipa::OpenApi;

/// Turn free text into English ingredient keywords
#[utoipa::path(
    post,
    path = "/api/smart-search",
    tag = "gateway",
    request_body = SmartSearchRequest,
    responses(
        (status = 200, description = "Comma-joined English keywords", body = SmartSearchResponse),
        (status = 400, description = "Search term is required", body = crate::api::ErrorResponse),
        (status = 500, description = "Search analysis failed", body = crate::api::ErrorResponse)
    )
)]
pub async fn smart_search(
    State(state): State<AppState>,
    payload: Result<Json<SmartSearchRequest>, JsonRejection>,
) -> Response {
    let search_term = match payload {
        Ok(Json(request)) if !request.search_term.trim().is_empty() => request.search_term,
        _ => return error_response(StatusCode::BAD_REQUEST, "Search term is required", None),
    };

    match ai::interpret_search(state.provider.as_ref(), &search_term).await {
        Ok(response) => {
            tracing::info!(
                input = %response.original_input,
                keyword = %response.english_keyword,
                "smart-search: interpreted"
            );
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            tracing::warn!(error = %e, "smart-search: failed");
            error_response(ai_error_status(&e), "Search analysis failed", Some(e.to_string()))
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(smart_search),
    components(schemas(SmartSearchRequest, SmartSearchResponse))
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use crate::api::test_support::{app, send};
    use axum::http::{Method, StatusCode};
    use fridge_core::llm::FakeProvider;
    use serde_json::json;

    #[tokio::test]
    async fn test_interprets_term() {
        let provider = FakeProvider::with_response(
            "culinary search assistant",
            r#"{"original_input": "蛋,番茄", "english_keyword": "egg,tomato", "is_multiple": true}"#,
        );
        let body = json!({"searchTerm": "蛋,番茄"}).to_string();
        let (status, body) = send(app(provider), Method::POST, "/api/smart-search", &body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"original_input": "蛋,番茄", "english_keyword": "egg,tomato", "is_multiple": true})
        );
    }

    #[tokio::test]
    async fn test_blank_term_is_400() {
        let body = json!({"searchTerm": "  "}).to_string();
        let (status, body) = send(app(FakeProvider::new()), Method::POST, "/api/smart-search", &body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Search term is required");
    }
}
