pub mod classify;
pub mod enrich;
pub mod smart_search;

use crate::AppState;
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{post, MethodRouter};
use axum::{Json, Router};
use fridge_core::ai::AiError;
use fridge_core::gateway::wire::ErrorBody;
use fridge_core::llm::LlmError;
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;

/// Shared error response used by all endpoints
pub type ErrorResponse = ErrorBody;

pub fn error_response(status: StatusCode, error: &str, details: Option<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
            details,
        }),
    )
        .into_response()
}

/// 429 when the model is rate limited, so clients can tell overload from failure.
pub fn ai_error_status(err: &AiError) -> StatusCode {
    match err {
        AiError::Llm(LlmError::RateLimited { .. }) => StatusCode::TOO_MANY_REQUESTS,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn preflight() -> StatusCode {
    StatusCode::OK
}

async fn method_not_allowed() -> Response {
    error_response(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed", None)
}

/// POST handler that also answers OPTIONS and rejects every other method with JSON.
fn endpoint<H, T>(handler: H) -> MethodRouter<AppState>
where
    H: axum::handler::Handler<T, AppState>,
    T: 'static,
{
    post(handler).options(preflight).fallback(method_not_allowed)
}

/// Returns the router for the gateway endpoints (mounted at /api)
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    let api = Router::new()
        .route("/classify-vegan", endpoint(classify::classify_vegan))
        .route("/enrich-recipe", endpoint(enrich::enrich_recipe))
        .route("/smart-search", endpoint(smart_search::smart_search));

    Router::new()
        .nest("/api", api)
        .layer(cors)
        .with_state(state)
}

/// Generate the complete OpenAPI spec by merging all module specs
pub fn openapi() -> utoipa::openapi::OpenApi {
    #[derive(OpenApi)]
    #[openapi(
        info(title = "Fridge inference gateway"),
        components(schemas(ErrorResponse))
    )]
    struct BaseApi;

    let mut spec = BaseApi::openapi();

    let modules: Vec<utoipa::openapi::OpenApi> = vec![
        classify::ApiDoc::openapi(),
        enrich::ApiDoc::openapi(),
        smart_search::ApiDoc::openapi(),
    ];

    for module_spec in modules {
        spec.paths.paths.extend(module_spec.paths.paths);

        if let Some(module_components) = module_spec.components {
            if let Some(spec_components) = spec.components.as_mut() {
                spec_components.schemas.extend(module_components.schemas);
            }
        }
    }

    spec
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::GatewayState;
    use axum::body::Body;
    use axum::http::Request;
    use fridge_core::llm::FakeProvider;
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    pub fn app(provider: FakeProvider) -> Router {
        router(Arc::new(GatewayState {
            provider: Box::new(provider),
            locale: "English".to_string(),
        }))
    }

    pub async fn send(app: Router, method: Method, path: &str, body: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{app, send};
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use fridge_core::llm::FakeProvider;
    use serde_json::json;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_get_is_rejected_with_json() {
        let (status, body) = send(app(FakeProvider::new()), Method::GET, "/api/smart-search", "").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body, json!({"error": "Method Not Allowed"}));
    }

    #[tokio::test]
    async fn test_options_is_ok_with_cors_headers() {
        let request = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/classify-vegan")
            .header(header::ORIGIN, "http://localhost:5173")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
            .body(Body::empty())
            .unwrap();
        let response = app(FakeProvider::new()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
    }

    #[tokio::test]
    async fn test_bare_options_is_ok() {
        let (status, _) = send(app(FakeProvider::new()), Method::OPTIONS, "/api/enrich-recipe", "").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[test]
    fn test_openapi_lists_all_endpoints() {
        let spec = openapi();
        for path in ["/api/classify-vegan", "/api/enrich-recipe", "/api/smart-search"] {
            assert!(spec.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn test_rate_limit_maps_to_429() {
        let err = AiError::Llm(LlmError::RateLimited {
            retry_after_secs: Some(3),
        });
        assert_eq!(ai_error_status(&err), StatusCode::TOO_MANY_REQUESTS);
        let err = AiError::ParseError("bad".to_string());
        assert_eq!(ai_error_status(&err), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
