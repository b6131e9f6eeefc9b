mod api;

use anyhow::Context;
use axum::body::Body;
use axum::extract::MatchedPath;
use axum::http::{Request, Response};
use fridge_core::ai::prompts::enrich_recipe::DEFAULT_LOCALE;
use fridge_core::llm::{LlmConfig, LlmProvider};
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tower_http::classify::ServerErrorsFailureClass;
use tower_http::trace::TraceLayer;
use tracing::Span;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use utoipa_swagger_ui::SwaggerUi;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// What every handler needs: the model and the enrichment language.
#[derive(Debug)]
pub struct GatewayState {
    pub provider: Box<dyn LlmProvider>,
    pub locale: String,
}

/// Application state shared across all handlers
pub type AppState = Arc<GatewayState>;

/// One span per gateway call, named after the matched route.
fn request_span(request: &Request<Body>) -> Span {
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map_or(request.uri().path(), MatchedPath::as_str);
    tracing::info_span!("gateway", method = %request.method(), route = %route)
}

fn log_response(response: &Response<Body>, latency: Duration, _span: &Span) {
    let status = response.status();
    let elapsed_ms = latency.as_millis() as u64;
    if status.is_server_error() {
        tracing::error!(status = status.as_u16(), elapsed_ms, "gateway call failed");
    } else if status.is_client_error() {
        tracing::warn!(status = status.as_u16(), elapsed_ms, "gateway call rejected");
    } else {
        tracing::info!(status = status.as_u16(), elapsed_ms, "gateway call served");
    }
}

fn init_telemetry() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Check for --openapi flag to dump spec and exit
    if env::args().any(|arg| arg == "--openapi") {
        let spec = api::openapi()
            .to_pretty_json()
            .context("Failed to serialize OpenAPI document")?;
        println!("{}", spec);
        return Ok(());
    }

    init_telemetry();

    let config = LlmConfig::from_env().context("LLM provider is not configured")?;
    let provider = config.into_provider();
    tracing::info!(
        provider = provider.provider_name(),
        model = provider.model_name(),
        "LLM provider ready"
    );

    let state: AppState = Arc::new(GatewayState {
        provider,
        locale: env::var("FRIDGE_ENRICH_LOCALE").unwrap_or_else(|_| DEFAULT_LOCALE.to_string()),
    });

    let swagger_ui = SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api::openapi());

    let app = api::router(state)
        .merge(swagger_ui)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(request_span)
                .on_request(|_request: &Request<Body>, _span: &Span| {})
                .on_response(log_response)
                .on_failure(
                    |failure: ServerErrorsFailureClass, latency: Duration, _span: &Span| {
                        tracing::error!(
                            %failure,
                            elapsed_ms = latency.as_millis() as u64,
                            "gateway request errored"
                        );
                    },
                ),
        );

    let bind_addr = env::var("FRIDGE_BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {bind_addr}"))?;
    let local_addr = listener.local_addr()?;

    tracing::info!("Server listening on {}", local_addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui/", local_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
