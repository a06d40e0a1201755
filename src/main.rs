use axum::{http::StatusCode, response::IntoResponse, routing::get, Router};
use credit_risk_api::auth::IdentityVerifier;
use credit_risk_api::config::Config;
use credit_risk_api::handlers::{self, AppState};
use credit_risk_api::provider::InfoExpertoClient;
use credit_risk_api::report_cache::ReportCache;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_governor::{
    governor::GovernorConfigBuilder, key_extractor::SmartIpKeyExtractor, GovernorLayer,
};
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Serves the OpenAPI specification YAML file.
///
/// If the file is not found, it returns a 404 error.
async fn serve_openapi_spec() -> impl IntoResponse {
    match tokio::fs::read_to_string("openapi.yml").await {
        Ok(content) => (
            StatusCode::OK,
            [(axum::http::header::CONTENT_TYPE, "text/yaml")],
            content,
        )
            .into_response(),
        Err(_) => (StatusCode::NOT_FOUND, "OpenAPI spec not found").into_response(),
    }
}

/// Serves the Swagger UI HTML page pointing at `serve_openapi_spec`.
async fn serve_swagger_ui() -> impl IntoResponse {
    let html = r#"
<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Credit Risk API - Swagger UI</title>
    <link rel="stylesheet" type="text/css" href="https://unpkg.com/swagger-ui-dist@5/swagger-ui.css">
    <style>
        body { margin: 0; padding: 0; }
    </style>
</head>
<body>
    <div id="swagger-ui"></div>
    <script src="https://unpkg.com/swagger-ui-dist@5/swagger-ui-bundle.js"></script>
    <script>
        window.onload = function() {
            window.ui = SwaggerUIBundle({
                url: "/api-docs/openapi.yml",
                dom_id: '#swagger-ui',
                deepLinking: true
            });
        };
    </script>
</body>
</html>
"#;
    (
        StatusCode::OK,
        [(axum::http::header::CONTENT_TYPE, "text/html; charset=utf-8")],
        html,
    )
}

/// Main entry point for the application.
///
/// Initializes tracing, configuration, the provider and identity clients, the report
/// cache, and the HTTP routes and middleware, then starts the Axum server.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "credit_risk_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let provider = InfoExpertoClient::new(
        config.provider_base_url.clone(),
        config.provider_api_key.clone(),
    )?;
    tracing::info!("✓ InfoExperto client initialized: {}", config.provider_base_url);

    let verifier = match config.identity_api_key.clone() {
        Some(api_key) => {
            let verifier = IdentityVerifier::new(config.identity_base_url.clone(), api_key)?;
            tracing::info!("✓ Identity verifier initialized: {}", config.identity_base_url);
            Some(verifier)
        }
        None => {
            tracing::warn!("Identity verifier disabled, all callers are anonymous");
            None
        }
    };

    // Provider reports only; assessments are always recomputed
    let report_cache = ReportCache::new(
        Duration::from_secs(config.report_cache_ttl_secs),
        10_000,
    );
    tracing::info!(
        "Report cache initialized (enabled: {}, TTL {}s)",
        report_cache.is_enabled(),
        config.report_cache_ttl_secs
    );

    let app_state = Arc::new(AppState {
        config: config.clone(),
        provider,
        verifier,
        report_cache,
    });

    // Configure rate limiter: 5 requests/second per IP, burst of 10
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(5)
            .burst_size(10)
            .key_extractor(SmartIpKeyExtractor)
            .finish()
            .ok_or_else(|| anyhow::anyhow!("Invalid rate limiter configuration"))?,
    );

    let protected_routes = Router::new()
        // API Documentation
        .route("/docs", get(serve_swagger_ui))
        .route("/api-docs/openapi.yml", get(serve_openapi_spec))
        .merge(handlers::api_routes())
        .layer(
            ServiceBuilder::new()
                // Reports are small; 1MB is plenty for an inline assessment body
                .layer(RequestBodyLimitLayer::new(1024 * 1024))
                .layer(GovernorLayer {
                    config: governor_conf,
                }),
        );

    // Health check bypasses rate limiting
    let app = Router::new()
        .route("/health", get(handlers::health))
        .merge(protected_routes)
        .with_state(app_state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
