//! Synapse HTTP: REST transport adapter for the Synapse query server.
//!
//! Provides the HTTP interface including:
//! - Query translation (`GET /query?query=...`, `POST /query`)
//! - Health and Prometheus metrics endpoints
//! - OpenAPI/Swagger UI
//! - Request-ID middleware
//!
//! Every failure, including unmatched routes and unreadable bodies, is
//! rendered through the service's failure classifier as `{"reason": ...}`.

pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod types;

use axum::Router;
use axum::http::{HeaderValue, Method};
use axum::routing::get;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use synapse_service::classify::ErrorResponse;
use synapse_service::query::{Comparator, FieldRef, Filter, QueryStatement};

pub use error::ApiError;
pub use state::AppState;

// ---------------------------------------------------------------------------
// OpenAPI
// ---------------------------------------------------------------------------

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Synapse Query API",
        description = "Translates Synapse query strings into structured query statements.\n\nFailures are returned as `{\"reason\": \"...\"}` with a classified HTTP status.",
        version = "0.3.2",
        license(name = "Apache-2.0"),
    ),
    paths(
        routes::system::health,
        routes::query::query_get,
        routes::query::query_post,
    ),
    components(
        schemas(
            types::QueryRequest, types::HealthResponse, ErrorResponse,
            QueryStatement, Filter, FieldRef, Comparator,
        )
    ),
    tags(
        (name = "Query", description = "Query translation"),
        (name = "System", description = "System and health endpoints"),
    )
)]
struct ApiDoc;

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Builds the HTTP API router.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route(
            "/query",
            get(routes::query::query_get).post(routes::query::query_post),
        )
        .route("/health", get(routes::system::health))
        .route("/metrics", get(routes::system::metrics_endpoint))
        .fallback(routes::system::no_route)
        .method_not_allowed_fallback(routes::system::no_route)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(
            middleware::request_id::request_id_middleware,
        ))
        .layer(cors_layer(&state))
        .with_state(state);

    api.merge(SwaggerUi::new("/api/docs").url("/api/openapi.json", ApiDoc::openapi()))
}

/// Serve the HTTP router on the given listener with graceful shutdown.
pub async fn serve(
    listener: tokio::net::TcpListener,
    app: Router,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}

fn cors_layer(state: &AppState) -> CorsLayer {
    let origins = state.cors_origins();

    // No origins configured → no CORS headers (deny cross-origin by default).
    if origins.is_empty() {
        return CorsLayer::new();
    }

    let x_request_id = middleware::request_id::X_REQUEST_ID.clone();
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([axum::http::header::CONTENT_TYPE, x_request_id.clone()])
        .expose_headers([x_request_id]);

    if origins.len() == 1 && origins[0] == "*" {
        tracing::warn!("CORS configured with wildcard origin, all cross-origin requests allowed");
        base.allow_origin(tower_http::cors::Any)
    } else {
        let parsed: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|o| match o.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin = %o, "ignoring invalid CORS origin");
                    None
                }
            })
            .collect();
        base.allow_origin(parsed)
    }
}
