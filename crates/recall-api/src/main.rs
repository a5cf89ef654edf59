//! recall-api - HTTP API server for recall.

mod handlers;

use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use governor::{Quota, RateLimiter};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use uuid::Uuid;

use recall_core::ApiKeyRepository;
use recall_db::Database;

use handlers::highlights::{create_highlight, get_highlight};
use handlers::review::{create_session, list_due, submit_rating};

// =============================================================================
// REQUEST ID (UUIDv7)
// =============================================================================

/// Generates time-ordered UUIDv7 request correlation IDs.
///
/// UUIDv7 embeds a Unix timestamp, so IDs sort chronologically, which helps
/// log correlation when tracing a review session across requests.
#[derive(Clone, Default)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

/// Global rate limiter type (direct quota, no keyed bucketing for a
/// personal server).
type GlobalRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    /// Global rate limiter (None if rate limiting is disabled).
    rate_limiter: Option<Arc<GlobalRateLimiter>>,
}

/// OpenAPI documentation, served as plain JSON at `/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Recall API",
        description = "Spaced-repetition review service: due-card selection, SM-2 scheduling, and session bookkeeping"
    ),
    components(schemas(
        recall_core::Highlight,
        recall_core::CreateHighlightRequest,
        recall_core::DueCards,
        recall_core::ReviewSession,
        recall_core::ReviewEvent,
        recall_core::ReviewStatus,
        recall_core::SubmitOutcome,
    )),
    tags(
        (name = "Review", description = "Due cards, sessions, and rating submission"),
        (name = "Highlights", description = "Minimal highlight lifecycle"),
        (name = "System", description = "Health checks")
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with configurable output
    //
    // Environment variables:
    //   LOG_FORMAT  - "json" or "text" (default: "text")
    //   LOG_FILE    - path to log file (optional, enables file logging)
    //   RUST_LOG    - standard env filter (default: "recall_api=debug,tower_http=info")
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "recall_api=debug,tower_http=info".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    let _file_guard = if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("recall-api.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(non_blocking),
                )
                .init();
        }
        Some(guard)
    } else if log_format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
        None
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stdout)"),
        "Logging initialized"
    );

    // Get configuration from environment
    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "postgres://localhost/recall".to_string());
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse()
        .unwrap_or(3000);

    // Rate limiting configuration (generous for a personal server)
    let rate_limit_requests: u32 = std::env::var("RATE_LIMIT_REQUESTS")
        .unwrap_or_else(|_| "100".to_string())
        .parse()
        .unwrap_or(100);
    let rate_limit_period_secs: u64 = std::env::var("RATE_LIMIT_PERIOD_SECS")
        .unwrap_or_else(|_| "60".to_string())
        .parse()
        .unwrap_or(60);
    let rate_limit_enabled: bool = std::env::var("RATE_LIMIT_ENABLED")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(true);

    // Connect to database
    info!("Connecting to database...");
    let db = Database::connect(&database_url).await?;
    recall_db::log_pool_metrics(db.pool());
    info!("Database connected");

    info!("Running database migrations...");
    db.migrate().await?;
    info!("Database migrations complete");

    let rate_limiter = if rate_limit_enabled {
        let quota = Quota::with_period(std::time::Duration::from_secs(rate_limit_period_secs))
            .expect("Rate limit period must be non-zero")
            .allow_burst(NonZeroU32::new(rate_limit_requests).expect("Rate limit must be non-zero"));
        info!(
            rate_limit_requests,
            rate_limit_period_secs, "Rate limiting enabled"
        );
        Some(Arc::new(RateLimiter::direct(quota)))
    } else {
        info!("Rate limiting disabled");
        None
    };

    let state = AppState { db, rate_limiter };

    let app = Router::new()
        // Health check
        .route("/health", get(health_check))
        // OpenAPI
        .route("/openapi.json", get(openapi_json))
        // Review flow
        .route("/api/v1/review/due", get(list_due))
        .route("/api/v1/review/session", post(create_session))
        .route("/api/v1/review/submit", post(submit_rating))
        // Highlights
        .route("/api/v1/highlights", post(create_highlight))
        .route("/api/v1/highlights/:id", get(get_highlight))
        // Middleware
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer({
            let allowed_origins = parse_allowed_origins();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(allowed_origins))
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        })
        // Review payloads are tiny; anything larger is a client bug.
        .layer(RequestBodyLimitLayer::new(256 * 1024))
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Allowed CORS origins from `CORS_ALLOWED_ORIGINS` (comma-separated),
/// defaulting to the local web client.
fn parse_allowed_origins() -> Vec<HeaderValue> {
    std::env::var("CORS_ALLOWED_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:3000".to_string())
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect()
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "recall-api",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn openapi_json() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

async fn rate_limit_middleware(
    axum::extract::State(state): axum::extract::State<AppState>,
    request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    if let Some(limiter) = &state.rate_limiter {
        if limiter.check().is_err() {
            tracing::warn!("Rate limit exceeded");
            return Err((
                StatusCode::TOO_MANY_REQUESTS,
                Json(serde_json::json!({
                    "error": "rate_limit_exceeded",
                    "error_description": "Too many requests. Please wait before retrying."
                })),
            ));
        }
    }
    Ok(next.run(request).await)
}

// =============================================================================
// AUTHENTICATION
// =============================================================================

/// Extractor that resolves a Bearer API key to an opaque user identity.
///
/// Every data endpoint requires this; there is no anonymous access.
#[derive(Debug, Clone)]
pub struct RequireUser {
    pub user_id: Uuid,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for RequireUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::trim)
            .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))?;

        match state.db.api_keys.validate_key(token).await? {
            Some(key) => Ok(RequireUser {
                user_id: key.user_id,
            }),
            None => Err(ApiError::Unauthorized("Invalid API key".to_string())),
        }
    }
}

// =============================================================================
// ERROR HANDLING
// =============================================================================

#[derive(Debug)]
pub enum ApiError {
    Database(recall_core::Error),
    Unauthorized(String),
    NotFound(String),
    BadRequest(String),
}

impl From<recall_core::Error> for ApiError {
    fn from(err: recall_core::Error) -> Self {
        match &err {
            recall_core::Error::NotFound(msg) => ApiError::NotFound(msg.clone()),
            recall_core::Error::HighlightNotFound(id) => {
                ApiError::NotFound(format!("Highlight not found: {id}"))
            }
            recall_core::Error::SessionNotFound(id) => {
                ApiError::NotFound(format!("Review session not found: {id}"))
            }
            recall_core::Error::InvalidInput(msg) => ApiError::BadRequest(msg.clone()),
            recall_core::Error::Unauthorized(msg) => ApiError::Unauthorized(msg.clone()),
            _ => ApiError::Database(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::Database(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::review::{DueQuery, SubmitRatingRequest, DEFAULT_DUE_LIMIT};

    #[test]
    fn test_api_error_status_codes() {
        let cases = [
            (
                ApiError::Unauthorized("no".into()),
                StatusCode::UNAUTHORIZED,
            ),
            (ApiError::NotFound("gone".into()), StatusCode::NOT_FOUND),
            (ApiError::BadRequest("bad".into()), StatusCode::BAD_REQUEST),
            (
                ApiError::Database(recall_core::Error::Internal("boom".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_core_errors_map_to_api_errors() {
        let id = Uuid::new_v4();

        match ApiError::from(recall_core::Error::HighlightNotFound(id)) {
            ApiError::NotFound(msg) => assert!(msg.contains(&id.to_string())),
            other => panic!("expected NotFound, got {other:?}"),
        }

        match ApiError::from(recall_core::Error::InvalidInput(
            "quality must be between 0 and 5, got 9".into(),
        )) {
            ApiError::BadRequest(msg) => assert!(msg.contains("quality")),
            other => panic!("expected BadRequest, got {other:?}"),
        }

        match ApiError::from(recall_core::Error::Internal("boom".into())) {
            ApiError::Database(_) => {}
            other => panic!("expected Database, got {other:?}"),
        }
    }

    #[test]
    fn test_due_query_limit_defaults_to_twenty() {
        let query: DueQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.limit, DEFAULT_DUE_LIMIT);
        assert_eq!(DEFAULT_DUE_LIMIT, 20);
    }

    #[test]
    fn test_submit_request_accepts_partial_bodies() {
        // Missing fields deserialize fine and are rejected by the handler
        // with 400, not by the framework with 422.
        let req: SubmitRatingRequest = serde_json::from_str(r#"{"quality": 4}"#).unwrap();
        assert!(req.highlight_id.is_none());
        assert_eq!(req.quality, Some(4));
        assert!(req.session_id.is_none());
    }

    #[test]
    fn test_parse_allowed_origins_default() {
        std::env::remove_var("CORS_ALLOWED_ORIGINS");
        let origins = parse_allowed_origins();
        assert_eq!(origins, vec![HeaderValue::from_static("http://localhost:3000")]);
    }
}
