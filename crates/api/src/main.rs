use axum::{
    extract::State,
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scorer_core::domain::evaluation::{StockEvaluation, SurveyRequest};
use scorer_core::scorer::{ScorerError, StockScorer};

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:3000,http://localhost:3001";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = scorer_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    // Missing credentials stop the process here, before any request is served.
    let scorer = StockScorer::from_settings(&settings).inspect_err(|e| {
        sentry_anyhow::capture_anyhow(e);
        tracing::error!(error = %e, "scorer configuration failed");
    })?;

    let origins = std::env::var("CORS_ALLOWED_ORIGINS")
        .unwrap_or_else(|_| DEFAULT_CORS_ORIGINS.to_string());
    let app = router(AppState { scorer })
        .layer(cors_layer(&origins))
        .layer(TraceLayer::new_for_http());

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_PORT);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

#[derive(Clone)]
struct AppState {
    scorer: StockScorer,
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/healthz", get(healthz))
        .route("/evaluate", post(evaluate))
        .route("/suggest-basket", post(suggest_basket))
        .with_state(state)
}

fn cors_layer(origins: &str) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| match s.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = s, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

#[derive(Debug, Serialize)]
struct Welcome {
    message: &'static str,
}

async fn root() -> Json<Welcome> {
    Json(Welcome {
        message: "Welcome to the Islamic Stock Morality Scorer API",
    })
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Debug, Deserialize)]
struct StockNameRequest {
    company_name: String,
}

async fn evaluate(
    State(state): State<AppState>,
    Json(req): Json<StockNameRequest>,
) -> Result<Json<StockEvaluation>, ApiError> {
    let evaluation = state.scorer.evaluate_stock(&req.company_name).await?;
    Ok(Json(evaluation))
}

async fn suggest_basket(
    State(state): State<AppState>,
    Json(survey): Json<SurveyRequest>,
) -> Json<Vec<StockEvaluation>> {
    Json(state.scorer.suggest_basket(&survey).await)
}

/// Failure body shaped as `{"detail": "..."}`.
#[derive(Debug, Serialize)]
struct ApiError {
    detail: String,
}

impl From<ScorerError> for ApiError {
    fn from(err: ScorerError) -> Self {
        let detail = err.to_string();
        let err = anyhow::Error::new(err);
        sentry_anyhow::capture_anyhow(&err);
        tracing::error!(error = %err, "evaluation failed");
        Self { detail }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, Json(self)).into_response()
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &scorer_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use scorer_core::llm::{LlmClient, LlmError, Provider};
    use scorer_core::market::{MarketDataProvider, QuoteInfo};
    use serde_json::{json, Value};
    use std::sync::Arc;
    use tower::ServiceExt;

    fn evaluation_json(name: &str, symbol: &str) -> Value {
        let axis = json!({"score": 50, "notes": ["n"]});
        json!({
            "symbol": symbol,
            "name": name,
            "overall_score": 64,
            "scores": {
                "military": axis, "israel": axis, "environment": axis, "social": axis,
                "governance": axis, "sharia_compliance": axis, "ethical_business": axis,
            },
            "details": {
                "strengths": ["s"],
                "concerns": ["c"],
                "halal_status": "Permissible",
                "recommendation": "Buy",
            }
        })
    }

    /// Replies to any evaluation prompt naming `Apple` and to the basket prompt.
    struct CannedLlm;

    #[async_trait::async_trait]
    impl LlmClient for CannedLlm {
        fn provider(&self) -> Provider {
            Provider::OpenRouter
        }

        async fn complete_json(&self, prompt: &str) -> Result<Value, LlmError> {
            if prompt.contains("expert portfolio manager") {
                Ok(json!([
                    {"symbol": "AAPL", "name": "Apple", "reasoning": "r"},
                    {"symbol": "XYZ", "name": "Unknown Corp", "reasoning": "r"},
                ]))
            } else if prompt.contains("**Apple**") {
                Ok(evaluation_json("Apple Inc.", "AAPL"))
            } else {
                Err(LlmError::MissingContent)
            }
        }
    }

    struct NoMarket;

    #[async_trait::async_trait]
    impl MarketDataProvider for NoMarket {
        fn provider_name(&self) -> &'static str {
            "none"
        }

        async fn quote(&self, _symbol: &str) -> anyhow::Result<Option<QuoteInfo>> {
            Ok(None)
        }
    }

    fn app() -> Router {
        let scorer = StockScorer::new(Arc::new(CannedLlm), Arc::new(NoMarket));
        router(AppState { scorer })
    }

    async fn post_json(uri: &str, body: Value) -> (StatusCode, Value) {
        let req = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let res = app().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn evaluate_returns_record_with_market_error() {
        let (status, body) = post_json("/evaluate", json!({"company_name": "Apple"})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["symbol"], "AAPL");
        assert_eq!(body["type"], "Company");
        assert_eq!(body["market_data"], Value::Null);
        assert!(body["market_data_error"]
            .as_str()
            .unwrap()
            .contains("'AAPL'"));
    }

    #[tokio::test]
    async fn evaluate_failure_is_500_with_detail() {
        let (status, body) = post_json("/evaluate", json!({"company_name": "Nobody"})).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["detail"], "completion has no message content");
    }

    #[tokio::test]
    async fn suggest_basket_skips_failed_suggestions() {
        let (status, body) = post_json(
            "/suggest-basket",
            json!({
                "risk_tolerance": "low",
                "investment_horizon": "10",
                "ethical_priorities": [],
                "number_of_stocks": 3,
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let items = body.as_array().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["name"], "Apple Inc.");
    }

    #[tokio::test]
    async fn root_returns_welcome_message() {
        let req = Request::builder().uri("/").body(Body::empty()).unwrap();
        let res = app().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(
            body["message"],
            "Welcome to the Islamic Stock Morality Scorer API"
        );
    }

    async fn preflight(origin: &str) -> Response {
        let req = Request::builder()
            .method("OPTIONS")
            .uri("/evaluate")
            .header(header::ORIGIN, origin)
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PUT")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "x-custom-header")
            .body(Body::empty())
            .unwrap();
        app()
            .layer(cors_layer("http://localhost:3000, ,http://localhost:3001"))
            .oneshot(req)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn cors_preflight_allows_any_method_and_header_for_listed_origin() {
        let res = preflight("http://localhost:3001").await;
        let headers = res.headers();
        assert_eq!(
            headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "http://localhost:3001"
        );
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "*");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], "*");
    }

    #[tokio::test]
    async fn cors_preflight_ignores_unlisted_origin() {
        let res = preflight("http://evil.example").await;
        assert!(res
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }
}
