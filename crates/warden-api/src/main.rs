mod handlers;
mod rate_limit;
mod types;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{ConnectInfo, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use warden_db::{StateStore, StoreConfig, StoreReader};
use warden_llm::{DiagnosticEngine, HttpChatTransport};

use handlers::*;
use rate_limit::RateLimiter;
use types::{ApiState, ErrorBody};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,warden_api=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let store_uri =
        std::env::var("STATE_STORE_URI").context("missing mandatory environment variable STATE_STORE_URI")?;
    let llm_api_key =
        std::env::var("LLM_API_KEY").context("missing mandatory environment variable LLM_API_KEY")?;
    let llm_api_url = std::env::var("LLM_API_URL")
        .unwrap_or_else(|_| "https://api.openai.com/v1/chat/completions".to_string());
    let llm_model = std::env::var("LLM_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());

    info!("Connecting to state store at {store_uri}");
    let config = StoreConfig::new(&store_uri);
    let reader = Arc::new(StoreReader::from_config(&config).await?);

    // the engine writes only the response cache; the API itself has no
    // write path into the store
    let cache_store = Arc::new(StateStore::open(config).await?);
    let transport = Arc::new(HttpChatTransport::new(&llm_api_url, &llm_api_key)?);
    let engine = Arc::new(DiagnosticEngine::new(transport, cache_store, &llm_model));

    let state = ApiState {
        reader,
        engine,
        limiter: Arc::new(RateLimiter::new()),
    };

    let app = Router::new()
        .route("/api/v1/health", get(health_check))
        .route("/api/v1/agents", get(list_agents))
        .route("/api/v1/agents/{id}", get(get_agent))
        .route("/api/v1/agents/{id}/history", get(get_history))
        .route("/api/v1/agents/{id}/report", get(get_report))
        .layer(middleware::from_fn_with_state(state.clone(), throttle))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "3001".to_string())
        .parse()
        .unwrap_or(3001);
    let addr = format!("0.0.0.0:{port}");
    info!("Trust API listening on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

async fn throttle(
    State(state): State<ApiState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: axum::extract::Request,
    next: Next,
) -> Response {
    if !state.limiter.allow(addr.ip()) {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(ErrorBody::new("rate limit exceeded")),
        )
            .into_response();
    }
    next.run(request).await
}
