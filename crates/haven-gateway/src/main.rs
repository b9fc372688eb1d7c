//! Haven Gateway: HTTP front for the companion engine.
//! POST /chat runs one turn; /memory and /emotions expose per-user state.

use axum::{
    body::Body,
    extract::{Query, State},
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
    routing::{get, post},
    Json, Router,
};
use haven_core::{
    scope_or_default, ChatReply, ChatRequest, CompanionEngine, CompanionStore, EchoModel, HavenConfig,
    HavenError, InMemoryStore, LanguageModel, OpenRouterModel, SledStore, StorageKind,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

struct AppState {
    engine: CompanionEngine,
}

type ApiError = (StatusCode, Json<serde_json::Value>);

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScopeQuery {
    #[serde(default)]
    user_id: Option<String>,
}

impl ScopeQuery {
    fn scope(&self) -> &str {
        scope_or_default(self.user_id.as_deref())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = HavenConfig::load()?;

    let sled_store = match config.storage {
        StorageKind::Sled => {
            tracing::info!("[HAVEN] sled store at {}", config.data_path.display());
            Some(Arc::new(SledStore::open(Some(&config.data_path))?))
        }
        StorageKind::Memory => {
            tracing::info!("[HAVEN] in-memory store; state is lost on restart");
            None
        }
    };
    let store: Arc<dyn CompanionStore> = match &sled_store {
        Some(sled) => sled.clone(),
        None => Arc::new(InMemoryStore::new()),
    };

    let model: Arc<dyn LanguageModel> = match config
        .openrouter_api_key
        .as_deref()
        .and_then(|key| OpenRouterModel::new(key, config.llm_timeout()))
    {
        Some(m) => {
            let m = m.with_model(&config.model);
            tracing::info!("[HAVEN] OpenRouter model {}", m.model());
            Arc::new(m)
        }
        None => {
            tracing::warn!("[HAVEN] no OpenRouter key configured; replies will echo the user");
            Arc::new(EchoModel)
        }
    };

    let bind_addr = config.bind_addr.clone();
    let state = Arc::new(AppState {
        engine: CompanionEngine::new(store, model, config),
    });

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("[HAVEN] gateway listening on {}", bind_addr);
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(sled) = sled_store {
        let flushed = sled.flush_async().await?;
        tracing::info!("[HAVEN] sled flushed {} bytes on shutdown", flushed);
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("[HAVEN] failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("[HAVEN] shutting down");
}

fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/chat", post(chat_handler))
        .route("/memory", get(memory_handler))
        .route("/emotions", get(emotions_handler))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(axum::middleware::from_fn(log_request))
}

async fn log_request(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let response = next.run(request).await;
    tracing::info!("[HAVEN] {} {} -> {}", method, path, response.status());
    response
}

async fn health() -> &'static str {
    "OK"
}

fn internal_error(e: HavenError) -> ApiError {
    tracing::error!(error = %e, "[HAVEN] request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "error": e.to_string() })),
    )
}

/// POST /chat: one full turn.
async fn chat_handler(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ChatReply>, ApiError> {
    state.engine.handle_turn(body).await.map(Json).map_err(internal_error)
}

/// GET /memory?userId=
async fn memory_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ScopeQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let memories = state.engine.memories(query.scope()).map_err(internal_error)?;
    Ok(Json(serde_json::json!({
        "memoryCount": memories.len(),
        "memories": memories,
    })))
}

/// GET /emotions?userId=
async fn emotions_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ScopeQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let (entries, trend) = state.engine.emotion_history(query.scope()).map_err(internal_error)?;
    Ok(Json(serde_json::json!({
        "emotionTrend": trend,
        "entries": entries,
    })))
}
