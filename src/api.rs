use crate::core::{
    service::ChatService,
    types::{ConversationTurn, Quote, Role},
};
use crate::error::{ServiceError, SYMBOL_REQUIRED};
use crate::tickers::Ticker;
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

#[derive(Debug, Deserialize)]
pub struct QuoteParams {
    pub symbol: Option<String>,
}

/// Body of `POST /chat`. The browser client's original key names
/// (`stockData`, `conversationHistory`) are accepted too.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, alias = "stockData")]
    pub quote: Option<Quote>,
    #[serde(default, alias = "conversationHistory")]
    pub history: Option<Vec<HistoryEntry>>,
}

/// One prior turn in the `{role, parts: [{text}]}` shape.
#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    #[serde(default)]
    pub parts: Vec<HistoryPart>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryPart {
    #[serde(default)]
    pub text: Option<String>,
}

impl From<HistoryEntry> for ConversationTurn {
    // A turn without text is kept as an empty line rather than rejected.
    fn from(entry: HistoryEntry) -> Self {
        let text = entry
            .parts
            .into_iter()
            .next()
            .and_then(|part| part.text)
            .unwrap_or_default();
        ConversationTurn {
            role: entry.role,
            text,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub message: String,
    pub timestamp: String,
}

#[derive(Clone)]
pub struct AppState {
    service: Arc<ChatService>,
}

impl AppState {
    pub fn new(service: ChatService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn quote(
    State(state): State<AppState>,
    Query(params): Query<QuoteParams>,
) -> Result<Json<Quote>, ServiceError> {
    let symbol = params
        .symbol
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ServiceError::InvalidRequest(SYMBOL_REQUIRED.to_string()))?;
    let ticker = Ticker::new(&symbol)?;

    log::info!("Quote requested for {}", ticker);
    let quote = state.service.fetch_quote(&ticker).await?;
    Ok(Json(quote))
}

async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ServiceError> {
    let Json(request) = payload.map_err(|e| ServiceError::InvalidRequest(e.body_text()))?;

    let message = request.message.unwrap_or_default();
    let history: Vec<ConversationTurn> = request
        .history
        .unwrap_or_default()
        .into_iter()
        .map(ConversationTurn::from)
        .collect();
    log::info!(
        "Chat requested ({} chars, {} history turns)",
        message.len(),
        history.len()
    );

    let reply = state
        .service
        .relay(&message, request.quote.as_ref(), &history)
        .await?;

    Ok(Json(ChatResponse {
        timestamp: reply.timestamp(),
        message: reply.text,
    }))
}

/// `/api/stock` and `/api/chat` are the paths the original browser client
/// calls; they share handlers with `/quote` and `/chat`.
pub fn router(service: ChatService) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/quote", get(quote))
        .route("/api/stock", get(quote))
        .route("/chat", post(chat))
        .route("/api/chat", post(chat))
        .layer(CorsLayer::permissive())
        .with_state(AppState::new(service))
}
