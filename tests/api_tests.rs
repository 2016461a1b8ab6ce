use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use stockchat::{
    api,
    core::types::{CompletionProvider, Quote, QuoteProvider},
    error::UpstreamError,
    quotes::alphavantage::parse_global_quote,
    tickers::Ticker,
    ChatService,
};
use tower::ServiceExt;

const IBM_BODY: &str = r#"{"Global Quote": {
    "01. symbol": "IBM", "02. open": "167.5000", "03. high": "168.8800",
    "04. low": "166.2100", "05. price": "168.2000", "06. volume": "3865011",
    "07. latest trading day": "2024-05-01", "08. previous close": "166.2000",
    "09. change": "2.0000", "10. change percent": "1.2034%"
}}"#;

const DEMO_NOTICE_BODY: &str =
    r#"{"Information": "The **demo** API key is for demo purposes only. Please claim your free API key."}"#;

struct Fixture {
    bodies: HashMap<&'static str, &'static str>,
}

#[async_trait]
impl QuoteProvider for Fixture {
    async fn fetch_quote(&self, symbol: &Ticker) -> Result<Option<Quote>, UpstreamError> {
        match self.bodies.get(symbol.as_str()) {
            Some(body) => parse_global_quote(body),
            None => parse_global_quote(r#"{"Global Quote": {}}"#),
        }
    }
}

struct Offline;

#[async_trait]
impl QuoteProvider for Offline {
    async fn fetch_quote(&self, _symbol: &Ticker) -> Result<Option<Quote>, UpstreamError> {
        Err(UpstreamError::Notice("rate limited".to_string()))
    }
}

struct MockLlm {
    reply: &'static str,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl MockLlm {
    fn new(reply: &'static str) -> Arc<Self> {
        Arc::new(Self {
            reply,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl CompletionProvider for MockLlm {
    async fn complete(&self, prompt: &str) -> Result<String, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.reply.to_string())
    }
}

fn fixture() -> Arc<Fixture> {
    Arc::new(Fixture {
        bodies: HashMap::from([("IBM", IBM_BODY), ("AAPL", DEMO_NOTICE_BODY)]),
    })
}

fn app(llm: Option<Arc<MockLlm>>) -> Router {
    let llm = llm.map(|l| l as Arc<dyn CompletionProvider>);
    api::router(ChatService::new(fixture(), llm))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn quote_is_normalized() {
    let (status, body) = send(app(None), get("/quote?symbol=ibm")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["symbol"], "IBM");
    assert_eq!(body["price"], 168.2);
    assert_eq!(body["volume"], 3865011);
    assert_eq!(body["latestTradingDay"], "2024-05-01");
    assert_eq!(body["previousClose"], 166.2);
    assert_eq!(body["changePercent"], "1.2034%");
}

#[tokio::test]
async fn unknown_quote_is_404() {
    let (status, body) = send(app(None), get("/quote?symbol=ZZZZ")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Stock symbol not found"}));
}

#[tokio::test]
async fn demo_key_notice_is_404() {
    let (status, body) = send(app(None), get("/quote?symbol=AAPL")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Stock symbol not found"}));
}

#[tokio::test]
async fn missing_symbol_is_400() {
    for uri in ["/quote", "/quote?symbol=", "/api/stock?symbol=%20"] {
        let (status, body) = send(app(None), get(uri)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["error"], "Stock symbol is required");
    }
}

#[tokio::test]
async fn provider_failure_is_500() {
    let app = api::router(ChatService::new(Arc::new(Offline), None));
    let (status, body) = send(app, get("/quote?symbol=IBM")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "Failed to fetch stock data"}));
}

#[tokio::test]
async fn chat_without_credential() {
    let (status, body) = send(app(None), post_json("/chat", json!({"message": "Analyze AAPL"}))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"error": "API key not configured"}));
}

#[tokio::test]
async fn chat_with_mocked_model() {
    let llm = MockLlm::new("Buy high, sell low.");
    let (status, body) = send(
        app(Some(llm.clone())),
        post_json("/chat", json!({"message": "Analyze AAPL"})),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Buy high, sell low.");
    let timestamp = body["timestamp"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
    assert!(timestamp.ends_with('Z'));
    assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn empty_message_makes_no_model_call() {
    let llm = MockLlm::new("unused");
    for body in [json!({}), json!({"message": ""})] {
        let (status, response) = send(app(Some(llm.clone())), post_json("/chat", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(response, json!({"error": "Message is required"}));
    }
    assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn whitespace_message_is_relayed() {
    let llm = MockLlm::new("Could you rephrase that?");
    let (status, body) = send(
        app(Some(llm.clone())),
        post_json("/chat", json!({"message": "   "})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Could you rephrase that?");
    assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn original_client_payload_is_accepted() {
    let llm = MockLlm::new("IBM is steady.");
    let (_, quote) = send(app(None), get("/api/stock?symbol=IBM")).await;

    let (status, body) = send(
        app(Some(llm.clone())),
        post_json(
            "/api/chat",
            json!({
                "message": "Analyze IBM",
                "stockData": quote,
                "conversationHistory": [
                    {"role": "user", "parts": [{"text": "hi"}]},
                    {"role": "model", "parts": [{"text": "Hello there."}]}
                ]
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "IBM is steady.");

    let prompts = llm.prompts.lock().unwrap();
    let prompt = &prompts[0];
    let data = prompt.find("Current Stock Data: {\"symbol\":\"IBM\"").unwrap();
    let history = prompt.find("User: hi\n\nAI: Hello there.").unwrap();
    let question = prompt.find("Current question: Analyze IBM").unwrap();
    assert!(data < history && history < question);
}

#[tokio::test]
async fn malformed_body_is_400() {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/chat")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(app(Some(MockLlm::new("unused"))), request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn health() {
    let response = app(None).oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
