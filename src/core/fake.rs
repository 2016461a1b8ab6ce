use super::types::{CompletionProvider, Quote, QuoteProvider};
use crate::error::UpstreamError;
use crate::quotes::alphavantage::{fixtures, parse_global_quote};
use crate::tickers::Ticker;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Serves canned Alpha Vantage bodies through the real parser.
pub struct FixtureQuotes {
    bodies: HashMap<String, &'static str>,
    fail: bool,
    calls: AtomicUsize,
}

impl FixtureQuotes {
    pub fn standard() -> Self {
        let mut bodies = HashMap::new();
        bodies.insert("IBM".to_string(), fixtures::IBM);
        bodies.insert("AAPL".to_string(), fixtures::AAPL);
        Self {
            bodies,
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::standard()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuoteProvider for FixtureQuotes {
    async fn fetch_quote(&self, symbol: &Ticker) -> Result<Option<Quote>, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(UpstreamError::Notice("fixture offline".to_string()));
        }
        let body = self
            .bodies
            .get(symbol.as_str())
            .copied()
            .unwrap_or(fixtures::EMPTY);
        parse_global_quote(body)
    }
}

pub struct FakeLlm {
    reply: Result<String, String>,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

impl FakeLlm {
    pub fn replying(text: &str) -> Self {
        Self::with_reply(Ok(text.to_string()))
    }

    /// Every call fails as a malformed provider response.
    pub fn failing(detail: &str) -> Self {
        Self::with_reply(Err(detail.to_string()))
    }

    fn with_reply(reply: Result<String, String>) -> Self {
        Self {
            reply,
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionProvider for FakeLlm {
    async fn complete(&self, prompt: &str) -> Result<String, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().unwrap() = Some(prompt.to_string());
        self.reply
            .clone()
            .map_err(UpstreamError::Malformed)
    }
}
