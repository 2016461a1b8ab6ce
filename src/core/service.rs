use super::types::{ChatReply, CompletionProvider, ConversationTurn, Quote, QuoteProvider};
use crate::error::{ServiceError, Upstream, API_KEY_MISSING, MESSAGE_REQUIRED, SYMBOL_NOT_FOUND};
use crate::prompt::build_prompt;
use crate::tickers::Ticker;
use crate::utils::text::preview;
use chrono::Utc;
use std::sync::Arc;

/// Quote lookup and chat relay. Holds no per-conversation state; every call
/// stands alone.
#[derive(Clone)]
pub struct ChatService {
    quotes: Arc<dyn QuoteProvider>,
    llm: Option<Arc<dyn CompletionProvider>>,
}

impl ChatService {
    /// `llm` is `None` when no credential is configured.
    pub fn new(quotes: Arc<dyn QuoteProvider>, llm: Option<Arc<dyn CompletionProvider>>) -> Self {
        Self { quotes, llm }
    }

    pub fn has_llm(&self) -> bool {
        self.llm.is_some()
    }

    pub async fn fetch_quote(&self, symbol: &Ticker) -> Result<Quote, ServiceError> {
        match self.quotes.fetch_quote(symbol).await {
            Ok(Some(quote)) => Ok(quote),
            Ok(None) => {
                log::info!("No quote found for {}", symbol);
                Err(ServiceError::NotFound(SYMBOL_NOT_FOUND.to_string()))
            }
            Err(source) => Err(ServiceError::upstream(Upstream::MarketData, source)),
        }
    }

    /// Validate, assemble the prompt, call the model, stamp the reply.
    pub async fn relay(
        &self,
        message: &str,
        quote: Option<&Quote>,
        history: &[ConversationTurn],
    ) -> Result<ChatReply, ServiceError> {
        if message.is_empty() {
            return Err(ServiceError::InvalidRequest(MESSAGE_REQUIRED.to_string()));
        }

        let llm = self
            .llm
            .as_ref()
            .ok_or_else(|| ServiceError::MisconfiguredService(API_KEY_MISSING.to_string()))?;

        log::debug!(
            "Relaying message with {} history turns, quote: {}",
            history.len(),
            quote.map(|q| q.symbol.as_str()).unwrap_or("none")
        );
        let prompt = build_prompt(message, quote, history);

        let text = llm
            .complete(&prompt)
            .await
            .map_err(|source| ServiceError::upstream(Upstream::Llm, source))?;
        log::info!("Generated response: {}", preview(&text, 100));

        Ok(ChatReply {
            text,
            generated_at: Utc::now(),
        })
    }
}
