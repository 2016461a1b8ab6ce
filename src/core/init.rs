use super::config::ChatConfig;
use super::service::ChatService;
use super::types::{CompletionProvider, QuoteProvider};
use crate::llm::Gemini;
use crate::quotes::AlphaVantage;
use anyhow::Result;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

pub fn build_http_client(config: &ChatConfig) -> Result<Client> {
    let mut builder = Client::builder()
        .user_agent(&config.user_agent)
        .connect_timeout(Duration::from_secs(10));
    if let Some(timeout) = config.http_timeout {
        builder = builder.timeout(timeout);
    }
    Ok(builder.build()?)
}

pub fn initialize_gemini(config: &ChatConfig, client: Client) -> Option<Gemini> {
    let Some(api_key) = config.gemini_key.clone() else {
        log::warn!("GEMINI_API_KEY is not set; chat requests will fail until it is configured");
        return None;
    };

    log::info!("Using Gemini model {}", config.gemini_model);
    Some(Gemini::new(
        client,
        config.gemini_base_url.clone(),
        config.gemini_model.clone(),
        api_key,
    ))
}

pub fn initialize_alphavantage(config: &ChatConfig, client: Client) -> AlphaVantage {
    if config.alphavantage_key == crate::quotes::alphavantage::DEMO_API_KEY {
        log::info!("Using the Alpha Vantage demo key; most symbols will be rejected");
    }
    AlphaVantage::new(
        client,
        config.alphavantage_base_url.clone(),
        config.alphavantage_key.clone(),
    )
}

/// Wires the real providers behind one shared HTTP client.
pub fn build_service(config: &ChatConfig) -> Result<ChatService> {
    let client = build_http_client(config)?;

    let quotes: Arc<dyn QuoteProvider> = Arc::new(initialize_alphavantage(config, client.clone()));
    let llm = initialize_gemini(config, client)
        .map(|gemini| Arc::new(gemini) as Arc<dyn CompletionProvider>);

    Ok(ChatService::new(quotes, llm))
}
