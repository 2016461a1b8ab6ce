use crate::llm::gemini;
use crate::quotes::alphavantage;
use anyhow::{anyhow, Context, Result};
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;
use url::Url;

pub const DEFAULT_ADDR: &str = "127.0.0.1:3000";

#[derive(Clone)]
pub struct ChatConfig {
    /// Missing key is not a start-up error; chat requests answer 500 instead.
    pub gemini_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: Url,
    pub alphavantage_key: String,
    pub alphavantage_base_url: Url,
    pub addr: SocketAddr,
    pub http_timeout: Option<Duration>,
    pub user_agent: String,
}

impl ChatConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let gemini_key = var("GEMINI_API_KEY");

        let gemini_model =
            var("GEMINI_MODEL").unwrap_or_else(|| gemini::DEFAULT_MODEL.to_string());

        let gemini_base_url = parse_url(
            "GEMINI_BASE_URL",
            var("GEMINI_BASE_URL").as_deref().unwrap_or(gemini::DEFAULT_BASE_URL),
        )?;

        let alphavantage_key = var("ALPHAVANTAGE_API_KEY")
            .unwrap_or_else(|| alphavantage::DEMO_API_KEY.to_string());

        let alphavantage_base_url = parse_url(
            "ALPHAVANTAGE_BASE_URL",
            var("ALPHAVANTAGE_BASE_URL")
                .as_deref()
                .unwrap_or(alphavantage::DEFAULT_BASE_URL),
        )?;

        let addr = var("STOCKCHAT_ADDR")
            .as_deref()
            .unwrap_or(DEFAULT_ADDR)
            .parse::<SocketAddr>()
            .context("STOCKCHAT_ADDR must be a socket address such as 127.0.0.1:3000")?;

        let http_timeout = var("STOCKCHAT_HTTP_TIMEOUT_SECS")
            .map(|secs| {
                secs.trim()
                    .parse::<u64>()
                    .map(Duration::from_secs)
                    .map_err(|_| anyhow!("STOCKCHAT_HTTP_TIMEOUT_SECS must be a whole number of seconds"))
            })
            .transpose()?;

        let user_agent = var("USER_AGENT")
            .unwrap_or_else(|| format!("stockchat/{}", env!("CARGO_PKG_VERSION")));

        Ok(Self {
            gemini_key,
            gemini_model,
            gemini_base_url,
            alphavantage_key,
            alphavantage_base_url,
            addr,
            http_timeout,
            user_agent,
        })
    }
}

// Keys are redacted so the config can be logged.
impl fmt::Debug for ChatConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatConfig")
            .field("gemini_key", &self.gemini_key.as_ref().map(|_| "<redacted>"))
            .field("gemini_model", &self.gemini_model)
            .field("gemini_base_url", &self.gemini_base_url.as_str())
            .field("alphavantage_key", &"<redacted>")
            .field("alphavantage_base_url", &self.alphavantage_base_url.as_str())
            .field("addr", &self.addr)
            .field("http_timeout", &self.http_timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

fn parse_url(key: &str, value: &str) -> Result<Url> {
    // A trailing slash keeps Url::join from dropping the last path segment.
    let normalized = if value.ends_with('/') {
        value.to_string()
    } else {
        format!("{}/", value)
    };
    Url::parse(&normalized).with_context(|| format!("{} is not a valid URL: {}", key, value))
}
