use crate::error::ServiceError;
use once_cell::sync::Lazy;
use regex::Regex;

// Same best-effort heuristic the browser client used: first run of one to
// five capital letters standing alone as a word.
static SYMBOL_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[A-Z]{1,5}\b").unwrap());

/// Upper-cased ticker symbol, validated to a single token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ticker(String);

impl Ticker {
    pub fn new(ticker: &str) -> Result<Self, ServiceError> {
        let uppercase_ticker = ticker.trim().to_uppercase();
        if uppercase_ticker.is_empty() {
            return Err(ServiceError::InvalidRequest(
                crate::error::SYMBOL_REQUIRED.to_string(),
            ));
        }
        if !uppercase_ticker
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.')
        {
            return Err(ServiceError::InvalidRequest(format!(
                "Stock symbol must contain only letters, digits, '.' or '-': {}",
                ticker
            )));
        }
        Ok(Ticker(uppercase_ticker))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Ticker {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Ticker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Returns the first thing in `message` that looks like a ticker, if any.
/// Only the first match is considered; plain capitalised words ("I", "CEO")
/// are accepted false positives.
pub fn detect_symbol(message: &str) -> Option<Ticker> {
    SYMBOL_PATTERN
        .find(message)
        .and_then(|m| Ticker::new(m.as_str()).ok())
}
