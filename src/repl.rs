use crate::core::{
    service::ChatService,
    types::{ConversationTurn, Quote},
};
use crate::tickers::detect_symbol;
use crate::utils::text::group_thousands;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::FileHistory;
use rustyline::validate::Validator;
use rustyline::{CompletionType, Config as RustylineConfig, Context, EditMode, Editor, Helper, Result};
use std::env;

pub const GREETING: &str = "Hello! I'm your AI Stock Analyst. I can help you analyze stocks, provide market insights, and answer investment questions. Try asking me about a specific stock symbol like 'AAPL' or 'What do you think about Tesla?'";

/// Shown in place of any failure detail.
pub const APOLOGY: &str =
    "I'm sorry, I encountered an error while processing your request. Please try again.";

pub const COMMANDS: &[&str] = &["/clear", "/help", "/quit", "/quote"];

static HISTORY_PATH: Lazy<String> = Lazy::new(|| match env::var("HOME") {
    Ok(home_dir) => format!("{}/.stockchat.history", home_dir),
    Err(_) => ".stockchat.history".to_string(),
});

#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub text: String,
    pub is_user: bool,
    pub timestamp: DateTime<Utc>,
    /// Quote the reply was generated with, if any.
    pub quote: Option<Quote>,
}

impl ChatMessage {
    fn user(text: &str) -> Self {
        Self {
            text: text.to_string(),
            is_user: true,
            timestamp: Utc::now(),
            quote: None,
        }
    }

    fn assistant(text: impl Into<String>, timestamp: DateTime<Utc>, quote: Option<Quote>) -> Self {
        Self {
            text: text.into(),
            is_user: false,
            timestamp,
            quote,
        }
    }

    /// Banner for the quote this reply was generated with.
    pub fn quote_line(&self) -> Option<String> {
        self.quote.as_ref().map(quote_banner)
    }
}

/// Client-side conversation: the transcript (greeting first), and the most
/// recently loaded quote. The server keeps nothing between requests, so the
/// whole history is sent along with every message.
pub struct ChatSession {
    service: ChatService,
    messages: Vec<ChatMessage>,
    current_quote: Option<Quote>,
}

impl ChatSession {
    pub fn new(service: ChatService) -> Self {
        Self {
            service,
            messages: vec![ChatMessage::assistant(GREETING, Utc::now(), None)],
            current_quote: None,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn current_quote(&self) -> Option<&Quote> {
        self.current_quote.as_ref()
    }

    pub fn clear(&mut self) {
        self.messages.truncate(1);
        self.current_quote = None;
    }

    /// Prior turns as sent to the relay. The greeting is not part of it.
    pub fn history(&self) -> Vec<ConversationTurn> {
        self.messages
            .iter()
            .skip(1)
            .map(|m| {
                if m.is_user {
                    ConversationTurn::user(m.text.clone())
                } else {
                    ConversationTurn::assistant(m.text.clone())
                }
            })
            .collect()
    }

    /// Sends one message and appends the reply, or [`APOLOGY`] on failure.
    /// Blank input is ignored and returns `None`.
    pub async fn send(&mut self, input: &str) -> Option<&ChatMessage> {
        let text = input.trim();
        if text.is_empty() {
            return None;
        }

        let history = self.history();
        self.messages.push(ChatMessage::user(text));

        let quote = match detect_symbol(text) {
            Some(ticker) => {
                log::debug!("Detected stock symbol: {}", ticker);
                match self.service.fetch_quote(&ticker).await {
                    Ok(quote) => Some(quote),
                    Err(e) => {
                        log::debug!("No quote for {}: {}", ticker, e);
                        None
                    }
                }
            }
            None => None,
        };
        if let Some(quote) = &quote {
            self.current_quote = Some(quote.clone());
        }

        let reply = match self.service.relay(text, quote.as_ref(), &history).await {
            Ok(reply) => ChatMessage::assistant(reply.text, reply.generated_at, quote),
            Err(e) => {
                log::error!("Chat request failed: {:?}", e);
                ChatMessage::assistant(APOLOGY, Utc::now(), None)
            }
        };
        self.messages.push(reply);
        self.messages.last()
    }
}

/// One-line summary, e.g. `IBM $168.20 +2.00 (1.2034%) Vol: 3,865,011`.
pub fn quote_banner(quote: &Quote) -> String {
    let sign = if quote.change >= 0.0 { "+" } else { "" };
    format!(
        "{} ${:.2} {}{:.2} ({}) Vol: {}",
        quote.symbol,
        quote.price,
        sign,
        quote.change,
        quote.change_percent,
        group_thousands(quote.volume)
    )
}

pub fn command_candidates(prefix: &str) -> Vec<&'static str> {
    COMMANDS
        .iter()
        .copied()
        .filter(|cmd| cmd.starts_with(prefix))
        .collect()
}

pub struct ReplHelper;

impl Completer for ReplHelper {
    type Candidate = Pair;

    fn complete(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Result<(usize, Vec<Pair>)> {
        let prefix = &line[..pos];
        if !prefix.starts_with('/') || prefix.contains(char::is_whitespace) {
            return Ok((pos, vec![]));
        }

        let candidates = command_candidates(prefix)
            .into_iter()
            .map(|cmd| Pair {
                display: cmd.to_string(),
                replacement: cmd.to_string(),
            })
            .collect();
        Ok((0, candidates))
    }
}

impl Hinter for ReplHelper {
    type Hint = String;
}

impl Highlighter for ReplHelper {}

impl Validator for ReplHelper {}

impl Helper for ReplHelper {}

pub fn create_editor() -> Result<Editor<ReplHelper, FileHistory>> {
    log::debug!("Creating rustyline editor configuration");
    let rustyline_config = RustylineConfig::builder()
        .completion_type(CompletionType::List)
        .edit_mode(EditMode::Emacs)
        .build();

    let mut rl = Editor::<ReplHelper, FileHistory>::with_config(rustyline_config)?;
    if rl.load_history(HISTORY_PATH.as_str()).is_err() {
        log::debug!("No previous history file found");
    }
    rl.set_helper(Some(ReplHelper));
    Ok(rl)
}

pub fn save_history(rl: &mut Editor<ReplHelper, FileHistory>) -> Result<()> {
    rl.save_history(HISTORY_PATH.as_str())
}
