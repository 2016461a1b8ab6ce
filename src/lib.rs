pub mod api;
pub mod core;
pub mod error;
pub mod llm;
pub mod prompt;
pub mod quotes;
pub mod repl;
pub mod tickers;
pub mod utils;

// Re-exports
pub use crate::core::init;
pub use crate::core::service::ChatService;
pub use crate::error::ServiceError;
