pub mod alphavantage;

pub use alphavantage::AlphaVantage;
