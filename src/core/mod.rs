pub mod config;
pub mod init;
pub mod service;
pub mod types;

#[cfg(test)]
pub(crate) mod fake;
