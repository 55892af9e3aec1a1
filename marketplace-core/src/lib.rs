pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod flows;
pub mod form;
pub mod gateway;
pub mod logging;
pub mod query;
pub mod session;
pub mod telemetry;

#[cfg(test)]
pub mod test_utils;

pub use client::MarketplaceClient;
pub use config::ClientConfig;
pub use error::ClientError;
pub use logging::{init_logging, LogLevel};
pub use session::{InitialRoute, Session, SessionStore};
