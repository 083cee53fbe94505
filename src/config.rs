//! Configuration for the market-data feed and ingestion pipeline.
//!
//! This module provides the [`Config`] struct for choosing the symbol and
//! environment and for tuning the queue, shutdown and reconnection behaviour.

use std::time::Duration;

use url::Url;

use crate::error::Error;
use crate::feed::websocket::ReconnectConfig;
use crate::pipeline::{QueueCapacity, ShutdownPolicy};

/// API environment (production or sandbox)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    /// Production environment
    #[default]
    Production,
    /// Sandbox environment
    Sandbox,
}

impl Environment {
    /// Get the WebSocket base URL
    pub fn websocket_base_url(&self) -> &'static str {
        match self {
            Environment::Production => "wss://api.gemini.com",
            Environment::Sandbox => "wss://api.sandbox.gemini.com",
        }
    }
}

/// Configuration for one live order book
///
/// # Example
///
/// ```rust
/// use gemini_book::Config;
/// use gemini_book::config::Environment;
/// use gemini_book::pipeline::QueueCapacity;
///
/// let config = Config::new("ETHUSD")
///     .with_environment(Environment::Sandbox)
///     .with_queue_capacity(QueueCapacity::bounded(4096).unwrap())
///     .with_timeout(std::time::Duration::from_secs(30));
///
/// assert_eq!(config.symbol(), "ethusd");
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Market symbol, lower-cased (e.g. `btcusd`)
    symbol: String,

    /// API environment
    environment: Environment,

    /// WebSocket handshake timeout
    timeout: Duration,

    /// Ask the server for heartbeat messages
    heartbeat: bool,

    /// Ask the server for trade events
    trades: bool,

    /// Ingestion queue capacity
    queue_capacity: QueueCapacity,

    /// What the consumer does with queued events on shutdown
    shutdown_policy: ShutdownPolicy,

    /// Reconnection behaviour
    reconnect: ReconnectConfig,
}

impl Config {
    /// Create a new configuration for a symbol
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into().to_ascii_lowercase(),
            environment: Environment::default(),
            timeout: Duration::from_secs(10),
            heartbeat: true,
            trades: true,
            queue_capacity: QueueCapacity::default(),
            shutdown_policy: ShutdownPolicy::default(),
            reconnect: ReconnectConfig::default(),
        }
    }

    /// Set the API environment (production or sandbox)
    #[must_use]
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Set the WebSocket handshake timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enable or disable heartbeat messages
    #[must_use]
    pub fn with_heartbeat(mut self, heartbeat: bool) -> Self {
        self.heartbeat = heartbeat;
        self
    }

    /// Enable or disable trade events
    #[must_use]
    pub fn with_trades(mut self, trades: bool) -> Self {
        self.trades = trades;
        self
    }

    /// Set the ingestion queue capacity
    #[must_use]
    pub fn with_queue_capacity(mut self, capacity: QueueCapacity) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// Set the shutdown policy
    #[must_use]
    pub fn with_shutdown_policy(mut self, policy: ShutdownPolicy) -> Self {
        self.shutdown_policy = policy;
        self
    }

    /// Set the reconnection behaviour
    #[must_use]
    pub fn with_reconnect(mut self, reconnect: ReconnectConfig) -> Self {
        self.reconnect = reconnect;
        self
    }

    /// Get the symbol
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Get the environment
    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// Get the timeout duration
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Whether heartbeats are requested
    pub fn heartbeat(&self) -> bool {
        self.heartbeat
    }

    /// Whether trade events are requested
    pub fn trades(&self) -> bool {
        self.trades
    }

    /// Get the queue capacity
    pub fn queue_capacity(&self) -> QueueCapacity {
        self.queue_capacity
    }

    /// Get the shutdown policy
    pub fn shutdown_policy(&self) -> ShutdownPolicy {
        self.shutdown_policy
    }

    /// Get the reconnection behaviour
    pub fn reconnect(&self) -> &ReconnectConfig {
        &self.reconnect
    }

    /// Check the configuration
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the symbol is empty or not ASCII
    /// alphanumeric.
    pub fn validate(&self) -> Result<(), Error> {
        if self.symbol.is_empty() {
            return Err(Error::Config("symbol must not be empty".to_string()));
        }
        if !self.symbol.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(Error::Config(format!(
                "symbol must be ASCII alphanumeric, got {:?}",
                self.symbol
            )));
        }
        Ok(())
    }

    /// Build the market-data WebSocket URL for this symbol
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the configuration does not validate.
    pub fn market_data_url(&self) -> Result<Url, Error> {
        self.validate()?;

        let mut url = Url::parse(self.environment.websocket_base_url())?;
        url.set_path(&format!("/v1/marketdata/{}", self.symbol));
        url.query_pairs_mut()
            .append_pair("heartbeat", bool_param(self.heartbeat))
            .append_pair("trades", bool_param(self.trades))
            .append_pair("auctions", "false");
        Ok(url)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new("btcusd")
    }
}

fn bool_param(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.symbol(), "btcusd");
        assert_eq!(config.environment(), Environment::Production);
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert!(config.heartbeat());
        assert!(config.trades());
        assert_eq!(config.queue_capacity(), QueueCapacity::Unbounded);
        assert_eq!(config.shutdown_policy(), ShutdownPolicy::Drain);
    }

    #[test]
    fn test_market_data_url() {
        let url = Config::new("BTCUSD").market_data_url().unwrap();
        assert_eq!(
            url.as_str(),
            "wss://api.gemini.com/v1/marketdata/btcusd?heartbeat=true&trades=true&auctions=false"
        );
    }

    #[test]
    fn test_sandbox_url_without_trades() {
        let url = Config::new("ethusd")
            .with_environment(Environment::Sandbox)
            .with_trades(false)
            .market_data_url()
            .unwrap();
        assert!(url.as_str().starts_with("wss://api.sandbox.gemini.com/v1/marketdata/ethusd"));
        assert!(url.as_str().contains("trades=false"));
    }

    #[test]
    fn test_invalid_symbol_rejected() {
        assert!(matches!(Config::new("").validate(), Err(Error::Config(_))));
        assert!(matches!(
            Config::new("btc/usd").market_data_url(),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_builder_pattern() {
        let config = Config::new("btcusd")
            .with_timeout(Duration::from_secs(30))
            .with_heartbeat(false)
            .with_queue_capacity(QueueCapacity::bounded(8).unwrap())
            .with_shutdown_policy(ShutdownPolicy::Abandon)
            .with_reconnect(ReconnectConfig::new().max_retries(3));

        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert!(!config.heartbeat());
        assert_eq!(config.queue_capacity(), QueueCapacity::bounded(8).unwrap());
        assert_eq!(config.shutdown_policy(), ShutdownPolicy::Abandon);
        assert_eq!(config.reconnect().max_retries, 3);
    }
}
