//! Application configuration management.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Approval workflow behaviour.
    #[serde(default)]
    pub workflow: WorkflowConfig,
    /// Exchange rates used to normalize amounts for policy banding.
    #[serde(default)]
    pub rates: RatesConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Approval workflow configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct WorkflowConfig {
    /// When a rejected request is sent back for approval, drop every decision
    /// of the closed cycle (`true`) or keep the approvals and clear only the
    /// rejections (`false`).
    #[serde(default = "default_discard_approvals")]
    pub discard_approvals_on_reapprove: bool,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            discard_approvals_on_reapprove: default_discard_approvals(),
        }
    }
}

fn default_discard_approvals() -> bool {
    true
}

/// Fixed exchange-rate table.
///
/// Rates are "1 unit of the keyed currency = rate units of `base_currency`".
/// This is a mocked table, not a market feed.
#[derive(Debug, Clone, Deserialize)]
pub struct RatesConfig {
    /// Currency that policy bands are denominated in.
    #[serde(default = "default_base_currency")]
    pub base_currency: String,
    /// Rates keyed by currency code.
    #[serde(default = "default_rate_table")]
    pub table: BTreeMap<String, Decimal>,
}

impl Default for RatesConfig {
    fn default() -> Self {
        Self {
            base_currency: default_base_currency(),
            table: default_rate_table(),
        }
    }
}

fn default_base_currency() -> String {
    "KRW".to_string()
}

fn default_rate_table() -> BTreeMap<String, Decimal> {
    [
        ("KRW", Decimal::ONE),
        ("USD", Decimal::new(1_350, 0)),
        ("BTC", Decimal::new(85_000_000, 0)),
        ("ETH", Decimal::new(4_500_000, 0)),
        ("USDC", Decimal::new(1_350, 0)),
        ("USDT", Decimal::new(1_350, 0)),
    ]
    .into_iter()
    .map(|(code, rate)| (code.to_string(), rate))
    .collect()
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("CUSTODY").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
