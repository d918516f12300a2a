//! Application configuration management.

use serde::Deserialize;

use crate::types::ProfitLossMode;

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "STOCKBOOK";

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Ledger behaviour.
    #[serde(default)]
    pub ledger: LedgerConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Ledger configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// How sales profit/loss is derived across matched cost layers.
    #[serde(default)]
    pub profit_loss_mode: ProfitLossMode,
    /// Number of invoices returned by the recent approved invoices query.
    #[serde(default = "default_recent_approved_limit")]
    pub recent_approved_limit: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            profit_loss_mode: ProfitLossMode::default(),
            recent_approved_limit: default_recent_approved_limit(),
        }
    }
}

fn default_recent_approved_limit() -> usize {
    3
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default `tracing` filter directive, used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Emit JSON formatted log lines.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

fn default_log_filter() -> String {
    "stockbook=info,seeder=info".to_string()
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
            .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
