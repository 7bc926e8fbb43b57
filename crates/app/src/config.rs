//! Configuration
//!
//! Settings shared by every CLI command, read from flags with environment
//! fallbacks. A `.env` file is loaded first when present.

use std::path::PathBuf;

use clap::Args;

/// Log output format.
#[derive(Clone, Copy, Debug, Default, clap::ValueEnum)]
pub enum LogFormat {
    /// Compact, human-readable logs.
    #[default]
    Compact,

    /// Structured JSON logs.
    Json,
}

/// Logging settings.
#[derive(Debug, Clone, Args)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info", global = true)]
    pub log_level: String,

    /// Log format (compact, json)
    #[arg(
        long,
        env = "LOG_FORMAT",
        value_enum,
        default_value_t = LogFormat::Compact,
        global = true
    )]
    pub log_format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Compact,
        }
    }
}

/// Storage settings.
#[derive(Debug, Clone, Args)]
pub struct StorageConfig {
    /// `PostgreSQL` connection string; in-memory storage is used when unset
    #[arg(long, env = "DATABASE_URL", global = true)]
    pub database_url: Option<String>,

    /// YAML catalog fixture loaded into in-memory storage
    #[arg(long, env = "VOUCHER_SEED", global = true)]
    pub seed: Option<PathBuf>,

    /// ISO 4217 code of the store currency
    #[arg(long, env = "VOUCHER_CURRENCY", default_value = "VND", global = true)]
    pub currency: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            seed: None,
            currency: "VND".to_string(),
        }
    }
}

/// Load `.env` into the process environment if the file exists.
pub fn load_dotenv() {
    _ = dotenvy::dotenv();
}
