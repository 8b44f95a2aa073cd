//! Voucher API configuration module.
//!
//! Configuration is layered with the `config` crate:
//!
//! ```text
//! built-in defaults ─► greenpay.toml (optional) ─► GREENPAY_* env vars
//!                                                       (highest priority)
//! ```
//!
//! | Key                     | Env var                          | Default       |
//! |-------------------------|----------------------------------|---------------|
//! | `grpc_port`             | `GREENPAY_GRPC_PORT`             | `50051`       |
//! | `database_path`         | `GREENPAY_DATABASE_PATH`         | `greenpay.db` |
//! | `db_max_connections`    | `GREENPAY_DB_MAX_CONNECTIONS`    | `5`           |
//! | `issue_max_attempts`    | `GREENPAY_ISSUE_MAX_ATTEMPTS`    | `3`           |
//! | `default_validity_days` | `GREENPAY_DEFAULT_VALIDITY_DAYS` | `365`         |
//! | `gst_rate_bps`          | `GREENPAY_GST_RATE_BPS`          | `1000` (10%)  |

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};

use greenpay_core::types::GstRate;
use greenpay_core::validation::validate_gst_rate_bps;
use greenpay_core::{DEFAULT_GST_BPS, DEFAULT_VALIDITY_DAYS, MAX_VALIDITY_DAYS};
use greenpay_db::{DbConfig, DEFAULT_MAX_ATTEMPTS};

/// Optional config file, looked up as `greenpay.toml` in the working directory.
pub const CONFIG_FILE_STEM: &str = "greenpay";

/// Prefix of the environment variables that override the file.
pub const ENV_PREFIX: &str = "GREENPAY";

/// Upper bound on issuance attempts. Collisions are rare enough that more
/// attempts only hide a broken generator.
const MAX_ISSUE_ATTEMPTS: u32 = 10;

/// Voucher API configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// gRPC server port
    pub grpc_port: u16,

    /// SQLite database file
    pub database_path: String,

    /// Pool size
    pub db_max_connections: u32,

    /// Insert attempts per issuance request before `RetryExhausted`
    pub issue_max_attempts: u32,

    /// Validity used when a request has no `valid_until`
    pub default_validity_days: i64,

    /// GST rate in basis points (1000 = 10%)
    pub gst_rate_bps: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            grpc_port: 50051,
            database_path: "greenpay.db".to_string(),
            db_max_connections: 5,
            issue_max_attempts: DEFAULT_MAX_ATTEMPTS,
            default_validity_days: DEFAULT_VALIDITY_DAYS,
            gst_rate_bps: DEFAULT_GST_BPS,
        }
    }
}

impl ApiConfig {
    /// Load configuration from `greenpay.toml` (if present) and `GREENPAY_*`
    /// environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        let builder = Self::defaults()?
            .add_source(File::with_name(CONFIG_FILE_STEM).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true));

        Self::from_builder(builder)
    }

    /// Builder pre-filled with the defaults; callers add their own sources.
    pub fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        let d = ApiConfig::default();

        Ok(Config::builder()
            .set_default("grpc_port", i64::from(d.grpc_port))?
            .set_default("database_path", d.database_path)?
            .set_default("db_max_connections", i64::from(d.db_max_connections))?
            .set_default("issue_max_attempts", i64::from(d.issue_max_attempts))?
            .set_default("default_validity_days", d.default_validity_days)?
            .set_default("gst_rate_bps", i64::from(d.gst_rate_bps))?)
    }

    /// Builds, deserializes and validates.
    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let config: ApiConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the server cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.grpc_port == 0 {
            return Err(ConfigError::invalid("grpc_port", "must not be 0"));
        }

        if self.database_path.trim().is_empty() {
            return Err(ConfigError::invalid("database_path", "must not be empty"));
        }

        if self.db_max_connections == 0 {
            return Err(ConfigError::invalid("db_max_connections", "must be at least 1"));
        }

        if !(1..=MAX_ISSUE_ATTEMPTS).contains(&self.issue_max_attempts) {
            return Err(ConfigError::invalid(
                "issue_max_attempts",
                format!("must be between 1 and {MAX_ISSUE_ATTEMPTS}"),
            ));
        }

        if !(1..=MAX_VALIDITY_DAYS).contains(&self.default_validity_days) {
            return Err(ConfigError::invalid(
                "default_validity_days",
                format!("must be between 1 and {MAX_VALIDITY_DAYS}"),
            ));
        }

        validate_gst_rate_bps(self.gst_rate_bps)
            .map_err(|e| ConfigError::invalid("gst_rate_bps", e.to_string()))?;

        Ok(())
    }

    /// Pool configuration for [`greenpay_db::Database::new`].
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path).max_connections(self.db_max_connections)
    }

    pub fn gst_rate(&self) -> GstRate {
        GstRate::from_bps(self.gst_rate_bps)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
}

impl ConfigError {
    fn invalid(key: &str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    fn from_toml(toml: &str) -> Result<ApiConfig, ConfigError> {
        let builder = ApiConfig::defaults()
            .unwrap()
            .add_source(File::from_str(toml, FileFormat::Toml));
        ApiConfig::from_builder(builder)
    }

    #[test]
    fn test_defaults() {
        let config = from_toml("").unwrap();
        assert_eq!(config, ApiConfig::default());
        assert_eq!(config.grpc_port, 50051);
        assert_eq!(config.issue_max_attempts, 3);
        assert_eq!(config.gst_rate().bps(), 1000);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let config = from_toml(
            r#"
            grpc_port = 6000
            database_path = "/var/lib/greenpay/vouchers.db"
            issue_max_attempts = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.grpc_port, 6000);
        assert_eq!(config.database_path, "/var/lib/greenpay/vouchers.db");
        assert_eq!(config.issue_max_attempts, 5);
        assert_eq!(config.default_validity_days, 365);
        assert_eq!(config.db_config().max_connections, 5);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(matches!(
            from_toml("issue_max_attempts = 0"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(from_toml("issue_max_attempts = 11").is_err());
        assert!(from_toml("gst_rate_bps = 10001").is_err());
        assert!(from_toml("default_validity_days = 0").is_err());
        assert!(from_toml("default_validity_days = 3650").is_ok());
        assert!(matches!(
            from_toml("default_validity_days = 9223372036854775807"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(from_toml("db_max_connections = 0").is_err());
        assert!(from_toml("database_path = \"  \"").is_err());
    }

    #[test]
    fn test_wrong_type_is_a_load_error() {
        assert!(matches!(
            from_toml("grpc_port = \"not a port\""),
            Err(ConfigError::Load(_))
        ));
    }
}
