//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Marketplace rules.
    #[serde(default)]
    pub market: MarketConfig,
    /// Logging configuration.
    #[serde(default)]
    pub log: LogConfig,
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    #[serde(default = "default_database_url")]
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Seconds to wait for a pooled connection before failing.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_database_url() -> String {
    "sqlite://gitmarket.db?mode=rwc".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_connect_timeout() -> u64 {
    10
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

/// Marketplace rules, in minor currency units.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MarketConfig {
    /// Smallest amount a bounty may be placed for.
    #[serde(default = "default_min_bounty_amount")]
    pub min_bounty_amount: i64,
    /// Credit granted when an account is first opened.
    #[serde(default = "default_signup_bonus")]
    pub signup_bonus: i64,
    /// Host that pull request URLs must point at.
    #[serde(default = "default_code_host")]
    pub code_host: String,
    /// Buffer size of the domain event channel.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_min_bounty_amount() -> i64 {
    5
}

fn default_signup_bonus() -> i64 {
    100
}

fn default_code_host() -> String {
    "github.com".to_string()
}

fn default_event_capacity() -> usize {
    256
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            min_bounty_amount: default_min_bounty_amount(),
            signup_bonus: default_signup_bonus(),
            code_host: default_code_host(),
            event_capacity: default_event_capacity(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    "gitmarket=info,sea_orm=warn".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// Sources, lowest precedence first: `config/default`, `config/{RUN_MODE}`,
    /// then `GITMARKET__SECTION__KEY` environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("GITMARKET")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_defaults_without_sources() {
        temp_env::with_vars_unset(
            [
                "GITMARKET__DATABASE__URL",
                "GITMARKET__MARKET__SIGNUP_BONUS",
                "GITMARKET__MARKET__CODE_HOST",
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.database.url, "sqlite://gitmarket.db?mode=rwc");
                assert_eq!(config.market, MarketConfig::default());
                assert_eq!(config.market.min_bounty_amount, 5);
            },
        );
    }

    #[test]
    fn test_env_overrides() {
        temp_env::with_vars(
            [
                ("GITMARKET__DATABASE__URL", Some("postgres://localhost/gitmarket")),
                ("GITMARKET__MARKET__SIGNUP_BONUS", Some("250")),
                ("GITMARKET__MARKET__CODE_HOST", Some("git.example.org")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.database.url, "postgres://localhost/gitmarket");
                assert_eq!(config.market.signup_bonus, 250);
                assert_eq!(config.market.code_host, "git.example.org");
                assert_eq!(config.market.event_capacity, 256);
            },
        );
    }

    #[rstest]
    #[case::empty("{}", 100, 5)]
    #[case::no_bonus(r#"{"signup_bonus": 0}"#, 0, 5)]
    #[case::higher_minimum(r#"{"min_bounty_amount": 25}"#, 100, 25)]
    fn test_market_section_fills_defaults(
        #[case] json: &str,
        #[case] signup_bonus: i64,
        #[case] min_bounty_amount: i64,
    ) {
        let market: MarketConfig = serde_json::from_str(json).unwrap();
        assert_eq!(market.signup_bonus, signup_bonus);
        assert_eq!(market.min_bounty_amount, min_bounty_amount);
        assert_eq!(market.code_host, "github.com");
    }
}
