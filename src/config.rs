//! Configuration Module
//!
//! Handles loading and managing service configuration from environment variables.

use std::env;
use std::path::PathBuf;

use crate::cache::StalenessPolicy;

/// Default TTL applied when a fetch request names none.
pub const DEFAULT_TTL: u64 = 3600;

/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Location of the SQLite cache file
    pub db_path: PathBuf,
    /// Default TTL in seconds for requests without explicit TTL
    pub default_ttl: u64,
    /// HTTP server port
    pub server_port: u16,
    /// Upstream request timeout in seconds
    pub http_timeout: u64,
    /// Maximum number of concurrent upstream requests in a batch
    pub fetch_concurrency: usize,
    /// Seconds between purge runs, 0 disables the purge task
    pub purge_interval: u64,
    /// Seconds an entry must have been stale before it is purged
    pub purge_grace: u64,
    /// How entry age is compared against its TTL
    pub staleness: StalenessPolicy,
    /// User-Agent header sent upstream
    pub user_agent: String,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_DB_PATH` - Cache database file (default: `<config dir>/kickoff-player/cache.db`)
    /// - `DEFAULT_TTL` - Default TTL in seconds (default: 3600)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `HTTP_TIMEOUT` - Upstream timeout in seconds (default: 10)
    /// - `FETCH_CONCURRENCY` - Batch fetch concurrency (default: 8)
    /// - `PURGE_INTERVAL` - Purge frequency in seconds, 0 = off (default: 0)
    /// - `PURGE_GRACE` - Stale grace period in seconds (default: 604800)
    /// - `STALENESS_POLICY` - `forward` or `symmetric` (default: forward)
    /// - `USER_AGENT` - Upstream User-Agent (default: `kickoff-cache/<version>`)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            db_path: env::var("CACHE_DB_PATH")
                .ok()
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            default_ttl: parse_var("DEFAULT_TTL").unwrap_or(defaults.default_ttl),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            http_timeout: parse_var("HTTP_TIMEOUT").unwrap_or(defaults.http_timeout),
            fetch_concurrency: parse_var("FETCH_CONCURRENCY")
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.fetch_concurrency),
            purge_interval: parse_var("PURGE_INTERVAL").unwrap_or(defaults.purge_interval),
            purge_grace: parse_var("PURGE_GRACE").unwrap_or(defaults.purge_grace),
            staleness: parse_var("STALENESS_POLICY").unwrap_or(defaults.staleness),
            user_agent: env::var("USER_AGENT").unwrap_or(defaults.user_agent),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}

/// Default cache file under the user's config directory.
pub fn default_db_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("kickoff-player")
        .join("cache.db")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            default_ttl: DEFAULT_TTL,
            server_port: 3000,
            http_timeout: 10,
            fetch_concurrency: 8,
            purge_interval: 0,
            purge_grace: 604_800,
            staleness: StalenessPolicy::Forward,
            user_agent: concat!("kickoff-cache/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.default_ttl, 3600);
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.http_timeout, 10);
        assert_eq!(config.purge_interval, 0);
        assert_eq!(config.staleness, StalenessPolicy::Forward);
        assert!(config.db_path.ends_with("kickoff-player/cache.db"));
    }

    #[test]
    fn test_config_from_env() {
        // Single test touches the environment to avoid races between tests
        env::remove_var("DEFAULT_TTL");
        env::remove_var("SERVER_PORT");
        env::remove_var("PURGE_INTERVAL");
        env::set_var("STALENESS_POLICY", "symmetric");
        env::set_var("FETCH_CONCURRENCY", "0");
        env::set_var("CACHE_DB_PATH", "/tmp/kickoff-test/cache.db");

        let config = Config::from_env();
        assert_eq!(config.default_ttl, 3600);
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.purge_interval, 0);
        assert_eq!(config.staleness, StalenessPolicy::Symmetric);
        assert_eq!(config.fetch_concurrency, 8);
        assert_eq!(config.db_path, PathBuf::from("/tmp/kickoff-test/cache.db"));

        env::remove_var("STALENESS_POLICY");
        env::remove_var("FETCH_CONCURRENCY");
        env::remove_var("CACHE_DB_PATH");
    }
}
