//! Process configuration read from the environment (and `.env`)

use std::time::Duration;

use steamstats_core::{Result, StatsError};

pub const DEFAULT_API_BASE: &str = "https://api.steampowered.com";
pub const DEFAULT_STORE_BASE: &str = "https://store.steampowered.com";

#[derive(Clone)]
pub struct Config {
    /// Steam Web API key, sent as the `key` query parameter
    pub steam_api_key: String,
    pub api_base: String,
    pub store_base: String,
    pub bind_address: String,
    pub upstream_timeout: Duration,
    /// Upper bound on in-flight upstream calls per fan-out
    pub fanout_concurrency: usize,
    pub db: deadpool_postgres::Config,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("steam_api_key", &"<redacted>")
            .field("api_base", &self.api_base)
            .field("store_base", &self.store_base)
            .field("bind_address", &self.bind_address)
            .field("upstream_timeout", &self.upstream_timeout)
            .field("fanout_concurrency", &self.fanout_concurrency)
            .finish_non_exhaustive()
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let steam_api_key = lookup("STEAM_API_KEY")
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| StatsError::Config("STEAM_API_KEY is not set".to_string()))?;

        let upstream_timeout = match lookup("UPSTREAM_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_var("UPSTREAM_TIMEOUT_SECS", &raw)?),
            None => Duration::from_secs(10),
        };

        let fanout_concurrency = match lookup("FANOUT_CONCURRENCY") {
            Some(raw) => parse_var::<usize>("FANOUT_CONCURRENCY", &raw)?.max(1),
            None => 8,
        };

        let mut db = deadpool_postgres::Config::new();
        db.host = lookup("DB_HOST");
        db.port = lookup("DB_PORT").and_then(|p| p.parse().ok());
        db.dbname = lookup("DB_NAME");
        db.user = lookup("DB_USER");
        db.password = lookup("DB_PASSWORD");

        Ok(Self {
            steam_api_key,
            api_base: lookup("STEAM_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            store_base: lookup("STEAM_STORE_BASE").unwrap_or_else(|| DEFAULT_STORE_BASE.to_string()),
            bind_address: lookup("BIND_ADDRESS").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
            upstream_timeout,
            fanout_concurrency,
            db,
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| StatsError::Config(format!("{} must be a positive integer, got {:?}", name, raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn requires_api_key() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, StatsError::Config(_)));

        let err = Config::from_lookup(lookup(&[("STEAM_API_KEY", "  ")])).unwrap_err();
        assert!(matches!(err, StatsError::Config(_)));
    }

    #[test]
    fn applies_defaults() {
        let config = Config::from_lookup(lookup(&[("STEAM_API_KEY", "abc")])).unwrap();
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.store_base, DEFAULT_STORE_BASE);
        assert_eq!(config.bind_address, "0.0.0.0:8080");
        assert_eq!(config.upstream_timeout, Duration::from_secs(10));
        assert_eq!(config.fanout_concurrency, 8);
    }

    #[test]
    fn reads_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("STEAM_API_KEY", "abc"),
            ("UPSTREAM_TIMEOUT_SECS", "3"),
            ("FANOUT_CONCURRENCY", "0"),
            ("DB_HOST", "db"),
            ("DB_PORT", "5433"),
        ]))
        .unwrap();
        assert_eq!(config.upstream_timeout, Duration::from_secs(3));
        assert_eq!(config.fanout_concurrency, 1);
        assert_eq!(config.db.host.as_deref(), Some("db"));
        assert_eq!(config.db.port, Some(5433));
    }

    #[test]
    fn rejects_bad_numbers() {
        let err = Config::from_lookup(lookup(&[
            ("STEAM_API_KEY", "abc"),
            ("UPSTREAM_TIMEOUT_SECS", "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, StatsError::Config(_)));
    }

    #[test]
    fn debug_redacts_key() {
        let config = Config::from_lookup(lookup(&[("STEAM_API_KEY", "secret-key")])).unwrap();
        assert!(!format!("{:?}", config).contains("secret-key"));
    }
}
