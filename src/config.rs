use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, anyhow};

use crate::leave::BalancePolicy;

#[derive(Clone, Debug)]
pub struct Config {
    pub server_addr: String,
    pub database_url: String,
    pub jwt_secret: String,
    pub api_prefix: String,

    // Rate limiting
    pub rate_protected_per_min: u32,

    pub balance_policy: BalancePolicy,
    pub user_cache_ttl: Duration,
    pub log_dir: String,
}

impl Config {
    /// Reads the process environment, after loading `.env` if present.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let required = |key: &str| lookup(key).ok_or_else(|| anyhow!("{key} must be set"));

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            api_prefix: lookup("API_PREFIX").unwrap_or_else(|| "/api".to_string()),

            rate_protected_per_min: parse_or(&lookup, "RATE_PROTECTED_PER_MIN", 1000)?,

            balance_policy: parse_or(&lookup, "LEAVE_BALANCE_POLICY", BalancePolicy::default())?,
            user_cache_ttl: Duration::from_secs(parse_or(&lookup, "USER_CACHE_TTL_SECS", 30)?),
            log_dir: lookup("LOG_DIR").unwrap_or_else(|| "logs".to_string()),
        })
    }
}

fn parse_or<T>(lookup: impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {raw:?}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("SERVER_ADDR", "127.0.0.1:8080"),
        ("DATABASE_URL", "mysql://hrm@localhost/hrm"),
        ("JWT_SECRET", "secret"),
    ];

    #[test]
    fn defaults_apply_when_optional_keys_are_absent() {
        let config = Config::from_lookup(lookup(&REQUIRED)).unwrap();
        assert_eq!(config.api_prefix, "/api");
        assert_eq!(config.rate_protected_per_min, 1000);
        assert_eq!(config.balance_policy, BalancePolicy::AllowNegative);
        assert_eq!(config.user_cache_ttl, Duration::from_secs(30));
        assert_eq!(config.log_dir, "logs");
    }

    #[test]
    fn optional_keys_override_defaults() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([
            ("LEAVE_BALANCE_POLICY", "block"),
            ("USER_CACHE_TTL_SECS", "5"),
            ("API_PREFIX", "/hrm"),
        ]);
        let config = Config::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.balance_policy, BalancePolicy::Block);
        assert_eq!(config.user_cache_ttl, Duration::from_secs(5));
        assert_eq!(config.api_prefix, "/hrm");
    }

    #[test]
    fn missing_secret_is_reported() {
        let err = Config::from_lookup(lookup(&REQUIRED[..2])).unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn unknown_policy_is_rejected() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("LEAVE_BALANCE_POLICY", "sometimes"));
        let err = Config::from_lookup(lookup(&pairs)).unwrap_err();
        assert!(err.to_string().contains("LEAVE_BALANCE_POLICY"));
    }
}
