use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use crate::domain::order::TransitionPolicy;
use crate::service::ServiceSettings;

// ============================================================================
// Configuration - environment variables
// ============================================================================

pub const ENV_DATABASE_URL: &str = "ORDERS_DATABASE_URL";
pub const ENV_DB_MAX_CONNECTIONS: &str = "ORDERS_DB_MAX_CONNECTIONS";
pub const ENV_METRICS_PORT: &str = "ORDERS_METRICS_PORT";
pub const ENV_TRANSITION_POLICY: &str = "ORDERS_TRANSITION_POLICY";
pub const ENV_RESERVATION_DEADLINE_MS: &str = "ORDERS_RESERVATION_DEADLINE_MS";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Absent means the in-memory backend.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    /// 0 disables the metrics exporter.
    pub metrics_port: u16,
    pub transition_policy: TransitionPolicy,
    pub reservation_deadline: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            db_max_connections: 10,
            metrics_port: 9090,
            transition_policy: TransitionPolicy::Permissive,
            reservation_deadline: Duration::from_millis(5000),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = Self::default();

        let reservation_deadline = match get(ENV_RESERVATION_DEADLINE_MS) {
            Some(raw) => Duration::from_millis(parse(ENV_RESERVATION_DEADLINE_MS, &raw)?),
            None => defaults.reservation_deadline,
        };

        let transition_policy = match get(ENV_TRANSITION_POLICY) {
            Some(raw) => TransitionPolicy::from_str(&raw)
                .map_err(|e| anyhow!(e))
                .with_context(|| format!("invalid {ENV_TRANSITION_POLICY}"))?,
            None => defaults.transition_policy,
        };

        Ok(Self {
            database_url: get(ENV_DATABASE_URL),
            db_max_connections: match get(ENV_DB_MAX_CONNECTIONS) {
                Some(raw) => parse(ENV_DB_MAX_CONNECTIONS, &raw)?,
                None => defaults.db_max_connections,
            },
            metrics_port: match get(ENV_METRICS_PORT) {
                Some(raw) => parse(ENV_METRICS_PORT, &raw)?,
                None => defaults.metrics_port,
            },
            transition_policy,
            reservation_deadline,
        })
    }

    pub fn service_settings(&self) -> ServiceSettings {
        ServiceSettings {
            transition_policy: self.transition_policy,
            reservation_deadline: self.reservation_deadline,
        }
    }
}

fn parse<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse()
        .with_context(|| format!("invalid {key}: {raw:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.metrics_port, 9090);
        assert_eq!(config.reservation_deadline, Duration::from_secs(5));
    }

    #[test]
    fn test_reads_every_variable() {
        let config = config_from(&[
            (ENV_DATABASE_URL, "postgres://localhost/orders"),
            (ENV_DB_MAX_CONNECTIONS, "4"),
            (ENV_METRICS_PORT, "0"),
            (ENV_TRANSITION_POLICY, "Strict"),
            (ENV_RESERVATION_DEADLINE_MS, "250"),
        ])
        .unwrap();

        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/orders"));
        assert_eq!(config.db_max_connections, 4);
        assert_eq!(config.metrics_port, 0);
        assert_eq!(config.transition_policy, TransitionPolicy::Strict);

        let settings = config.service_settings();
        assert_eq!(settings.reservation_deadline, Duration::from_millis(250));
        assert_eq!(settings.transition_policy, TransitionPolicy::Strict);
    }

    #[test]
    fn test_blank_database_url_means_in_memory() {
        let config = config_from(&[(ENV_DATABASE_URL, "  ")]).unwrap();
        assert!(config.database_url.is_none());
    }

    #[test]
    fn test_errors_name_the_variable() {
        let err = config_from(&[(ENV_METRICS_PORT, "not-a-port")]).unwrap_err();
        assert!(format!("{err:#}").contains(ENV_METRICS_PORT));

        let err = config_from(&[(ENV_TRANSITION_POLICY, "lenient")]).unwrap_err();
        assert!(format!("{err:#}").contains(ENV_TRANSITION_POLICY));
    }
}
