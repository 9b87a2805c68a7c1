//! Runtime configuration from environment variables

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_PORT: u16 = 3002;
pub const DEFAULT_MAX_TEMPLATE_BYTES: usize = 512 * 1024;
pub const DEFAULT_OVERDUE_SWEEP_SECS: u64 = 3600;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub bind_addr: IpAddr,
    pub seed_default_templates: bool,
    /// Largest accepted template markup, in bytes
    pub max_template_bytes: usize,
    /// Period of the overdue-invoice sweep
    pub overdue_sweep: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            seed_default_templates: true,
            max_template_bytes: DEFAULT_MAX_TEMPLATE_BYTES,
            overdue_sweep: Duration::from_secs(DEFAULT_OVERDUE_SWEEP_SECS),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; bad values fall back to the default
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            port: parse_or(&lookup, "PORT", defaults.port),
            bind_addr: parse_or(&lookup, "BIND_ADDR", defaults.bind_addr),
            seed_default_templates: parse_or(
                &lookup,
                "SEED_DEFAULT_TEMPLATES",
                defaults.seed_default_templates,
            ),
            max_template_bytes: parse_or(&lookup, "MAX_TEMPLATE_BYTES", defaults.max_template_bytes),
            overdue_sweep: Duration::from_secs(parse_or(
                &lookup,
                "OVERDUE_SWEEP_SECS",
                DEFAULT_OVERDUE_SWEEP_SECS,
            )
            .max(1)),
        }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, "invalid configuration value, using default");
            default
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Config {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]);
        assert_eq!(config, Config::default());
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:3002");
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("PORT", "8080"),
            ("BIND_ADDR", "127.0.0.1"),
            ("SEED_DEFAULT_TEMPLATES", "false"),
            ("MAX_TEMPLATE_BYTES", " 1024 "),
        ]);
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:8080");
        assert!(!config.seed_default_templates);
        assert_eq!(config.max_template_bytes, 1024);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = config(&[("PORT", "http"), ("SEED_DEFAULT_TEMPLATES", "yes")]);
        assert_eq!(config.port, DEFAULT_PORT);
        assert!(config.seed_default_templates);
    }
}
