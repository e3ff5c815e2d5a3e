//! Service configuration from environment variables

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 1111;
pub const DEFAULT_KEY_PREFIX: &str = "guestlist";
pub const DEFAULT_SCAN_PAGE_SIZE: usize = guestlist::DEFAULT_SCAN_PAGE_SIZE;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind_addr: IpAddr,
    pub port: u16,
    /// Redis connection URL. Records are kept in process memory when unset.
    pub redis_url: Option<String>,
    pub redis_key_prefix: String,
    pub scan_page_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            redis_url: None,
            redis_key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            scan_page_size: DEFAULT_SCAN_PAGE_SIZE,
        }
    }
}

impl Config {
    /// Read `PORT`, `BIND_ADDR`, `REDIS_URL`, `REDIS_KEY_PREFIX` and `SCAN_PAGE_SIZE`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = match lookup("PORT") {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                expected: "a valid port number",
                value,
            })?,
            None => defaults.port,
        };

        let bind_addr = match lookup("BIND_ADDR") {
            Some(value) => value.parse().map_err(|_| ConfigError::Invalid {
                name: "BIND_ADDR",
                expected: "an IP address",
                value,
            })?,
            None => defaults.bind_addr,
        };

        let scan_page_size = match lookup("SCAN_PAGE_SIZE") {
            Some(value) => match value.parse::<usize>() {
                Ok(size) if size > 0 => size,
                _ => {
                    return Err(ConfigError::Invalid {
                        name: "SCAN_PAGE_SIZE",
                        expected: "a positive integer",
                        value,
                    });
                }
            },
            None => defaults.scan_page_size,
        };

        let redis_url = lookup("REDIS_URL").filter(|url| !url.trim().is_empty());
        let redis_key_prefix = lookup("REDIS_KEY_PREFIX")
            .filter(|prefix| !prefix.is_empty())
            .unwrap_or(defaults.redis_key_prefix);

        Ok(Self {
            bind_addr,
            port,
            redis_url,
            redis_key_prefix,
            scan_page_size,
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:1111");
        assert!(config.redis_url.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("PORT", "8080"),
            ("BIND_ADDR", "127.0.0.1"),
            ("REDIS_URL", "redis://redis:6379"),
            ("REDIS_KEY_PREFIX", "party"),
            ("SCAN_PAGE_SIZE", "25"),
        ]))
        .unwrap();

        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:8080");
        assert_eq!(config.redis_url.as_deref(), Some("redis://redis:6379"));
        assert_eq!(config.redis_key_prefix, "party");
        assert_eq!(config.scan_page_size, 25);
    }

    #[test]
    fn test_blank_redis_url_means_memory() {
        let config = Config::from_lookup(lookup(&[("REDIS_URL", " ")])).unwrap();
        assert!(config.redis_url.is_none());
    }

    #[test]
    fn test_invalid_port() {
        let err = Config::from_lookup(lookup(&[("PORT", "eighty")])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "PORT must be a valid port number, got \"eighty\""
        );
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let err = Config::from_lookup(lookup(&[("SCAN_PAGE_SIZE", "0")])).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                name: "SCAN_PAGE_SIZE",
                ..
            }
        ));
    }

    #[test]
    fn test_invalid_bind_addr() {
        assert!(Config::from_lookup(lookup(&[("BIND_ADDR", "localhost")])).is_err());
    }
}
