// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names, default values, and the
//! [`Config`] type loaded from the environment at startup. A `.env` file is
//! honoured when present.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `API_URL` | Base URL of the marketplace backend | `http://127.0.0.1:8000` |
//! | `SECRET_KEY` | Shared HS256 secret used to verify session tokens | Required in production |
//! | `APP_ENV` | `development` or `production` | `development` |
//! | `COOKIE_DOMAIN` | Cookie domain applied in production (e.g. `.tenexis.in`) | unset |
//! | `PROTECTED_PATHS` | Comma-separated path prefixes guarded by the edge gate | `/profile` |
//! | `LOGIN_PATH` | Where denied requests are redirected | `/login` |
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `3000` |
//! | `LISTINGS_REVALIDATE_SECS` | Listing collection cache window | `60` |
//! | `LISTING_REVALIDATE_SECS` | Single listing cache window | `120` |
//! | `CATEGORIES_REVALIDATE_SECS` | Category cache window | `300` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

use std::{net::SocketAddr, str::FromStr, time::Duration};

use url::Url;

pub const API_URL_ENV: &str = "API_URL";
pub const SECRET_KEY_ENV: &str = "SECRET_KEY";
pub const APP_ENV_ENV: &str = "APP_ENV";
pub const COOKIE_DOMAIN_ENV: &str = "COOKIE_DOMAIN";
pub const PROTECTED_PATHS_ENV: &str = "PROTECTED_PATHS";
pub const LOGIN_PATH_ENV: &str = "LOGIN_PATH";
pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
pub const LISTINGS_TTL_ENV: &str = "LISTINGS_REVALIDATE_SECS";
pub const LISTING_TTL_ENV: &str = "LISTING_REVALIDATE_SECS";
pub const CATEGORIES_TTL_ENV: &str = "CATEGORIES_REVALIDATE_SECS";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_LOGIN_PATH: &str = "/login";
pub const DEFAULT_PROTECTED_PATHS: &str = "/profile";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;

/// Secret used when `SECRET_KEY` is unset outside production.
///
/// Matches the backend's development default so local tokens verify.
pub const DEV_SECRET_KEY: &str = "super-secret-key";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} is not a valid URL: {source}")]
    InvalidUrl {
        var: &'static str,
        #[source]
        source: url::ParseError,
    },

    #[error("{var} must use http or https, got {scheme}")]
    UnsupportedScheme { var: &'static str, scheme: String },

    #[error("SECRET_KEY must be set in production")]
    MissingSecret,

    #[error("{var} must be a non-negative integer, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },

    #[error("APP_ENV must be `development` or `production`, got {0:?}")]
    InvalidEnvironment(String),

    #[error("LOG_FORMAT must be `json` or `pretty`, got {0:?}")]
    InvalidLogFormat(String),

    #[error("invalid bind address {0:?}")]
    InvalidBindAddress(String),
}

/// Deployment environment. Drives the cookie `secure`/`domain` attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            other => Err(ConfigError::InvalidEnvironment(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            other => Err(ConfigError::InvalidLogFormat(other.to_string())),
        }
    }
}

/// Revalidation windows for the data fetchers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheTtls {
    pub listings: Duration,
    pub listing: Duration,
    pub categories: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            listings: Duration::from_secs(60),
            listing: Duration::from_secs(120),
            categories: Duration::from_secs(300),
        }
    }
}

/// Fully resolved gateway configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: Url,
    pub secret_key: String,
    pub environment: Environment,
    pub cookie_domain: Option<String>,
    pub protected_paths: Vec<String>,
    pub login_path: String,
    pub host: String,
    pub port: u16,
    pub cache: CacheTtls,
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: Url::parse(DEFAULT_API_URL).expect("default API URL is valid"),
            secret_key: DEV_SECRET_KEY.to_string(),
            environment: Environment::Development,
            cookie_domain: None,
            protected_paths: parse_paths(DEFAULT_PROTECTED_PATHS),
            login_path: DEFAULT_LOGIN_PATH.to_string(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            cache: CacheTtls::default(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup.
    ///
    /// Blank values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment = match get(APP_ENV_ENV) {
            Some(value) => value.parse()?,
            None => Environment::Development,
        };

        let raw_url = get(API_URL_ENV).unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let api_url = Url::parse(raw_url.trim()).map_err(|source| ConfigError::InvalidUrl {
            var: API_URL_ENV,
            source,
        })?;
        if !matches!(api_url.scheme(), "http" | "https") {
            return Err(ConfigError::UnsupportedScheme {
                var: API_URL_ENV,
                scheme: api_url.scheme().to_string(),
            });
        }

        let secret_key = match get(SECRET_KEY_ENV) {
            Some(secret) => secret,
            None if environment == Environment::Production => {
                return Err(ConfigError::MissingSecret)
            }
            None => DEV_SECRET_KEY.to_string(),
        };

        let port = match get(PORT_ENV) {
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidNumber {
                    var: PORT_ENV,
                    value,
                })?,
            None => DEFAULT_PORT,
        };

        let defaults = CacheTtls::default();
        let cache = CacheTtls {
            listings: seconds(&get, LISTINGS_TTL_ENV, defaults.listings)?,
            listing: seconds(&get, LISTING_TTL_ENV, defaults.listing)?,
            categories: seconds(&get, CATEGORIES_TTL_ENV, defaults.categories)?,
        };

        let log_format = match get(LOG_FORMAT_ENV) {
            Some(value) => value.parse()?,
            None => LogFormat::Pretty,
        };

        Ok(Self {
            api_url,
            secret_key,
            environment,
            cookie_domain: get(COOKIE_DOMAIN_ENV).map(|d| d.trim().to_string()),
            protected_paths: parse_paths(
                &get(PROTECTED_PATHS_ENV).unwrap_or_else(|| DEFAULT_PROTECTED_PATHS.to_string()),
            ),
            login_path: get(LOGIN_PATH_ENV).unwrap_or_else(|| DEFAULT_LOGIN_PATH.to_string()),
            host: get(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port,
            cache,
            log_format,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        let raw = format!("{}:{}", self.host, self.port);
        raw.parse()
            .map_err(|_| ConfigError::InvalidBindAddress(raw))
    }
}

fn seconds<G>(get: &G, var: &'static str, default: Duration) -> Result<Duration, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    match get(var) {
        Some(value) => value
            .trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| ConfigError::InvalidNumber { var, value }),
        None => Ok(default),
    }
}

/// Normalise a comma-separated list of path prefixes.
fn parse_paths(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| {
            let p = p.trim_end_matches('/');
            if p.is_empty() {
                "/".to_string()
            } else if p.starts_with('/') {
                p.to_string()
            } else {
                format!("/{p}")
            }
        })
        .collect()
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

    #[test]
    fn defaults_apply_when_environment_is_empty() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.api_url.as_str(), "http://127.0.0.1:8000/");
        assert_eq!(config.secret_key, DEV_SECRET_KEY);
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.protected_paths, vec!["/profile".to_string()]);
        assert_eq!(config.login_path, "/login");
        assert_eq!(config.cache, CacheTtls::default());
        assert!(!config.is_production());
    }

    #[test]
    fn production_requires_secret() {
        let result = Config::from_lookup(lookup(&[(APP_ENV_ENV, "production")]));
        assert!(matches!(result, Err(ConfigError::MissingSecret)));

        let config = Config::from_lookup(lookup(&[
            (APP_ENV_ENV, "production"),
            (SECRET_KEY_ENV, "s3cret"),
            (COOKIE_DOMAIN_ENV, ".tenexis.in"),
        ]))
        .unwrap();
        assert!(config.is_production());
        assert_eq!(config.cookie_domain.as_deref(), Some(".tenexis.in"));
    }

    #[test]
    fn protected_paths_are_normalised() {
        let config = Config::from_lookup(lookup(&[(
            PROTECTED_PATHS_ENV,
            "/profile/, add-product , ,/onboarding",
        )]))
        .unwrap();
        assert_eq!(
            config.protected_paths,
            vec!["/profile", "/add-product", "/onboarding"]
        );
    }

    #[test]
    fn rejects_bad_values() {
        assert!(matches!(
            Config::from_lookup(lookup(&[(PORT_ENV, "eighty")])),
            Err(ConfigError::InvalidNumber { var: PORT_ENV, .. })
        ));
        assert!(matches!(
            Config::from_lookup(lookup(&[(API_URL_ENV, "ftp://backend")])),
            Err(ConfigError::UnsupportedScheme { .. })
        ));
        assert!(matches!(
            Config::from_lookup(lookup(&[(APP_ENV_ENV, "staging")])),
            Err(ConfigError::InvalidEnvironment(_))
        ));
        assert!(matches!(
            Config::from_lookup(lookup(&[(LOG_FORMAT_ENV, "xml")])),
            Err(ConfigError::InvalidLogFormat(_))
        ));
    }

    #[test]
    fn cache_windows_can_be_overridden() {
        let config = Config::from_lookup(lookup(&[(LISTINGS_TTL_ENV, "5")])).unwrap();
        assert_eq!(config.cache.listings, Duration::from_secs(5));
        assert_eq!(config.cache.categories, Duration::from_secs(300));
    }

    #[test]
    fn bind_addr_combines_host_and_port() {
        let config = Config::from_lookup(lookup(&[(HOST_ENV, "127.0.0.1"), (PORT_ENV, "8081")]))
            .unwrap();
        assert_eq!(config.bind_addr().unwrap().port(), 8081);
    }
}
