use chrono::Duration;
use std::env;
use thiserror::Error;

const DEFAULT_ACCESS_SECRET: &str = "access-secret";
const DEFAULT_REFRESH_SECRET: &str = "refresh-secret";
const MAX_EXPIRY_DAYS: i64 = 365;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be a number, got {1:?}")]
    NotANumber(&'static str, String),
    #[error("{0} is not a valid duration: {1:?} (expected e.g. \"900\", \"15m\", \"7d\")")]
    InvalidDuration(&'static str, String),
    #[error("{0} must be greater than zero")]
    NonPositiveDuration(&'static str),
    #[error("{0} must not exceed {max} days", max = MAX_EXPIRY_DAYS)]
    ExcessiveDuration(&'static str),
    #[error("{0} must not be empty")]
    EmptySecret(&'static str),
    #[error("JWT_ACCESS_SECRET and JWT_REFRESH_SECRET must differ")]
    SharedSecret,
    #[error("BCRYPT_COST must be between 4 and 31, got {0}")]
    BcryptCost(u32),
    #[error("APP_ENV must be \"development\" or \"production\", got {0:?}")]
    UnknownEnvironment(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

/// Secrets, token lifetimes and hashing cost for the authentication core.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HMAC secret for access tokens.
    pub access_secret: String,
    /// HMAC secret for refresh tokens. Must differ from `access_secret`.
    pub refresh_secret: String,
    /// Access token lifetime (default: 15 minutes).
    pub access_expiry: Duration,
    /// Refresh token lifetime (default: 7 days).
    pub refresh_expiry: Duration,
    /// bcrypt work factor used when hashing new passwords.
    pub bcrypt_cost: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            access_secret: DEFAULT_ACCESS_SECRET.into(),
            refresh_secret: DEFAULT_REFRESH_SECRET.into(),
            access_expiry: Duration::minutes(15),
            refresh_expiry: Duration::days(7),
            bcrypt_cost: 12,
        }
    }
}

impl AuthConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.access_secret.is_empty() {
            return Err(ConfigError::EmptySecret("JWT_ACCESS_SECRET"));
        }
        if self.refresh_secret.is_empty() {
            return Err(ConfigError::EmptySecret("JWT_REFRESH_SECRET"));
        }
        if self.access_secret == self.refresh_secret {
            return Err(ConfigError::SharedSecret);
        }
        if self.access_expiry <= Duration::zero() {
            return Err(ConfigError::NonPositiveDuration("ACCESS_TOKEN_EXPIRY"));
        }
        if self.refresh_expiry <= Duration::zero() {
            return Err(ConfigError::NonPositiveDuration("REFRESH_TOKEN_EXPIRY"));
        }
        if self.access_expiry > Duration::days(MAX_EXPIRY_DAYS) {
            return Err(ConfigError::ExcessiveDuration("ACCESS_TOKEN_EXPIRY"));
        }
        if self.refresh_expiry > Duration::days(MAX_EXPIRY_DAYS) {
            return Err(ConfigError::ExcessiveDuration("REFRESH_TOKEN_EXPIRY"));
        }
        if !(4..=31).contains(&self.bcrypt_cost) {
            return Err(ConfigError::BcryptCost(self.bcrypt_cost));
        }
        Ok(())
    }

    pub fn uses_default_secrets(&self) -> bool {
        self.access_secret == DEFAULT_ACCESS_SECRET || self.refresh_secret == DEFAULT_REFRESH_SECRET
    }
}

pub struct Config {
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub server_port: u16,
    pub server_host: String,
    pub environment: Environment,
    pub cors_origin: String,
    pub auth: AuthConfig,
}

impl Config {
    /// Reads the configuration from the process environment and validates it.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup. Unset or empty keys fall back
    /// to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = AuthConfig::default();

        let auth = AuthConfig {
            access_secret: get("JWT_ACCESS_SECRET")
                .or_else(|| get("JWT_SECRET"))
                .unwrap_or(defaults.access_secret),
            refresh_secret: get("JWT_REFRESH_SECRET").unwrap_or(defaults.refresh_secret),
            access_expiry: match get("ACCESS_TOKEN_EXPIRY") {
                Some(raw) => parse_expiry("ACCESS_TOKEN_EXPIRY", &raw)?,
                None => defaults.access_expiry,
            },
            refresh_expiry: match get("REFRESH_TOKEN_EXPIRY") {
                Some(raw) => parse_expiry("REFRESH_TOKEN_EXPIRY", &raw)?,
                None => defaults.refresh_expiry,
            },
            bcrypt_cost: match get("BCRYPT_COST") {
                Some(raw) => parse_number("BCRYPT_COST", &raw)?,
                None => defaults.bcrypt_cost,
            },
        };
        auth.validate()?;

        let environment = match get("APP_ENV").as_deref() {
            None | Some("development") => Environment::Development,
            Some("production") => Environment::Production,
            Some(other) => return Err(ConfigError::UnknownEnvironment(other.to_string())),
        };

        Ok(Self {
            database_url: get("DATABASE_URL"),
            database_max_connections: match get("DATABASE_MAX_CONNECTIONS") {
                Some(raw) => parse_number("DATABASE_MAX_CONNECTIONS", &raw)?,
                None => 5,
            },
            server_port: match get("PORT").or_else(|| get("SERVER_PORT")) {
                Some(raw) => parse_number("PORT", &raw)?,
                None => 3001,
            },
            server_host: get("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            environment,
            cors_origin: get("CORS_ORIGIN").unwrap_or_else(|| "http://localhost:3000".to_string()),
            auth,
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }

    /// Logs operational warnings that do not prevent startup.
    pub fn warn_insecure_defaults(&self) {
        if self.auth.uses_default_secrets() {
            if self.environment == Environment::Production {
                log::warn!(
                    "JWT secrets are using their built-in defaults in production; set JWT_ACCESS_SECRET and JWT_REFRESH_SECRET"
                );
            } else {
                log::info!("JWT secrets are using their built-in development defaults");
            }
        }
    }
}

fn parse_number<T: std::str::FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::NotANumber(key, raw.to_string()))
}

/// Parses lifetimes such as `"900"`, `"45s"`, `"15m"`, `"12h"` or `"7d"`.
/// A bare integer is a number of seconds.
pub fn parse_expiry(key: &'static str, raw: &str) -> Result<Duration, ConfigError> {
    let invalid = || ConfigError::InvalidDuration(key, raw.to_string());
    let trimmed = raw.trim();
    let split = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (digits, unit) = trimmed.split_at(split);

    let amount: i64 = digits.parse().map_err(|_| invalid())?;
    let duration = match unit {
        "" | "s" => Duration::try_seconds(amount),
        "m" => Duration::try_minutes(amount),
        "h" => Duration::try_hours(amount),
        "d" => Duration::try_days(amount),
        _ => None,
    }
    .ok_or_else(invalid)?;

    if duration <= Duration::zero() {
        return Err(ConfigError::NonPositiveDuration(key));
    }
    Ok(duration)
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
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config.database_url, None);
        assert_eq!(config.server_port, 3001);
        assert_eq!(config.server_host, "127.0.0.1");
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.cors_origin, "http://localhost:3000");
        assert_eq!(config.auth.access_expiry, Duration::minutes(15));
        assert_eq!(config.auth.refresh_expiry, Duration::days(7));
        assert_ne!(config.auth.access_secret, config.auth.refresh_secret);
        assert!(config.auth.uses_default_secrets());
        assert_eq!(config.server_url(), "http://127.0.0.1:3001");
    }

    #[test]
    fn test_config_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://test"),
            ("SERVER_PORT", "3000"),
            ("SERVER_HOST", "0.0.0.0"),
            ("APP_ENV", "production"),
            ("JWT_SECRET", "legacy-access"),
            ("JWT_REFRESH_SECRET", "refresh-override"),
            ("ACCESS_TOKEN_EXPIRY", "5m"),
            ("REFRESH_TOKEN_EXPIRY", "30d"),
            ("BCRYPT_COST", "10"),
        ]))
        .unwrap();

        assert_eq!(config.database_url.as_deref(), Some("postgres://test"));
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.server_host, "0.0.0.0");
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.auth.access_secret, "legacy-access");
        assert_eq!(config.auth.refresh_secret, "refresh-override");
        assert_eq!(config.auth.access_expiry, Duration::minutes(5));
        assert_eq!(config.auth.refresh_expiry, Duration::days(30));
        assert_eq!(config.auth.bcrypt_cost, 10);
        assert!(!config.auth.uses_default_secrets());
    }

    #[test]
    fn test_access_secret_takes_precedence_over_legacy_name() {
        let config = Config::from_lookup(lookup(&[
            ("JWT_SECRET", "legacy"),
            ("JWT_ACCESS_SECRET", "preferred"),
        ]))
        .unwrap();
        assert_eq!(config.auth.access_secret, "preferred");
    }

    #[test]
    fn test_shared_secret_is_rejected() {
        let result = Config::from_lookup(lookup(&[
            ("JWT_ACCESS_SECRET", "same"),
            ("JWT_REFRESH_SECRET", "same"),
        ]));
        assert_eq!(result.err(), Some(ConfigError::SharedSecret));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(matches!(
            Config::from_lookup(lookup(&[("PORT", "eighty")])).err(),
            Some(ConfigError::NotANumber("PORT", _))
        ));
        assert!(matches!(
            Config::from_lookup(lookup(&[("ACCESS_TOKEN_EXPIRY", "15 minutes")])).err(),
            Some(ConfigError::InvalidDuration("ACCESS_TOKEN_EXPIRY", _))
        ));
        assert_eq!(
            Config::from_lookup(lookup(&[("REFRESH_TOKEN_EXPIRY", "0d")])).err(),
            Some(ConfigError::NonPositiveDuration("REFRESH_TOKEN_EXPIRY"))
        );
        assert_eq!(
            Config::from_lookup(lookup(&[("REFRESH_TOKEN_EXPIRY", "1000000000d")])).err(),
            Some(ConfigError::ExcessiveDuration("REFRESH_TOKEN_EXPIRY"))
        );
        assert_eq!(
            Config::from_lookup(lookup(&[("ACCESS_TOKEN_EXPIRY", "366d")])).err(),
            Some(ConfigError::ExcessiveDuration("ACCESS_TOKEN_EXPIRY"))
        );
        assert!(Config::from_lookup(lookup(&[("REFRESH_TOKEN_EXPIRY", "365d")])).is_ok());
        assert_eq!(
            Config::from_lookup(lookup(&[("BCRYPT_COST", "2")])).err(),
            Some(ConfigError::BcryptCost(2))
        );
        assert!(matches!(
            Config::from_lookup(lookup(&[("APP_ENV", "staging")])).err(),
            Some(ConfigError::UnknownEnvironment(_))
        ));
    }

    #[test]
    fn test_parse_expiry_units() {
        assert_eq!(parse_expiry("X", "900").unwrap(), Duration::seconds(900));
        assert_eq!(parse_expiry("X", "45s").unwrap(), Duration::seconds(45));
        assert_eq!(parse_expiry("X", "15m").unwrap(), Duration::minutes(15));
        assert_eq!(parse_expiry("X", "12h").unwrap(), Duration::hours(12));
        assert_eq!(parse_expiry("X", " 7d ").unwrap(), Duration::days(7));
        assert!(parse_expiry("X", "7w").is_err());
        assert!(parse_expiry("X", "m").is_err());
        assert!(parse_expiry("X", "-5m").is_err());
    }
}
