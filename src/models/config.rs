//! Configuration model loaded from environment variables.
//!
//! Every field is bound to exactly one snake_case key through `serde(rename)`
//! and listed again in its group's `ENV_KEYS` table, which the loader uses to
//! select variables.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Deserializer, de};

use crate::domain::{parse_duration, parse_flag, parse_integer};

/// Immutable snapshot of every settings group.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub cache: CacheSettings,
    pub password: PasswordSettings,
    pub cors: CorsSettings,
    pub logger: LoggerSettings,
    pub otp: OtpSettings,
    pub jwt: JwtSettings,
}

impl Settings {
    /// Every environment key bound by some group.
    pub fn env_keys() -> impl Iterator<Item = &'static str> {
        [
            ServerSettings::ENV_KEYS,
            DatabaseSettings::ENV_KEYS,
            CacheSettings::ENV_KEYS,
            PasswordSettings::ENV_KEYS,
            CorsSettings::ENV_KEYS,
            LoggerSettings::ENV_KEYS,
            OtpSettings::ENV_KEYS,
            JwtSettings::ENV_KEYS,
        ]
        .into_iter()
        .flatten()
        .copied()
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServerSettings {
    #[serde(rename = "server_internal_port")]
    pub internal_port: String,
    #[serde(rename = "server_external_port")]
    pub external_port: String,
    #[serde(rename = "server_run_mode")]
    pub run_mode: String,
    #[serde(rename = "server_domain")]
    pub domain: String,
}

impl ServerSettings {
    pub const ENV_KEYS: &'static [&'static str] = &[
        "server_internal_port",
        "server_external_port",
        "server_run_mode",
        "server_domain",
    ];
}

/// Postgres connection and pool settings.
#[derive(Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DatabaseSettings {
    #[serde(rename = "postgres_host")]
    pub host: String,
    #[serde(rename = "postgres_port")]
    pub port: String,
    #[serde(rename = "postgres_user")]
    pub user: String,
    #[serde(rename = "postgres_password")]
    pub password: String,
    #[serde(rename = "postgres_db_name")]
    pub db_name: String,
    #[serde(rename = "postgres_ssl_mode")]
    pub ssl_mode: String,
    #[serde(rename = "postgres_max_idle_conns", deserialize_with = "integer")]
    pub max_idle_conns: i64,
    #[serde(rename = "postgres_max_open_conns", deserialize_with = "integer")]
    pub max_open_conns: i64,
    #[serde(rename = "postgres_conn_max_lifetime", deserialize_with = "duration")]
    pub conn_max_lifetime: Duration,
}

impl DatabaseSettings {
    pub const ENV_KEYS: &'static [&'static str] = &[
        "postgres_host",
        "postgres_port",
        "postgres_user",
        "postgres_password",
        "postgres_db_name",
        "postgres_ssl_mode",
        "postgres_max_idle_conns",
        "postgres_max_open_conns",
        "postgres_conn_max_lifetime",
    ];

    /// libpq keyword/value connection string. Empty parts are left out.
    pub fn dsn(&self) -> String {
        [
            ("host", &self.host),
            ("port", &self.port),
            ("user", &self.user),
            ("password", &self.password),
            ("dbname", &self.db_name),
            ("sslmode", &self.ssl_mode),
        ]
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join(" ")
    }
}

impl fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &redact(&self.password))
            .field("db_name", &self.db_name)
            .field("ssl_mode", &self.ssl_mode)
            .field("max_idle_conns", &self.max_idle_conns)
            .field("max_open_conns", &self.max_open_conns)
            .field("conn_max_lifetime", &self.conn_max_lifetime)
            .finish()
    }
}

/// Redis connection and pool settings.
#[derive(Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CacheSettings {
    #[serde(rename = "redis_host")]
    pub host: String,
    #[serde(rename = "redis_port")]
    pub port: String,
    #[serde(rename = "redis_password")]
    pub password: String,
    #[serde(rename = "redis_db")]
    pub db: String,
    #[serde(rename = "redis_dial_timeout", deserialize_with = "duration")]
    pub dial_timeout: Duration,
    #[serde(rename = "redis_read_timeout", deserialize_with = "duration")]
    pub read_timeout: Duration,
    #[serde(rename = "redis_write_timeout", deserialize_with = "duration")]
    pub write_timeout: Duration,
    #[serde(rename = "redis_idle_check_frequency", deserialize_with = "duration")]
    pub idle_check_frequency: Duration,
    #[serde(rename = "redis_pool_size", deserialize_with = "integer")]
    pub pool_size: i64,
    #[serde(rename = "redis_pool_timeout", deserialize_with = "duration")]
    pub pool_timeout: Duration,
}

impl CacheSettings {
    pub const ENV_KEYS: &'static [&'static str] = &[
        "redis_host",
        "redis_port",
        "redis_password",
        "redis_db",
        "redis_dial_timeout",
        "redis_read_timeout",
        "redis_write_timeout",
        "redis_idle_check_frequency",
        "redis_pool_size",
        "redis_pool_timeout",
    ];

    /// `host:port` pair for the Redis client.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Debug for CacheSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("password", &redact(&self.password))
            .field("db", &self.db)
            .field("dial_timeout", &self.dial_timeout)
            .field("read_timeout", &self.read_timeout)
            .field("write_timeout", &self.write_timeout)
            .field("idle_check_frequency", &self.idle_check_frequency)
            .field("pool_size", &self.pool_size)
            .field("pool_timeout", &self.pool_timeout)
            .finish()
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PasswordSettings {
    #[serde(rename = "password_include_chars", deserialize_with = "flag")]
    pub include_chars: bool,
    #[serde(rename = "password_include_digits", deserialize_with = "flag")]
    pub include_digits: bool,
    #[serde(rename = "password_min_length", deserialize_with = "integer")]
    pub min_length: i64,
    #[serde(rename = "password_max_length", deserialize_with = "integer")]
    pub max_length: i64,
    #[serde(rename = "password_include_uppercase", deserialize_with = "flag")]
    pub include_uppercase: bool,
    #[serde(rename = "password_include_lowercase", deserialize_with = "flag")]
    pub include_lowercase: bool,
}

impl PasswordSettings {
    pub const ENV_KEYS: &'static [&'static str] = &[
        "password_include_chars",
        "password_include_digits",
        "password_min_length",
        "password_max_length",
        "password_include_uppercase",
        "password_include_lowercase",
    ];
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CorsSettings {
    #[serde(rename = "cors_allow_origins")]
    pub allow_origins: String,
}

impl CorsSettings {
    pub const ENV_KEYS: &'static [&'static str] = &["cors_allow_origins"];

    /// Comma separated origins, trimmed, without empty entries.
    pub fn origins(&self) -> Vec<&str> {
        self.allow_origins
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .collect()
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggerSettings {
    #[serde(rename = "logger_file_path")]
    pub file_path: String,
    #[serde(rename = "logger_encoding")]
    pub encoding: String,
    #[serde(rename = "logger_level")]
    pub level: String,
    #[serde(rename = "logger_logger")]
    pub logger: String,
}

impl LoggerSettings {
    pub const ENV_KEYS: &'static [&'static str] = &[
        "logger_file_path",
        "logger_encoding",
        "logger_level",
        "logger_logger",
    ];
}

/// One-time password settings.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OtpSettings {
    #[serde(rename = "otp_expire_time", deserialize_with = "duration")]
    pub expire_time: Duration,
    #[serde(rename = "otp_digits", deserialize_with = "integer")]
    pub digits: i64,
    #[serde(rename = "otp_limiter", deserialize_with = "duration")]
    pub limiter: Duration,
}

impl OtpSettings {
    pub const ENV_KEYS: &'static [&'static str] =
        &["otp_expire_time", "otp_digits", "otp_limiter"];
}

/// Token signing settings.
#[derive(Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct JwtSettings {
    #[serde(
        rename = "jwt_access_token_expire_duration",
        deserialize_with = "duration"
    )]
    pub access_token_expire_duration: Duration,
    #[serde(
        rename = "jwt_refresh_token_expire_duration",
        deserialize_with = "duration"
    )]
    pub refresh_token_expire_duration: Duration,
    #[serde(rename = "jwt_secret")]
    pub secret: String,
    #[serde(rename = "jwt_refresh_secret")]
    pub refresh_secret: String,
}

impl JwtSettings {
    pub const ENV_KEYS: &'static [&'static str] = &[
        "jwt_access_token_expire_duration",
        "jwt_refresh_token_expire_duration",
        "jwt_secret",
        "jwt_refresh_secret",
    ];
}

impl fmt::Debug for JwtSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtSettings")
            .field(
                "access_token_expire_duration",
                &self.access_token_expire_duration,
            )
            .field(
                "refresh_token_expire_duration",
                &self.refresh_token_expire_duration,
            )
            .field("secret", &redact(&self.secret))
            .field("refresh_secret", &redact(&self.refresh_secret))
            .finish()
    }
}

fn redact(value: &str) -> &str {
    if value.is_empty() { "" } else { "***" }
}

fn integer<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_integer(&raw).map_err(de::Error::custom)
}

fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_flag(&raw).map_err(de::Error::custom)
}

fn duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_duration(&raw).map_err(de::Error::custom)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn env_keys_are_unique_snake_case() {
        let keys: Vec<&str> = Settings::env_keys().collect();
        let unique: HashSet<&str> = keys.iter().copied().collect();

        assert_eq!(keys.len(), 41);
        assert_eq!(unique.len(), keys.len());
        assert!(keys.iter().all(|key| {
            key.bytes()
                .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
        }));
    }

    #[test]
    fn dsn_skips_empty_parts() {
        let database = DatabaseSettings {
            host: "db".into(),
            port: "5432".into(),
            user: "app".into(),
            password: "pw".into(),
            db_name: "main".into(),
            ..Default::default()
        };

        assert_eq!(
            database.dsn(),
            "host=db port=5432 user=app password=pw dbname=main"
        );
        assert_eq!(DatabaseSettings::default().dsn(), "");
    }

    #[test]
    fn cache_address_joins_host_and_port() {
        let cache = CacheSettings {
            host: "redis".into(),
            port: "6379".into(),
            ..Default::default()
        };
        assert_eq!(cache.address(), "redis:6379");
    }

    #[test]
    fn cors_origins_are_split_and_trimmed() {
        let cors = CorsSettings {
            allow_origins: "https://a.example, https://b.example,,".into(),
        };
        assert_eq!(cors.origins(), vec!["https://a.example", "https://b.example"]);
        assert!(CorsSettings::default().origins().is_empty());
    }

    #[test]
    fn debug_output_redacts_credentials() {
        let settings = Settings {
            database: DatabaseSettings {
                password: "db-secret".into(),
                ..Default::default()
            },
            cache: CacheSettings {
                password: "redis-secret".into(),
                ..Default::default()
            },
            jwt: JwtSettings {
                secret: "jwt-secret".into(),
                refresh_secret: "refresh-secret".into(),
                ..Default::default()
            },
            ..Default::default()
        };

        let rendered = format!("{settings:?}");
        assert!(!rendered.contains("db-secret"));
        assert!(!rendered.contains("redis-secret"));
        assert!(!rendered.contains("jwt-secret"));
        assert!(!rendered.contains("refresh-secret"));
        assert!(rendered.contains("***"));
    }
}
