use std::str::FromStr;
use std::time::Duration;

use sqlx::postgres::PgConnectOptions;
use thiserror::Error;

use crate::validation::KnownProtocols;

/// Every setting is read from `STEWAPI_<KEY>`.
pub const ENV_PREFIX: &str = "STEWAPI_";

const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("illegal port number {port} for {key}")]
    IllegalPort { key: &'static str, port: u16 },

    #[error("illegal number of min/max SQL connections (min {min}, max {max})")]
    IllegalConnections { min: u32, max: u32 },

    #[error("{key} must be greater than zero")]
    NotPositive { key: &'static str },

    #[error("illegal protocol list {value:?} for KNOWN_PROTOCOLS")]
    IllegalProtocols { value: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
    pub min_connections: u32,
    pub max_connections: u32,
    /// Budget of a single stored-procedure call
    pub timeout: Duration,
}

impl DatabaseConfig {
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.username)
            .password(&self.password)
            .database(&self.database)
    }
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub listen_address: String,
    pub listen_port: u16,
    /// Largest request body the access logger buffers
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub known_protocols: KnownProtocols,
    pub log_format: LogFormat,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from `lookup`, which receives full variable
    /// names such as `STEWAPI_SQL_HOST`. Unparseable values fall back to
    /// their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env { lookup };

        let database = DatabaseConfig {
            host: env.string("SQL_HOST", "127.0.0.1"),
            port: port(&env, "SQL_PORT", 5432)?,
            username: env.string("SQL_USERNAME", "postgres"),
            password: env.string("SQL_PASSWORD", ""),
            database: env.string("SQL_DATABASE", "stew"),
            min_connections: env.parsed("SQL_MIN_CONNS", 1),
            max_connections: env.parsed("SQL_MAX_CONNS", 10),
            timeout: Duration::from_secs(positive(&env, "SQL_TIMEOUT_SECS", 3)?),
        };
        if database.min_connections == 0
            || database.max_connections == 0
            || database.max_connections < database.min_connections
        {
            return Err(ConfigError::IllegalConnections {
                min: database.min_connections,
                max: database.max_connections,
            });
        }

        let api = ApiConfig {
            listen_address: env.string("LISTEN_ADDRESS", "127.0.0.1"),
            listen_port: port(&env, "LISTEN_PORT", 8080)?,
            max_body_bytes: positive(&env, "MAX_BODY_BYTES", DEFAULT_MAX_BODY_BYTES)?,
        };

        Ok(Self {
            database,
            api,
            known_protocols: known_protocols(&env)?,
            log_format: env.parsed("LOG_FORMAT", LogFormat::default()),
        })
    }
}

struct Env<F> {
    lookup: F,
}

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn raw(&self, key: &str) -> Option<String> {
        (self.lookup)(&format!("{ENV_PREFIX}{key}"))
    }

    fn string(&self, key: &str, fallback: &str) -> String {
        self.raw(key).unwrap_or_else(|| fallback.to_string())
    }

    fn parsed<T: FromStr>(&self, key: &str, fallback: T) -> T {
        self.raw(key)
            .and_then(|value| value.trim().parse().ok())
            .unwrap_or(fallback)
    }
}

fn port<F>(env: &Env<F>, key: &'static str, fallback: u16) -> Result<u16, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let port = env.parsed(key, fallback);
    if port <= 1024 {
        return Err(ConfigError::IllegalPort { key, port });
    }
    Ok(port)
}

/// An unset or blank list selects the built-in table; anything else must
/// parse to at least one protocol number.
fn known_protocols<F>(env: &Env<F>) -> Result<KnownProtocols, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = env.raw("KNOWN_PROTOCOLS").filter(|raw| !raw.trim().is_empty()) else {
        return Ok(KnownProtocols::default());
    };
    match KnownProtocols::parse_list(&raw) {
        Ok(known) if !known.is_empty() => Ok(known),
        _ => Err(ConfigError::IllegalProtocols { value: raw }),
    }
}

fn positive<F, T>(env: &Env<F>, key: &'static str, fallback: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Default + PartialEq,
{
    let value = env.parsed(key, fallback);
    if value == T::default() {
        return Err(ConfigError::NotPositive { key });
    }
    Ok(value)
}
