//! Server configuration

use agent_utils::{ConfigError, parse_var};
use std::net::SocketAddr;
use std::time::Duration;

/// HTTP server and request tracker settings
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Bind host
    pub host: String,

    /// Bind port
    pub port: u16,

    /// Maximum tracked requests
    pub capacity: usize,

    /// How long a finished request stays pollable
    pub result_ttl: Duration,

    /// Upper bound on one analysis run; `None` disables it
    pub request_deadline: Option<Duration>,

    /// Allow any origin
    pub cors_permissive: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            capacity: 1024,
            result_ttl: Duration::from_secs(60 * 60),
            request_deadline: Some(Duration::from_secs(10 * 60)),
            cors_permissive: true,
        }
    }
}

impl ServerConfig {
    /// Load from environment variables
    ///
    /// | Variable | Default |
    /// |---|---|
    /// | `HOST` | `0.0.0.0` |
    /// | `PORT` | `5000` |
    /// | `TRACKER_CAPACITY` | `1024` |
    /// | `RESULT_TTL_SECS` | `3600` |
    /// | `REQUEST_DEADLINE_SECS` | `600`, `0` disables |
    /// | `CORS_PERMISSIVE` | `true` |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using a custom variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let capacity: usize = parse_var(&lookup, "TRACKER_CAPACITY")?.unwrap_or(defaults.capacity);
        if capacity == 0 {
            return Err(ConfigError::InvalidValue {
                key: "TRACKER_CAPACITY".to_string(),
                value: "0".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }

        let result_ttl = parse_var::<u64, _>(&lookup, "RESULT_TTL_SECS")?
            .map_or(defaults.result_ttl, Duration::from_secs);
        let request_deadline = match parse_var::<u64, _>(&lookup, "REQUEST_DEADLINE_SECS")? {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => defaults.request_deadline,
        };

        Ok(Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_var(&lookup, "PORT")?.unwrap_or(defaults.port),
            capacity,
            result_ttl,
            request_deadline,
            cors_permissive: parse_var(&lookup, "CORS_PERMISSIVE")?
                .unwrap_or(defaults.cors_permissive),
        })
    }

    /// Socket address to bind
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::InvalidValue {
                key: "HOST".to_string(),
                value: self.host.clone(),
                reason: e.to_string(),
            })
    }
}
