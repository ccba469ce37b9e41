//! Environment-driven settings for the school operations service.

use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use crate::store::PaginationConfig;

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_LOG_LEVEL: &str = "info";

/// Deployment stage selected through `APP_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    /// Bounds for every listing endpoint.
    pub pagination: PaginationConfig,
}

impl AppConfig {
    /// Reads `.env` when present, then the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            environment: env::var("APP_ENV")
                .map(|raw| AppEnvironment::parse(&raw))
                .unwrap_or(AppEnvironment::Development),
            server: ServerConfig::from_env()?,
            telemetry: TelemetryConfig {
                log_level: var_or("APP_LOG_LEVEL", DEFAULT_LOG_LEVEL),
            },
            pagination: pagination_from_env()?,
        })
    }
}

fn var_or(name: &str, fallback: &str) -> String {
    env::var(name).unwrap_or_else(|_| fallback.to_string())
}

/// A default larger than the maximum is pulled down to the maximum.
fn pagination_from_env() -> Result<PaginationConfig, ConfigError> {
    let defaults = PaginationConfig::default();
    let max_page_size = page_size("ATTENDANCE_MAX_PAGE_SIZE", defaults.max_page_size)?;
    let default_page_size = page_size("ATTENDANCE_DEFAULT_PAGE_SIZE", defaults.default_page_size)?;

    Ok(PaginationConfig {
        default_page_size: default_page_size.min(max_page_size),
        max_page_size,
    })
}

fn page_size(name: &'static str, fallback: u32) -> Result<u32, ConfigError> {
    let Ok(raw) = env::var(name) else {
        return Ok(fallback);
    };
    raw.trim()
        .parse::<u32>()
        .ok()
        .filter(|size| *size > 0)
        .ok_or(ConfigError::InvalidPageSize { name })
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let port = match env::var("APP_PORT") {
            Ok(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidPort)?,
            Err(_) => DEFAULT_PORT,
        };
        Ok(Self {
            host: var_or("APP_HOST", DEFAULT_HOST),
            port,
        })
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip = if self.host.eq_ignore_ascii_case("localhost") {
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        } else {
            self.host.parse()?
        };
        Ok(SocketAddr::new(ip, self.port))
    }
}

/// `EnvFilter` directive used when `RUST_LOG` is unset.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("APP_PORT must be a valid u16")]
    InvalidPort,
    #[error("APP_HOST must parse to an IPv4 or IPv6 address")]
    InvalidHost(#[from] std::net::AddrParseError),
    #[error("{name} must be a positive integer")]
    InvalidPageSize { name: &'static str },
}
