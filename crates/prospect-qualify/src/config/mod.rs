use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub data: DataConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let regions_path = env::var("PROSPECT_REGIONS_PATH")
            .unwrap_or_else(|_| DataConfig::DEFAULT_REGIONS_PATH.to_string());
        let preferences_path = env::var("PROSPECT_PREFERENCES_PATH")
            .unwrap_or_else(|_| DataConfig::DEFAULT_PREFERENCES_PATH.to_string());
        let prospects_path = env::var("PROSPECT_CSV_PATH")
            .unwrap_or_else(|_| DataConfig::DEFAULT_PROSPECTS_PATH.to_string());
        let database_path = env::var("PROSPECT_DB_PATH")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);
        let batch_size = match env::var("PROSPECT_BATCH_SIZE") {
            Ok(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|size| *size > 0)
                .ok_or(ConfigError::InvalidBatchSize)?,
            Err(_) => DataConfig::DEFAULT_BATCH_SIZE,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            data: DataConfig {
                regions_path: PathBuf::from(regions_path),
                preferences_path: PathBuf::from(preferences_path),
                prospects_path: PathBuf::from(prospects_path),
                database_path,
                batch_size,
            },
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Locations of the region mapping, user preferences, prospect rows, and the optional store.
#[derive(Debug, Clone)]
pub struct DataConfig {
    pub regions_path: PathBuf,
    pub preferences_path: PathBuf,
    pub prospects_path: PathBuf,
    /// SQLite file backing the repository; `None` keeps results in memory.
    pub database_path: Option<PathBuf>,
    pub batch_size: usize,
}

impl DataConfig {
    pub const DEFAULT_REGIONS_PATH: &'static str = "data/country-to-regions-mapping.json";
    pub const DEFAULT_PREFERENCES_PATH: &'static str = "data/users-locations-settings.json";
    pub const DEFAULT_PROSPECTS_PATH: &'static str = "data/prospects.csv";
    pub const DEFAULT_BATCH_SIZE: usize = 1000;
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidBatchSize,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidBatchSize => {
                write!(f, "PROSPECT_BATCH_SIZE must be a positive integer")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidBatchSize => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
