use std::env;
use std::fmt;
use std::fs;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::debug;

pub mod policies;
pub mod sensors;

pub use policies::{PoliciesConfig, PolicyError};
pub use sensors::{Lookback, SensorsConfig, SensorsError};

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

/// Top-level configuration for the monitor process.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub files: ConfigFiles,
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
        let ansi = env::var("APP_LOG_ANSI")
            .map(|value| matches!(value.trim(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let policies = env::var("APP_POLICIES_PATH").unwrap_or_else(|_| "policies.toml".to_string());
        let sensors = env::var("APP_SENSORS_PATH").unwrap_or_else(|_| "sensors.toml".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level, ansi },
            files: ConfigFiles {
                policies: PathBuf::from(policies),
                sensors: PathBuf::from(sensors),
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
    pub ansi: bool,
}

/// Locations of the policy and sensor definitions.
#[derive(Debug, Clone)]
pub struct ConfigFiles {
    pub policies: PathBuf,
    pub sensors: PathBuf,
}

impl ConfigFiles {
    pub fn load_policies(&self) -> Result<PoliciesConfig, ConfigError> {
        load_policies(&self.policies)
    }

    pub fn load_sensors(&self) -> Result<SensorsConfig, ConfigError> {
        load_sensors(&self.sensors)
    }
}

/// Read, parse and validate a policies file.
pub fn load_policies(path: impl AsRef<Path>) -> Result<PoliciesConfig, ConfigError> {
    let path = path.as_ref();
    let policies: PoliciesConfig = load_toml(path)?;
    policies.validate()?;
    debug!(path = %path.display(), policy_version = %policies.policy_version, "loaded policies");
    Ok(policies)
}

/// Read, parse and validate a sensors file.
pub fn load_sensors(path: impl AsRef<Path>) -> Result<SensorsConfig, ConfigError> {
    let path = path.as_ref();
    let sensors: SensorsConfig = load_toml(path)?;
    sensors.validate()?;
    debug!(path = %path.display(), "loaded sensors");
    Ok(sensors)
}

fn load_toml<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    if raw.trim().is_empty() {
        return Err(ConfigError::Empty {
            path: path.to_path_buf(),
        });
    }

    toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    Read { path: PathBuf, source: std::io::Error },
    Empty { path: PathBuf },
    Parse { path: PathBuf, source: toml::de::Error },
    Policy(PolicyError),
    Sensors(SensorsError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::Read { path, .. } => {
                write!(f, "unable to read config file {}", path.display())
            }
            ConfigError::Empty { path } => write!(f, "config file {} is empty", path.display()),
            ConfigError::Parse { path, source } => {
                write!(f, "invalid config file {}: {}", path.display(), source)
            }
            ConfigError::Policy(err) => write!(f, "invalid policies: {err}"),
            ConfigError::Sensors(err) => write!(f, "invalid sensors: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::Empty { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::Read { source, .. } => Some(source),
            ConfigError::Parse { source, .. } => Some(source),
            ConfigError::Policy(err) => Some(err),
            ConfigError::Sensors(err) => Some(err),
        }
    }
}

impl From<PolicyError> for ConfigError {
    fn from(value: PolicyError) -> Self {
        Self::Policy(value)
    }
}

impl From<SensorsError> for ConfigError {
    fn from(value: SensorsError) -> Self {
        Self::Sensors(value)
    }
}
