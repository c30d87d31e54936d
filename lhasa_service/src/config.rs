/// Service configuration loader - parses lhasa.toml
///
/// Separates endpoints, timeouts and historical-data settings from code, so
/// that a telemetry URL or the window granularity can change without
/// recompiling. Every field has a default; an empty file is a valid config.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable holding the INMET API token (read after `.env`).
pub const TOKEN_ENV_VAR: &str = "INMET_TOKEN";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {0}")]
    Read(PathBuf, #[source] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config value: {0}")]
    Invalid(String),
}

// ---------------------------------------------------------------------------
// Configuration structures
// ---------------------------------------------------------------------------

/// Root configuration, one section per concern.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub history: HistoryConfig,
    pub telemetry: TelemetryConfig,
    pub logging: LoggingConfig,
}

/// Boundary at which the window aggregator opens and closes windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Day,
    #[default]
    Hour,
    QuarterHour,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Directory holding `<token>_<YYYYMM>_<suffix>.txt` rain logs.
    pub directory: PathBuf,
    pub granularity: Granularity,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("data/history"),
            granularity: Granularity::Hour,
        }
    }
}

/// Which extrapolation heuristic turns hourly INMET data into windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizerKind {
    #[default]
    LatestHourly,
    LinearExtrapolation,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Primary station list endpoint.
    pub stations_url: String,
    /// Primary per-station data base URL.
    pub data_url: String,
    /// Legacy bulk endpoint; `queryTime=YYYYMMDD_HHMM` is appended.
    pub legacy_url: String,
    /// Only stations in this state are considered (`SG_ESTADO`).
    pub state: String,
    pub timeout_secs: u64,
    pub legacy_timeout_secs: u64,
    pub worker_threads: usize,
    pub max_stations: usize,
    pub lookback_days: i64,
    pub normalizer: NormalizerKind,
    /// Filled from the environment, never from the file.
    #[serde(skip)]
    pub token: Option<String>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            stations_url: "https://apitempo.inmet.gov.br/estacoes/T".to_string(),
            data_url: "https://apitempo.inmet.gov.br".to_string(),
            legacy_url: "http://websempre.rio.rj.gov.br/json/chuvas".to_string(),
            state: "RJ".to_string(),
            timeout_secs: 30,
            legacy_timeout_secs: 120,
            worker_threads: 4,
            max_stations: 50,
            lookback_days: 1,
            normalizer: NormalizerKind::LatestHourly,
            token: None,
        }
    }
}

impl TelemetryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn legacy_timeout(&self) -> Duration {
        Duration::from_secs(self.legacy_timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// One of "debug", "info", "warn", "error".
    pub level: String,
    pub file: Option<PathBuf>,
    pub console_timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            console_timestamps: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Parses and validates a configuration document.
pub fn parse_config(contents: &str) -> Result<ServiceConfig, ConfigError> {
    let config: ServiceConfig = toml::from_str(contents)?;
    validate(&config)?;
    Ok(config)
}

/// Loads `path`, then fills the API token from `.env` / the environment.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ServiceConfig, ConfigError> {
    let path = path.as_ref();
    let contents =
        fs::read_to_string(path).map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
    let mut config = parse_config(&contents)?;

    dotenv::dotenv().ok();
    config.telemetry.token = std::env::var(TOKEN_ENV_VAR)
        .ok()
        .filter(|t| !t.trim().is_empty());

    Ok(config)
}

fn validate(config: &ServiceConfig) -> Result<(), ConfigError> {
    let t = &config.telemetry;
    if t.timeout_secs == 0 || t.legacy_timeout_secs == 0 {
        return Err(ConfigError::Invalid(
            "telemetry timeouts must be at least one second".to_string(),
        ));
    }
    if t.worker_threads == 0 {
        return Err(ConfigError::Invalid(
            "telemetry.worker_threads must be at least 1".to_string(),
        ));
    }
    if t.lookback_days < 0 {
        return Err(ConfigError::Invalid(
            "telemetry.lookback_days cannot be negative".to_string(),
        ));
    }
    if crate::logging::parse_level(&config.logging.level).is_none() {
        return Err(ConfigError::Invalid(format!(
            "unknown logging.level '{}'",
            config.logging.level
        )));
    }
    Ok(())
}
