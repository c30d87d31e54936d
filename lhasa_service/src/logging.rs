/// Structured logging for the landslide danger service
///
/// Implements the `log` facade with context-rich output: every record is
/// tagged with the data source it concerns (history, INMET, legacy, …) and
/// optionally appended to a log file with a timestamp, so operators can
/// audit what was skipped or fell back without inspecting intermediate state.

use chrono::Utc;
use log::{LevelFilter, Log, Metadata, Record};
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::config::LoggingConfig;
use crate::model::TelemetryError;

// ---------------------------------------------------------------------------
// Data Source Types
// ---------------------------------------------------------------------------

/// Where a log line originates; used as the `log` target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    History,
    Inmet,
    Legacy,
    Matcher,
    Classifier,
    Pipeline,
}

impl DataSource {
    pub fn target(self) -> &'static str {
        match self {
            DataSource::History => "history",
            DataSource::Inmet => "inmet",
            DataSource::Legacy => "legacy",
            DataSource::Matcher => "matcher",
            DataSource::Classifier => "classifier",
            DataSource::Pipeline => "pipeline",
        }
    }

    fn from_target(target: &str) -> Option<Self> {
        match target {
            "history" => Some(DataSource::History),
            "inmet" => Some(DataSource::Inmet),
            "legacy" => Some(DataSource::Legacy),
            "matcher" => Some(DataSource::Matcher),
            "classifier" => Some(DataSource::Classifier),
            "pipeline" => Some(DataSource::Pipeline),
            _ => None,
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::History => write!(f, "HIST"),
            DataSource::Inmet => write!(f, "INMET"),
            DataSource::Legacy => write!(f, "LEGACY"),
            DataSource::Matcher => write!(f, "MATCH"),
            DataSource::Classifier => write!(f, "CLASS"),
            DataSource::Pipeline => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureType {
    /// Station reported no data for the period (HTTP 204, empty array)
    Expected,
    /// Timeouts, non-2xx responses or unparseable payloads
    Unexpected,
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

pub fn classify_telemetry_failure(err: &TelemetryError) -> FailureType {
    match err {
        TelemetryError::NoData(_) => FailureType::Expected,
        TelemetryError::HttpStatus { .. }
        | TelemetryError::Timeout { .. }
        | TelemetryError::Parse { .. }
        | TelemetryError::AllSourcesFailed { .. } => FailureType::Unexpected,
        TelemetryError::Transport { .. } => FailureType::Unknown,
    }
}

// ---------------------------------------------------------------------------
// Logger
// ---------------------------------------------------------------------------

pub struct ServiceLogger {
    min_level: LevelFilter,
    log_file: Option<PathBuf>,
    console_timestamps: bool,
    file_lock: Mutex<()>,
}

impl ServiceLogger {
    pub fn new(min_level: LevelFilter, log_file: Option<PathBuf>, console_timestamps: bool) -> Self {
        ServiceLogger {
            min_level,
            log_file,
            console_timestamps,
            file_lock: Mutex::new(()),
        }
    }

    fn source_tag(target: &str) -> String {
        DataSource::from_target(target)
            .map(|s| s.to_string())
            .unwrap_or_else(|| target.to_string())
    }

    pub fn format_entry(record: &Record) -> String {
        format!(
            "{} {} {}: {}",
            Utc::now().format("%Y-%m-%d %H:%M:%S UTC"),
            record.level(),
            Self::source_tag(record.target()),
            record.args()
        )
    }

    fn append_to_file(&self, path: &PathBuf, entry: &str) -> std::io::Result<()> {
        let _guard = self.file_lock.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", entry)
    }
}

impl Log for ServiceLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.min_level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let entry = Self::format_entry(record);
        let tag = Self::source_tag(record.target());

        if self.console_timestamps {
            match record.level() {
                log::Level::Error | log::Level::Warn => eprintln!("{}", entry),
                _ => println!("{}", entry),
            }
        } else {
            match record.level() {
                log::Level::Error => eprintln!("   ✗ {}: {}", tag, record.args()),
                log::Level::Warn => eprintln!("   ⚠ {}: {}", tag, record.args()),
                log::Level::Info => println!("   {}", record.args()),
                log::Level::Debug | log::Level::Trace => {
                    println!("   [DEBUG] {}", record.args())
                }
            }
        }

        if let Some(ref path) = self.log_file {
            if let Err(e) = self.append_to_file(path, &entry) {
                eprintln!("Failed to write to log file {}: {}", path.display(), e);
            }
        }
    }

    fn flush(&self) {}
}

/// Parses a config level name ("debug", "info", "warn"/"warning", "error").
pub fn parse_level(level: &str) -> Option<LevelFilter> {
    match level.trim().to_ascii_lowercase().as_str() {
        "debug" => Some(LevelFilter::Debug),
        "info" => Some(LevelFilter::Info),
        "warn" | "warning" => Some(LevelFilter::Warn),
        "error" => Some(LevelFilter::Error),
        "off" => Some(LevelFilter::Off),
        _ => None,
    }
}

/// Installs the service logger. Fails if a logger was already installed.
pub fn init_logger(config: &LoggingConfig) -> Result<(), log::SetLoggerError> {
    let level = parse_level(&config.level).unwrap_or(LevelFilter::Info);
    let logger = ServiceLogger::new(level, config.file.clone(), config.console_timestamps);
    log::set_boxed_logger(Box::new(logger))?;
    log::set_max_level(level);
    Ok(())
}

// ---------------------------------------------------------------------------
// Structured Failure Logging
// ---------------------------------------------------------------------------

/// Logs a per-station telemetry failure at a level matching its class.
pub fn log_station_failure(source: DataSource, station: &str, operation: &str, err: &TelemetryError) {
    let failure_type = classify_telemetry_failure(err);
    let target = source.target();

    match failure_type {
        FailureType::Expected => {
            log::debug!(target: target, "[{}] {} failed [{}]: {}", station, operation, failure_type, err)
        }
        FailureType::Unexpected => {
            log::error!(target: target, "[{}] {} failed [{}]: {}", station, operation, failure_type, err)
        }
        FailureType::Unknown => {
            log::warn!(target: target, "[{}] {} failed [{}]: {}", station, operation, failure_type, err)
        }
    }
}

// ---------------------------------------------------------------------------
// Summary Logging
// ---------------------------------------------------------------------------

/// Logs the audit summary for a phase, escalating when anything failed.
pub fn log_run_summary(source: DataSource, what: &str, total: usize, successful: usize, failed: usize) {
    let target = source.target();
    let message = format!("{}: {}/{} successful, {} failed", what, successful, total, failed);

    if failed == 0 {
        log::info!(target: target, "{}", message);
    } else if successful == 0 {
        log::error!(target: target, "{}", message);
    } else {
        log::warn!(target: target, "{}", message);
    }
}
