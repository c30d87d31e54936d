//! Landslide danger nowcast, single run.
//!
//! Loads `lhasa.toml` and `zones.toml` from the working directory, fetches
//! live telemetry, classifies every area of risk and prints one JSON line
//! per classified area on stdout.
//!
//! Environment:
//!   INMET_TOKEN - optional INMET API token (also read from .env)

use chrono::Local;
use std::error::Error;
use std::io::{self, Write};

use lhasa_service::config::load_config;
use lhasa_service::ingest::telemetry::{LiveTelemetryFetcher, ReqwestTransport};
use lhasa_service::logging::init_logger;
use lhasa_service::model::{ClassifiedZone, ZoneOutput};
use lhasa_service::pipeline::{ClassifiedZoneSink, RunToCompletion, SinkError, nowcast};
use lhasa_service::zones::TomlZoneSource;

/// Writes `ZoneOutput` records as JSON lines.
struct JsonLinesSink<W: Write> {
    out: W,
}

impl<W: Write> ClassifiedZoneSink for JsonLinesSink<W> {
    fn write(&mut self, _run_label: &str, zones: &[ClassifiedZone]) -> Result<(), SinkError> {
        for zone in zones {
            let line = serde_json::to_string(&ZoneOutput::from(zone))?;
            writeln!(self.out, "{}", line)?;
        }
        self.out.flush()?;
        Ok(())
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let config = load_config("lhasa.toml")?;
    init_logger(&config.logging)?;

    let zones = TomlZoneSource::load("zones.toml")?;
    let fetcher = LiveTelemetryFetcher::new(ReqwestTransport::new()?, config.telemetry.clone());
    let mut sink = JsonLinesSink { out: io::stdout().lock() };

    let summary = nowcast(
        &fetcher,
        &zones,
        &zones,
        &mut sink,
        &RunToCompletion,
        Local::now().naive_local(),
    )?;

    log::info!(
        target: "pipeline",
        "{}: {} areas classified ({:?} telemetry)",
        summary.label,
        summary.classified,
        summary.telemetry_source
    );
    Ok(())
}
