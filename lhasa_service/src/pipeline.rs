/// Run orchestration.
///
/// Two kinds of run share the same tail (associate, classify, hand off):
///
/// - `nowcast`: live telemetry for the current moment, INMET first and the
///   legacy bulk endpoint as fallback.
/// - `historical_cast`: one day and hour range replayed from the monthly
///   station logs through the window aggregator.
///
/// Runs are single-threaded apart from the telemetry fetch. The caller can
/// stop a run between phases through `RunControl`; nothing is handed to the
/// sink for a cancelled run.

use chrono::NaiveDateTime;
use std::error::Error as StdError;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

use crate::alert::danger::classify_areas;
use crate::analysis::associate::{associate_historical, associate_live};
use crate::analysis::merge::merge_by_zone;
use crate::analysis::windows::aggregate_station;
use crate::config::HistoryConfig;
use crate::ingest::history::{FileRejection, HistoryError, ingest_directory};
use crate::ingest::telemetry::{HttpTransport, LiveTelemetryFetcher, TelemetrySourceKind};
use crate::logging::DataSource;
use crate::model::{AssociatedZone, ClassifiedZone, RequestError, TelemetryError};
use crate::period::{HistoricalRequest, run_label};
use crate::zones::{SusceptibilitySource, ZoneSource, ZoneSourceError, load_zones};

const TARGET: &str = "pipeline";

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

/// Checked between phases; returning `false` stops the run.
pub trait RunControl {
    fn should_continue(&self) -> bool;
}

/// Never stops a run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunToCompletion;

impl RunControl for RunToCompletion {
    fn should_continue(&self) -> bool {
        true
    }
}

/// Cancellation flag that can be shared with another thread.
#[derive(Debug, Default)]
pub struct CancellationFlag {
    cancelled: AtomicBool,
}

impl CancellationFlag {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

impl RunControl for CancellationFlag {
    fn should_continue(&self) -> bool {
        !self.cancelled.load(Ordering::SeqCst)
    }
}

pub type SinkError = Box<dyn StdError + Send + Sync>;

/// Receives the classified zones of a finished run (the GIS writer).
pub trait ClassifiedZoneSink {
    fn write(&mut self, run_label: &str, zones: &[ClassifiedZone]) -> Result<(), SinkError>;
}

/// Keeps everything in memory.
impl ClassifiedZoneSink for Vec<ClassifiedZone> {
    fn write(&mut self, _run_label: &str, zones: &[ClassifiedZone]) -> Result<(), SinkError> {
        self.extend_from_slice(zones);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Errors and summary
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Request(#[from] RequestError),
    #[error(transparent)]
    Zones(#[from] ZoneSourceError),
    #[error(transparent)]
    History(#[from] HistoryError),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error("sink rejected the classified zones")]
    Sink(#[source] SinkError),
    #[error("run cancelled before {0}")]
    Cancelled(&'static str),
}

/// Audit counts of a completed run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub label: String,
    pub zones: usize,
    pub zones_with_data: usize,
    pub classified: usize,
    pub skipped_low: usize,
    pub invalid_areas: usize,
    /// Live runs only.
    pub telemetry_source: Option<TelemetrySourceKind>,
    /// Historical runs only.
    pub stations_ingested: usize,
    pub files_rejected: Vec<FileRejection>,
    pub misaligned_stations: usize,
}

/// Historical request as typed by the operator, validated by the run.
#[derive(Debug, Clone, Copy)]
pub struct HistoricalQuery<'a> {
    pub start_date: &'a str,
    pub end_date: &'a str,
    pub start_time: &'a str,
    pub end_time: &'a str,
}

fn checkpoint(control: &dyn RunControl, phase: &'static str) -> Result<(), RunError> {
    if control.should_continue() {
        Ok(())
    } else {
        log::warn!(target: TARGET, "run cancelled before {}", phase);
        Err(RunError::Cancelled(phase))
    }
}

// ---------------------------------------------------------------------------
// Runs
// ---------------------------------------------------------------------------

/// Classifies every area of risk against the latest live telemetry.
///
/// # Errors
/// Zone or susceptibility source failures, telemetry failure on both paths,
/// a sink error, or cancellation.
pub fn nowcast<T: HttpTransport + 'static>(
    fetcher: &LiveTelemetryFetcher<T>,
    zone_source: &dyn ZoneSource,
    susceptibility: &dyn SusceptibilitySource,
    sink: &mut dyn ClassifiedZoneSink,
    control: &dyn RunControl,
    now: NaiveDateTime,
) -> Result<RunSummary, RunError> {
    let label = run_label(now);
    log::info!(target: TARGET, "nowcast {} ({} normalizer)", label, fetcher.normalizer_name());

    checkpoint(control, "loading zones")?;
    let zones = load_zones(zone_source)?;

    checkpoint(control, "fetching telemetry")?;
    let snapshot = fetcher.fetch(&zones, now)?;

    checkpoint(control, "matching zones")?;
    let associated = associate_live(&zones, &snapshot.records);

    let mut summary = finish(&label, &associated, susceptibility, sink, control)?;
    summary.telemetry_source = Some(snapshot.source);
    Ok(summary)
}

/// Replays one requested day and hour range from the historical logs.
///
/// The request is validated before any file is read.
///
/// # Errors
/// An invalid request, an unlistable log directory, zone or susceptibility
/// source failures, a sink error, or cancellation.
pub fn historical_cast(
    config: &HistoryConfig,
    query: HistoricalQuery<'_>,
    zone_source: &dyn ZoneSource,
    susceptibility: &dyn SusceptibilitySource,
    sink: &mut dyn ClassifiedZoneSink,
    control: &dyn RunControl,
) -> Result<RunSummary, RunError> {
    let request = HistoricalRequest::parse(query.start_date, query.end_date, query.start_time, query.end_time)?;
    let label = run_label(request.date.and_time(request.start_time));
    log::info!(
        target: TARGET,
        "historical cast {} ({} {}h, {:?} windows)",
        label,
        request.date_label(),
        request.hour_label(),
        config.granularity
    );

    checkpoint(control, "loading zones")?;
    let zones = load_zones(zone_source)?;

    checkpoint(control, "ingesting history")?;
    let ingested = ingest_directory(&config.directory, Some(request.period()))?;

    checkpoint(control, "aggregating windows")?;
    let filter = request.window_filter();
    let mut windows = Vec::new();
    let mut misaligned_stations = 0;
    for log in &ingested.logs {
        let station = aggregate_station(log.station.code, &log.readings, config.granularity, Some(&filter));
        if station.misaligned_start {
            misaligned_stations += 1;
        }
        windows.extend(station.windows);
    }
    let merged = merge_by_zone(&windows);
    log::info!(
        target: DataSource::History.target(),
        "{} windows from {} stations merged into {} zones",
        windows.len(),
        ingested.station_count(),
        merged.len()
    );

    checkpoint(control, "matching zones")?;
    let associated = associate_historical(&zones, &merged, &request);

    let mut summary = finish(&label, &associated, susceptibility, sink, control)?;
    summary.stations_ingested = ingested.station_count();
    summary.files_rejected = ingested.rejected;
    summary.misaligned_stations = misaligned_stations;
    Ok(summary)
}

/// Shared tail: classify, hand off, summarize.
fn finish(
    label: &str,
    associated: &[AssociatedZone],
    susceptibility: &dyn SusceptibilitySource,
    sink: &mut dyn ClassifiedZoneSink,
    control: &dyn RunControl,
) -> Result<RunSummary, RunError> {
    checkpoint(control, "classifying")?;
    let areas = susceptibility.areas()?;
    let outcome = classify_areas(associated, &areas);

    checkpoint(control, "writing output")?;
    sink.write(label, &outcome.classified).map_err(RunError::Sink)?;

    let summary = RunSummary {
        label: label.to_string(),
        zones: associated.len(),
        zones_with_data: associated.iter().filter(|z| z.has_data).count(),
        classified: outcome.classified.len(),
        skipped_low: outcome.skipped_low,
        invalid_areas: outcome.rejected.len(),
        ..RunSummary::default()
    };
    log::info!(
        target: TARGET,
        "run {} done: {}/{} zones with data, {} areas classified",
        summary.label,
        summary.zones_with_data,
        summary.zones,
        summary.classified
    );
    Ok(summary)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
