//! Core data types for the landslide danger nowcast service.
//!
//! This module defines the shared domain model imported by all other modules:
//! rainfall readings, window maxima, zones, danger levels and the error types
//! raised along the ingest → aggregate → classify chain. It contains no I/O.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Timestamp format used for `occurredAt`/`collectedAt` output fields.
pub const OUTPUT_DATETIME_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

// ---------------------------------------------------------------------------
// Window fields
// ---------------------------------------------------------------------------

/// The five accumulation windows tracked for historical data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WindowField {
    M15,
    H01,
    H04,
    H24,
    H96,
}

impl WindowField {
    pub const ALL: [WindowField; 5] = [
        WindowField::M15,
        WindowField::H01,
        WindowField::H04,
        WindowField::H24,
        WindowField::H96,
    ];

    pub fn label(self) -> &'static str {
        match self {
            WindowField::M15 => "m15",
            WindowField::H01 => "h01",
            WindowField::H04 => "h04",
            WindowField::H24 => "h24",
            WindowField::H96 => "h96",
        }
    }
}

// ---------------------------------------------------------------------------
// Reading types
// ---------------------------------------------------------------------------

/// One line of a historical rain log: accumulated rainfall (mm) over each
/// window, measured at `measured_at`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RainReading {
    pub measured_at: NaiveDateTime,
    pub m15: f64,
    pub h01: f64,
    pub h04: f64,
    pub h24: f64,
    pub h96: f64,
}

impl RainReading {
    pub fn zero(measured_at: NaiveDateTime) -> Self {
        RainReading {
            measured_at,
            m15: 0.0,
            h01: 0.0,
            h04: 0.0,
            h24: 0.0,
            h96: 0.0,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.measured_at.date()
    }

    pub fn time(&self) -> NaiveTime {
        self.measured_at.time()
    }

    pub fn value(&self, field: WindowField) -> f64 {
        match field {
            WindowField::M15 => self.m15,
            WindowField::H01 => self.h01,
            WindowField::H04 => self.h04,
            WindowField::H24 => self.h24,
            WindowField::H96 => self.h96,
        }
    }
}

/// Current conditions for one telemetry station, in the shape of the
/// legacy bulk endpoint (which is the richest of the two sources).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LiveReading {
    pub collected_at: Option<NaiveDateTime>,
    pub m15: f64,
    pub h01: f64,
    pub h02: f64,
    pub h03: f64,
    pub h04: f64,
    pub h24: f64,
    pub h96: f64,
    pub month: f64,
}

/// A normalized telemetry record, independent of which source produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryRecord {
    /// Provider station code, when the source exposes one.
    pub code: Option<String>,
    pub name: String,
    pub reading: LiveReading,
}

// ---------------------------------------------------------------------------
// Window maxima
// ---------------------------------------------------------------------------

/// Running maximum of a single window field and the moment it occurred.
///
/// `occurred_at` is `None` only for zero-seeded windows that never saw a
/// value above zero.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WindowMax {
    pub value: f64,
    pub occurred_at: Option<NaiveDateTime>,
}

impl WindowMax {
    pub fn seeded(value: f64, at: NaiveDateTime) -> Self {
        WindowMax {
            value,
            occurred_at: Some(at),
        }
    }

    /// Raises the maximum only on a strict increase; ties keep the earlier
    /// timestamp.
    pub fn observe(&mut self, value: f64, at: NaiveDateTime) {
        if value > self.value {
            self.value = value;
            self.occurred_at = Some(at);
        }
    }

    /// Order-independent combination: larger value wins, equal values keep
    /// the earlier timestamp, and a known timestamp beats an unknown one.
    pub fn combine(self, other: WindowMax) -> WindowMax {
        if other.value > self.value {
            return other;
        }
        if other.value < self.value {
            return self;
        }
        match (self.occurred_at, other.occurred_at) {
            (Some(mine), Some(theirs)) if theirs < mine => other,
            (None, Some(_)) => other,
            _ => self,
        }
    }
}

/// Per-field maxima for the five historical windows.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WindowMaxima {
    pub m15: WindowMax,
    pub h01: WindowMax,
    pub h04: WindowMax,
    pub h24: WindowMax,
    pub h96: WindowMax,
}

impl WindowMaxima {
    /// Seeds every field from a boundary reading.
    pub fn seeded_from(reading: &RainReading) -> Self {
        let at = reading.measured_at;
        WindowMaxima {
            m15: WindowMax::seeded(reading.m15, at),
            h01: WindowMax::seeded(reading.h01, at),
            h04: WindowMax::seeded(reading.h04, at),
            h24: WindowMax::seeded(reading.h24, at),
            h96: WindowMax::seeded(reading.h96, at),
        }
    }

    pub fn get(&self, field: WindowField) -> &WindowMax {
        match field {
            WindowField::M15 => &self.m15,
            WindowField::H01 => &self.h01,
            WindowField::H04 => &self.h04,
            WindowField::H24 => &self.h24,
            WindowField::H96 => &self.h96,
        }
    }

    pub fn get_mut(&mut self, field: WindowField) -> &mut WindowMax {
        match field {
            WindowField::M15 => &mut self.m15,
            WindowField::H01 => &mut self.h01,
            WindowField::H04 => &mut self.h04,
            WindowField::H24 => &mut self.h24,
            WindowField::H96 => &mut self.h96,
        }
    }

    pub fn observe(&mut self, reading: &RainReading) {
        for field in WindowField::ALL {
            self.get_mut(field)
                .observe(reading.value(field), reading.measured_at);
        }
    }

    pub fn combine(mut self, other: &WindowMaxima) -> WindowMaxima {
        for field in WindowField::ALL {
            let merged = self.get(field).combine(*other.get(field));
            *self.get_mut(field) = merged;
        }
        self
    }
}

/// Finalized maxima of one aggregation window for one station.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowedMaximum {
    pub station_code: u32,
    /// Timestamp of the reading that opened the window.
    pub window_start: NaiveDateTime,
    pub maxima: WindowMaxima,
}

// ---------------------------------------------------------------------------
// Zones
// ---------------------------------------------------------------------------

/// Opaque reference to a geometry owned by the external GIS layer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct GeometryHandle(pub String);

impl fmt::Display for GeometryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A pluviometric zone: the catchment served by one monitoring station.
#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    pub code: u32,
    /// Upper-case, diacritics stripped.
    pub name: String,
    pub address: String,
    pub geometry: GeometryHandle,
}

/// Rainfall attached to a zone by the associator.
#[derive(Debug, Clone, PartialEq)]
pub enum ZoneRainfall {
    Live(LiveReading),
    Historical(HistoricalMaxima),
}

impl ZoneRainfall {
    pub fn h01(&self) -> f64 {
        match self {
            ZoneRainfall::Live(r) => r.h01,
            ZoneRainfall::Historical(h) => h.maxima.h01.value,
        }
    }

    pub fn h24(&self) -> f64 {
        match self {
            ZoneRainfall::Live(r) => r.h24,
            ZoneRainfall::Historical(h) => h.maxima.h24.value,
        }
    }

    pub fn h96(&self) -> f64 {
        match self {
            ZoneRainfall::Live(r) => r.h96,
            ZoneRainfall::Historical(h) => h.maxima.h96.value,
        }
    }
}

/// Zone-level result of folding every window emitted for a station.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoricalMaxima {
    pub maxima: WindowMaxima,
    /// Requested day, e.g. `"01/01/2024"`.
    pub date_label: String,
    /// Requested hour range, e.g. `"08 a 20"`.
    pub hour_label: String,
    /// How many `WindowedMaximum` records were folded in.
    pub windows_merged: usize,
}

/// A zone joined with its rainfall, before susceptibility is considered.
#[derive(Debug, Clone, PartialEq)]
pub struct AssociatedZone {
    pub zone: Zone,
    pub rainfall: ZoneRainfall,
    /// False when no telemetry/history was found and zeros were attached.
    pub has_data: bool,
}

// ---------------------------------------------------------------------------
// Susceptibility and danger
// ---------------------------------------------------------------------------

/// Landslide susceptibility class of a geographic area (gridcode).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Susceptibility {
    Low = 1,
    Medium = 2,
    High = 3,
}

impl Susceptibility {
    pub fn gridcode(self) -> u8 {
        self as u8
    }

    /// Areas of risk are the only ones the pipeline classifies.
    pub fn is_area_of_risk(self) -> bool {
        matches!(self, Susceptibility::Medium | Susceptibility::High)
    }
}

impl TryFrom<i64> for Susceptibility {
    type Error = ClassificationError;

    fn try_from(gridcode: i64) -> Result<Self, Self::Error> {
        match gridcode {
            1 => Ok(Susceptibility::Low),
            2 => Ok(Susceptibility::Medium),
            3 => Ok(Susceptibility::High),
            other => Err(ClassificationError::InvalidSusceptibility(other)),
        }
    }
}

/// Landslide danger levels, in ascending order. The order is for display
/// only; levels are never aggregated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DangerLevel {
    None,
    Low,
    Moderate,
    High,
    VeryHigh,
    Critical,
}

impl DangerLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DangerLevel::None => "NONE",
            DangerLevel::Low => "LOW",
            DangerLevel::Moderate => "MODERATE",
            DangerLevel::High => "HIGH",
            DangerLevel::VeryHigh => "VERY_HIGH",
            DangerLevel::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for DangerLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One susceptibility polygon already intersected with a zone by the GIS.
#[derive(Debug, Clone, PartialEq)]
pub struct SusceptibilityArea {
    pub zone_code: u32,
    /// Raw gridcode as stored in the susceptibility layer.
    pub gridcode: i64,
    pub geometry: GeometryHandle,
}

/// Terminal artifact of the core, handed to the external sink.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedZone {
    pub zone: Zone,
    pub rainfall: ZoneRainfall,
    pub susceptibility: Susceptibility,
    pub area: GeometryHandle,
    pub danger_level: DangerLevel,
}

// ---------------------------------------------------------------------------
// Output record
// ---------------------------------------------------------------------------

/// Per-window timestamps of the historical maxima.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OccurredAt {
    pub m15: Option<String>,
    pub h01: Option<String>,
    pub h04: Option<String>,
    pub h24: Option<String>,
    pub h96: Option<String>,
}

/// Flat record with the field set the GIS layer consumer expects.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneOutput {
    pub code: u32,
    pub name: String,
    pub address: String,
    pub collected_at: Option<String>,
    pub m15: f64,
    pub h01: f64,
    pub h02: f64,
    pub h03: f64,
    pub h04: f64,
    pub h24: f64,
    pub h96: f64,
    pub month_total: f64,
    pub danger_level: DangerLevel,
    pub susceptibility: u8,
    pub area: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub occurred_at: Option<OccurredAt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hour_label: Option<String>,
}

fn format_instant(at: Option<NaiveDateTime>) -> Option<String> {
    at.map(|dt| dt.format(OUTPUT_DATETIME_FORMAT).to_string())
}

impl From<&ClassifiedZone> for ZoneOutput {
    fn from(classified: &ClassifiedZone) -> Self {
        let zone = &classified.zone;
        let mut output = ZoneOutput {
            code: zone.code,
            name: zone.name.clone(),
            address: zone.address.clone(),
            collected_at: None,
            m15: 0.0,
            h01: 0.0,
            h02: 0.0,
            h03: 0.0,
            h04: 0.0,
            h24: 0.0,
            h96: 0.0,
            month_total: 0.0,
            danger_level: classified.danger_level,
            susceptibility: classified.susceptibility.gridcode(),
            area: classified.area.0.clone(),
            occurred_at: None,
            date_label: None,
            hour_label: None,
        };

        match &classified.rainfall {
            ZoneRainfall::Live(r) => {
                output.collected_at = format_instant(r.collected_at);
                output.m15 = r.m15;
                output.h01 = r.h01;
                output.h02 = r.h02;
                output.h03 = r.h03;
                output.h04 = r.h04;
                output.h24 = r.h24;
                output.h96 = r.h96;
                output.month_total = r.month;
            }
            ZoneRainfall::Historical(h) => {
                let m = &h.maxima;
                output.m15 = m.m15.value;
                output.h01 = m.h01.value;
                output.h04 = m.h04.value;
                output.h24 = m.h24.value;
                output.h96 = m.h96.value;
                output.occurred_at = Some(OccurredAt {
                    m15: format_instant(m.m15.occurred_at),
                    h01: format_instant(m.h01.occurred_at),
                    h04: format_instant(m.h04.occurred_at),
                    h24: format_instant(m.h24.occurred_at),
                    h96: format_instant(m.h96.occurred_at),
                });
                output.date_label = Some(h.date_label.clone());
                output.hour_label = Some(h.hour_label.clone());
            }
        }

        output
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// No catalog entry matched the requested code, name or file token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("station not found: {0}")]
pub struct StationNotFound(pub String);

/// A historical log line that could not be turned into a reading.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineParseError {
    #[error("line {line}: too short for the date/time block ({len} chars)")]
    TooShort { line: usize, len: usize },
    #[error("line {line}: invalid date/time '{value}'")]
    InvalidDateTime { line: usize, value: String },
}

/// Errors from the live telemetry services.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TelemetryError {
    #[error("HTTP error {status} from {url}")]
    HttpStatus { url: String, status: u16 },
    #[error("request to {url} timed out")]
    Timeout { url: String },
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },
    #[error("parse error from {url}: {message}")]
    Parse { url: String, message: String },
    #[error("no data available: {0}")]
    NoData(String),
    #[error("all telemetry sources failed (primary: {primary}; legacy: {legacy})")]
    AllSourcesFailed { primary: String, legacy: String },
}

/// A susceptibility value the danger matrix does not define.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassificationError {
    #[error("susceptibility gridcode {0} is outside 1..=3")]
    InvalidSusceptibility(i64),
}

/// A malformed historical request; rejected before any ingestion begins.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("invalid date '{0}', expected DD/MM/YYYY")]
    InvalidDateFormat(String),
    #[error("invalid time '{0}', expected HH:MM:SS")]
    InvalidTimeFormat(String),
    #[error("historical request must stay within one year ({from} vs {to})")]
    YearMismatch { from: i32, to: i32 },
    #[error("historical request must stay within one month ({from} vs {to})")]
    MonthMismatch { from: u32, to: u32 },
    #[error("historical request must stay within one day ({from} vs {to})")]
    DayMismatch { from: u32, to: u32 },
    #[error("start hour {from:02} must be before end hour {to:02}")]
    HourOrder { from: u32, to: u32 },
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_observe_keeps_earlier_timestamp_on_tie() {
        let mut max = WindowMax::seeded(10.0, at(10, 0));
        max.observe(10.0, at(10, 15));
        assert_eq!(max.occurred_at, Some(at(10, 0)));

        max.observe(12.5, at(10, 30));
        assert_eq!(max.value, 12.5);
        assert_eq!(max.occurred_at, Some(at(10, 30)));
    }

    #[test]
    fn test_combine_prefers_earlier_timestamp_regardless_of_order() {
        let early = WindowMax::seeded(5.0, at(9, 0));
        let late = WindowMax::seeded(5.0, at(11, 0));
        assert_eq!(early.combine(late), early);
        assert_eq!(late.combine(early), early);
    }

    #[test]
    fn test_combine_known_timestamp_beats_unknown_at_equal_value() {
        let unseeded = WindowMax::default();
        let seen = WindowMax::seeded(0.0, at(8, 0));
        assert_eq!(unseeded.combine(seen), seen);
        assert_eq!(seen.combine(unseeded), seen);
    }

    #[test]
    fn test_susceptibility_rejects_unknown_gridcode() {
        assert_eq!(Susceptibility::try_from(3), Ok(Susceptibility::High));
        assert_eq!(
            Susceptibility::try_from(4),
            Err(ClassificationError::InvalidSusceptibility(4))
        );
        assert_eq!(
            Susceptibility::try_from(0),
            Err(ClassificationError::InvalidSusceptibility(0))
        );
    }

    #[test]
    fn test_danger_levels_are_ordered_for_display() {
        assert!(DangerLevel::None < DangerLevel::Low);
        assert!(DangerLevel::Low < DangerLevel::Moderate);
        assert!(DangerLevel::High < DangerLevel::VeryHigh);
        assert!(DangerLevel::VeryHigh < DangerLevel::Critical);
    }

    #[test]
    fn test_danger_level_serializes_in_screaming_case() {
        let json = serde_json::to_string(&DangerLevel::VeryHigh).unwrap();
        assert_eq!(json, "\"VERY_HIGH\"");
    }

    #[test]
    fn test_historical_output_carries_occurred_at() {
        let reading = RainReading {
            measured_at: at(10, 0),
            m15: 1.0,
            h01: 2.0,
            h04: 3.0,
            h24: 4.0,
            h96: 5.0,
        };
        let classified = ClassifiedZone {
            zone: Zone {
                code: 4,
                name: "TIJUCA".to_string(),
                address: "".to_string(),
                geometry: GeometryHandle("pz-4".to_string()),
            },
            rainfall: ZoneRainfall::Historical(HistoricalMaxima {
                maxima: WindowMaxima::seeded_from(&reading),
                date_label: "01/01/2024".to_string(),
                hour_label: "08 a 20".to_string(),
                windows_merged: 1,
            }),
            susceptibility: Susceptibility::High,
            area: GeometryHandle("sz-9".to_string()),
            danger_level: DangerLevel::Low,
        };

        let output = ZoneOutput::from(&classified);
        assert_eq!(output.h96, 5.0);
        assert_eq!(output.susceptibility, 3);
        let occurred = output.occurred_at.expect("historical output has timestamps");
        assert_eq!(occurred.h01.as_deref(), Some("01/01/2024 10:00:00"));

        let json = serde_json::to_value(ZoneOutput::from(&classified)).unwrap();
        assert_eq!(json["dangerLevel"], "LOW");
        assert!(json.get("monthTotal").is_some());
        assert!(json.get("occurredAt").is_some());
    }
}
