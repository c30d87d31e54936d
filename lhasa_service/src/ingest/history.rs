/// Historical rain log ingestion.
///
/// Each station exports one fixed-width text file per month, named
/// `<stationToken>_<YYYYMM>_<suffix>.txt`. This module resolves every file
/// in a directory to a catalogued station, parses its lines into
/// `RainReading`s and reports the files it could not use so that the caller
/// can quarantine them. See `fixtures.rs` for an annotated example file.
///
/// No single file or line aborts ingestion. Bad lines are skipped or
/// zero-filled and logged; bad files are returned as `FileRejection`s.

use chrono::NaiveDateTime;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::logging::{DataSource, log_run_summary};
use crate::model::{LineParseError, RainReading};
use crate::period::LogPeriod;
use crate::stations::{Lookup, StationDefinition, lookup};

/// Lines of header text preceding the readings in every log.
pub const HEADER_LINES: usize = 5;

/// Width of the leading date/time block, in characters.
pub const DATETIME_BLOCK_WIDTH: usize = 26;

/// A collapsed value block shorter than this is treated as all zeros.
const MIN_VALUE_BLOCK_LEN: usize = 20;

const LINE_DATETIME_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// `DD/MM/YYYY HH:MM:SS`
const MIN_LINE_LEN: usize = 19;

const TARGET: &str = "history";

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("failed to list historical directory '{0}'")]
    ReadDir(PathBuf, #[source] std::io::Error),
}

/// Why a file was left out of the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectionReason {
    /// No catalog entry for the file's station token, or no token at all.
    StationNotFound,
    /// The file belongs to a different (year, month) than requested.
    OutOfPeriod,
    /// The file could not be read. Not a quarantine case.
    Unreadable(String),
}

impl RejectionReason {
    /// Code used when the caller moves the file aside, if it should.
    pub fn quarantine_code(&self) -> Option<&'static str> {
        match self {
            RejectionReason::StationNotFound => Some("STATION_NOT_FOUND"),
            RejectionReason::OutOfPeriod => Some("OUT_OF_PERIOD"),
            RejectionReason::Unreadable(_) => None,
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::StationNotFound => write!(f, "STATION_NOT_FOUND"),
            RejectionReason::OutOfPeriod => write!(f, "OUT_OF_PERIOD"),
            RejectionReason::Unreadable(msg) => write!(f, "UNREADABLE ({})", msg),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRejection {
    pub path: PathBuf,
    pub reason: RejectionReason,
}

/// All readings of one log file, resolved to its station.
#[derive(Debug, Clone)]
pub struct StationLog {
    pub station: &'static StationDefinition,
    pub period: LogPeriod,
    pub path: PathBuf,
    /// In file order.
    pub readings: Vec<RainReading>,
    /// Lines dropped because their date/time could not be parsed.
    pub skipped_lines: usize,
}

#[derive(Debug, Default)]
pub struct IngestOutcome {
    /// Ordered by file path.
    pub logs: Vec<StationLog>,
    pub rejected: Vec<FileRejection>,
}

impl IngestOutcome {
    /// Number of distinct stations with at least one ingested file.
    pub fn station_count(&self) -> usize {
        let mut codes: Vec<u32> = self.logs.iter().map(|l| l.station.code).collect();
        codes.sort_unstable();
        codes.dedup();
        codes.len()
    }
}

// ---------------------------------------------------------------------------
// File names
// ---------------------------------------------------------------------------

/// Splits `<stationToken>_<YYYYMM>_<suffix>[.txt]` from the right, so the
/// token may itself contain underscores.
///
/// Returns `None` when the name has fewer than three segments or the
/// period segment is not a valid `YYYYMM`.
pub fn parse_file_name(file_name: &str) -> Option<(&str, LogPeriod)> {
    let stem = Path::new(file_name).file_stem()?.to_str()?;
    let mut parts = stem.rsplitn(3, '_');
    let _suffix = parts.next()?;
    let period = LogPeriod::parse(parts.next()?)?;
    let token = parts.next()?;
    if token.is_empty() {
        return None;
    }
    Some((token, period))
}

/// Resolves a file to its station, then checks its period.
pub fn resolve_file(
    file_name: &str,
    period: Option<LogPeriod>,
) -> Result<(&'static StationDefinition, LogPeriod), RejectionReason> {
    let (token, file_period) = parse_file_name(file_name).ok_or(RejectionReason::StationNotFound)?;
    let station =
        lookup(Lookup::ByFileToken(token)).map_err(|_| RejectionReason::StationNotFound)?;
    match period {
        Some(wanted) if wanted != file_period => Err(RejectionReason::OutOfPeriod),
        _ => Ok((station, file_period)),
    }
}

// ---------------------------------------------------------------------------
// Line parsing
// ---------------------------------------------------------------------------

fn collapse_spaces(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn parse_value(line_no: usize, field: &str, raw: Option<&str>) -> f64 {
    let Some(raw) = raw else {
        log::warn!(target: TARGET, "line {}: missing {} value, using 0.0", line_no, field);
        return 0.0;
    };
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => v,
        _ => {
            log::warn!(target: TARGET, "line {}: invalid {} value '{}', using 0.0", line_no, field, raw);
            0.0
        }
    }
}

/// Parses one data line. `line_no` is 1-based and only used for messages.
///
/// The first 26 characters hold the date and time; the remainder holds the
/// five window values. `ND` reads as `0.0`, and a value block too short to
/// hold five numbers reads as all zeros.
pub fn parse_line(line_no: usize, line: &str) -> Result<RainReading, LineParseError> {
    let line = line.trim_end_matches(['\r', '\n']);
    let len = line.chars().count();
    if len < MIN_LINE_LEN {
        return Err(LineParseError::TooShort { line: line_no, len });
    }

    let split_at = line
        .char_indices()
        .nth(DATETIME_BLOCK_WIDTH)
        .map(|(i, _)| i)
        .unwrap_or(line.len());
    let (datetime_block, value_block) = line.split_at(split_at);

    let datetime = collapse_spaces(datetime_block);
    let measured_at = NaiveDateTime::parse_from_str(&datetime, LINE_DATETIME_FORMAT).map_err(|_| {
        LineParseError::InvalidDateTime {
            line: line_no,
            value: datetime.clone(),
        }
    })?;

    let values = collapse_spaces(value_block).replace("ND", "0.0");
    if values.len() < MIN_VALUE_BLOCK_LEN {
        return Ok(RainReading::zero(measured_at));
    }

    let mut fields = values.split(' ');
    Ok(RainReading {
        measured_at,
        m15: parse_value(line_no, "m15", fields.next()),
        h01: parse_value(line_no, "h01", fields.next()),
        h04: parse_value(line_no, "h04", fields.next()),
        h24: parse_value(line_no, "h24", fields.next()),
        h96: parse_value(line_no, "h96", fields.next()),
    })
}

/// Parses a whole log, skipping the header. Returns the readings and the
/// number of lines dropped.
pub fn parse_log(content: &str) -> (Vec<RainReading>, usize) {
    let mut readings = Vec::new();
    let mut skipped = 0;

    for (idx, line) in content.lines().enumerate().skip(HEADER_LINES) {
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(idx + 1, line) {
            Ok(reading) => readings.push(reading),
            Err(e) => {
                log::warn!(target: TARGET, "skipping {}", e);
                skipped += 1;
            }
        }
    }

    (readings, skipped)
}

// ---------------------------------------------------------------------------
// Directory ingestion
// ---------------------------------------------------------------------------

/// Ingests every `*.txt` log in `dir`, optionally restricted to one period.
///
/// # Errors
/// Only when the directory itself cannot be listed. Per-file problems are
/// returned in `IngestOutcome::rejected`.
pub fn ingest_directory(dir: &Path, period: Option<LogPeriod>) -> Result<IngestOutcome, HistoryError> {
    let entries = fs::read_dir(dir).map_err(|e| HistoryError::ReadDir(dir.to_path_buf(), e))?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .filter(|p| {
            p.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case("txt"))
        })
        .collect();
    paths.sort();

    log::info!(target: TARGET, "found {} historical log files in {}", paths.len(), dir.display());

    let mut outcome = IngestOutcome::default();
    for path in paths {
        match ingest_file(&path, period) {
            Ok(log) => {
                log::debug!(
                    target: TARGET,
                    "{} -> {} ({} readings)",
                    path.display(),
                    log.station.name,
                    log.readings.len()
                );
                outcome.logs.push(log);
            }
            Err(reason) => {
                match reason {
                    RejectionReason::OutOfPeriod => {
                        log::info!(target: TARGET, "ignoring {}: {}", path.display(), reason)
                    }
                    _ => log::error!(target: TARGET, "rejecting {}: {}", path.display(), reason),
                }
                outcome.rejected.push(FileRejection { path, reason });
            }
        }
    }

    let total = outcome.logs.len() + outcome.rejected.len();
    log_run_summary(
        DataSource::History,
        "historical files ingested",
        total,
        outcome.logs.len(),
        outcome.rejected.len(),
    );
    log::info!(target: TARGET, "resolved {} stations", outcome.station_count());

    Ok(outcome)
}

fn ingest_file(path: &Path, period: Option<LogPeriod>) -> Result<StationLog, RejectionReason> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or(RejectionReason::StationNotFound)?;
    let (station, file_period) = resolve_file(file_name, period)?;

    // Logs are produced by Windows tooling and are not always UTF-8.
    let bytes = fs::read(path).map_err(|e| RejectionReason::Unreadable(e.to_string()))?;
    let content = String::from_utf8_lossy(&bytes);
    let (readings, skipped_lines) = parse_log(&content);

    Ok(StationLog {
        station,
        period: file_period,
        path: path.to_path_buf(),
        readings,
        skipped_lines,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::fixtures::*;
    use chrono::NaiveDate;

    fn at(d: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, d)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    // --- File names -----------------------------------------------------------

    #[test]
    fn test_parse_file_name_splits_from_the_right() {
        let (token, period) = parse_file_name("grajau_jacarepagua_202401_Met.txt")
            .expect("valid name should parse");
        assert_eq!(token, "grajau_jacarepagua");
        assert_eq!(period, LogPeriod { year: 2024, month: 1 });

        let (token, _) = parse_file_name("tijuca_202312_x.txt").unwrap();
        assert_eq!(token, "tijuca", "suffix length must not matter");
    }

    #[test]
    fn test_parse_file_name_rejects_malformed_names() {
        assert!(parse_file_name("tijuca.txt").is_none());
        assert!(parse_file_name("tijuca_2024_Met.txt").is_none());
        assert!(parse_file_name("_202401_Met.txt").is_none());
    }

    #[test]
    fn test_resolve_checks_station_before_period() {
        let wanted = Some(LogPeriod { year: 2024, month: 1 });
        assert_eq!(
            resolve_file("atlantis_202312_Met.txt", wanted).unwrap_err(),
            RejectionReason::StationNotFound,
            "unknown station reported even though the period also mismatches"
        );
        assert_eq!(
            resolve_file("tijuca_202312_Met.txt", wanted).unwrap_err(),
            RejectionReason::OutOfPeriod
        );
        let (station, _) = resolve_file("TIJUCA_202401_Met.txt", wanted).unwrap();
        assert_eq!(station.code, 4);
    }

    #[test]
    fn test_quarantine_codes() {
        assert_eq!(RejectionReason::StationNotFound.quarantine_code(), Some("STATION_NOT_FOUND"));
        assert_eq!(RejectionReason::OutOfPeriod.quarantine_code(), Some("OUT_OF_PERIOD"));
        assert_eq!(RejectionReason::Unreadable("denied".into()).quarantine_code(), None);
    }

    // --- Lines ----------------------------------------------------------------

    #[test]
    fn test_parse_line_reads_all_five_windows() {
        let reading = parse_line(6, "01/01/2024 10:30:00             8.2   22.8   25.4   57.8   92.8")
            .expect("line should parse");
        assert_eq!(reading.measured_at, at(1, 10, 30));
        assert_eq!(reading.m15, 8.2);
        assert_eq!(reading.h01, 22.8);
        assert_eq!(reading.h04, 25.4);
        assert_eq!(reading.h24, 57.8);
        assert_eq!(reading.h96, 92.8);
    }

    #[test]
    fn test_nd_reads_as_zero() {
        let reading =
            parse_line(6, "01/01/2024 10:30:00            ND   22.8   25.4   57.8   92.8").unwrap();
        assert_eq!(reading.m15, 0.0);
        assert_eq!(reading.h01, 22.8);
    }

    #[test]
    fn test_nd_in_first_column_keeps_other_windows() {
        let reading =
            parse_line(6, "01/01/2024 10:45:00         ND 80.0 120.0 190.0 0.0").unwrap();
        assert_eq!(reading.measured_at, at(1, 10, 45));
        assert_eq!(reading.m15, 0.0);
        assert_eq!(reading.h01, 80.0);
        assert_eq!(reading.h04, 120.0);
        assert_eq!(reading.h24, 190.0);
        assert_eq!(reading.h96, 0.0);
    }

    #[test]
    fn test_short_value_block_reads_as_zeros() {
        let reading = parse_line(6, "01/01/2024 10:30:00           1.0 1.0").unwrap();
        assert_eq!(reading, RainReading::zero(at(1, 10, 30)));

        let reading = parse_line(6, "01/01/2024 10:30:00").unwrap();
        assert_eq!(reading, RainReading::zero(at(1, 10, 30)), "no value block at all");
    }

    #[test]
    fn test_negative_and_garbage_values_read_as_zero() {
        let reading =
            parse_line(6, "01/01/2024 10:30:00             -1.0   abc   25.4   57.8   92.8").unwrap();
        assert_eq!(reading.m15, 0.0);
        assert_eq!(reading.h01, 0.0);
        assert_eq!(reading.h04, 25.4);
    }

    #[test]
    fn test_invalid_datetime_is_an_error() {
        let err = parse_line(9, "32/01/2024 10:30:00             1.0    2.0    3.0    4.0    5.0")
            .unwrap_err();
        assert!(matches!(err, LineParseError::InvalidDateTime { line: 9, .. }));

        let err = parse_line(10, "01/01/24").unwrap_err();
        assert!(matches!(err, LineParseError::TooShort { line: 10, .. }));
    }

    #[test]
    fn test_parse_log_skips_header_and_counts_bad_lines() {
        let (readings, skipped) = parse_log(fixture_tijuca_log());
        assert_eq!(readings.len(), 8);
        assert_eq!(skipped, 0);
        assert_eq!(readings[0].measured_at, at(1, 10, 0));
        assert_eq!(readings[5], RainReading::zero(at(1, 11, 15)), "ND line is all zeros");

        let (readings, skipped) = parse_log(fixture_misaligned_log());
        assert_eq!(readings.len(), 3);
        assert_eq!(skipped, 1);
        assert_eq!(readings[1].h01, 0.0, "negative value zeroed");
    }

    // --- Directories ----------------------------------------------------------

    #[test]
    fn test_ingest_directory_routes_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("tijuca_202401_Met.txt"), fixture_tijuca_log()).unwrap();
        fs::write(dir.path().join("tijuca_202312_Met.txt"), fixture_tijuca_log()).unwrap();
        fs::write(dir.path().join("atlantis_202401_Met.txt"), fixture_tijuca_log()).unwrap();
        fs::write(dir.path().join("notes.md"), "ignored").unwrap();

        let outcome = ingest_directory(dir.path(), Some(LogPeriod { year: 2024, month: 1 }))
            .expect("directory should be listable");

        assert_eq!(outcome.logs.len(), 1);
        assert_eq!(outcome.logs[0].station.code, 4);
        assert_eq!(outcome.logs[0].readings.len(), 8);
        assert_eq!(outcome.station_count(), 1);

        assert_eq!(outcome.rejected.len(), 2);
        let reasons: Vec<_> = outcome.rejected.iter().map(|r| r.reason.clone()).collect();
        assert!(reasons.contains(&RejectionReason::StationNotFound));
        assert!(reasons.contains(&RejectionReason::OutOfPeriod));
    }

    #[test]
    fn test_ingest_directory_without_period_keeps_every_month() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("urca_202401_a.txt"), fixture_tijuca_log()).unwrap();
        fs::write(dir.path().join("urca_202402_a.txt"), fixture_tijuca_log()).unwrap();

        let outcome = ingest_directory(dir.path(), None).unwrap();
        assert_eq!(outcome.logs.len(), 2);
        assert_eq!(outcome.station_count(), 1);
        assert!(outcome.rejected.is_empty());
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let result = ingest_directory(Path::new("/nonexistent/history"), None);
        assert!(matches!(result, Err(HistoryError::ReadDir(_, _))));
    }
}
