//! Historical request validation.
//!
//! A historical cast covers one day, an inclusive hour range within it, and
//! therefore exactly one monthly log period. Requests are validated in full
//! before any file is touched.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::model::RequestError;

/// Year and month of a monthly log file (`<token>_<YYYYMM>_<suffix>`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LogPeriod {
    pub year: i32,
    pub month: u32,
}

impl LogPeriod {
    /// Parses the `YYYYMM` segment of a log file name.
    pub fn parse(segment: &str) -> Option<Self> {
        if segment.len() != 6 || !segment.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let year = segment[..4].parse().ok()?;
        let month = segment[4..].parse().ok()?;
        if !(1..=12).contains(&month) {
            return None;
        }
        Some(LogPeriod { year, month })
    }
}

/// Which finalized windows a historical cast keeps. Bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowFilter {
    pub period: LogPeriod,
    pub day_from: u32,
    pub day_to: u32,
    pub hour_from: u32,
    pub hour_to: u32,
}

impl WindowFilter {
    pub fn contains(&self, window_start: NaiveDateTime) -> bool {
        window_start.year() == self.period.year
            && window_start.month() == self.period.month
            && (self.day_from..=self.day_to).contains(&window_start.day())
            && (self.hour_from..=self.hour_to).contains(&window_start.hour())
    }
}

/// A validated historical request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoricalRequest {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl HistoricalRequest {
    /// Validates `DD/MM/YYYY` dates and `HH:MM:SS` times.
    ///
    /// # Errors
    /// Any format problem, a range spanning more than one day, or a start
    /// hour that is not before the end hour. Hour 23 may start and end the
    /// same request so the last hour of the day stays reachable.
    pub fn parse(
        start_date: &str,
        end_date: &str,
        start_time: &str,
        end_time: &str,
    ) -> Result<Self, RequestError> {
        let from = parse_date(start_date)?;
        let to = parse_date(end_date)?;
        let t_from = parse_time(start_time)?;
        let t_to = parse_time(end_time)?;

        if from.year() != to.year() {
            return Err(RequestError::YearMismatch { from: from.year(), to: to.year() });
        }
        if from.month() != to.month() {
            return Err(RequestError::MonthMismatch { from: from.month(), to: to.month() });
        }
        if from.day() != to.day() {
            return Err(RequestError::DayMismatch { from: from.day(), to: to.day() });
        }

        let (h_from, h_to) = (t_from.hour(), t_to.hour());
        if h_from > h_to || (h_from == h_to && h_from < 23) {
            return Err(RequestError::HourOrder { from: h_from, to: h_to });
        }

        Ok(HistoricalRequest { date: from, start_time: t_from, end_time: t_to })
    }

    pub fn period(&self) -> LogPeriod {
        LogPeriod { year: self.date.year(), month: self.date.month() }
    }

    pub fn window_filter(&self) -> WindowFilter {
        WindowFilter {
            period: self.period(),
            day_from: self.date.day(),
            day_to: self.date.day(),
            hour_from: self.start_time.hour(),
            hour_to: self.end_time.hour(),
        }
    }

    /// `DD/MM/YYYY`, as carried on historical output rows.
    pub fn date_label(&self) -> String {
        self.date.format("%d/%m/%Y").to_string()
    }

    /// `HH a HH`, as carried on historical output rows.
    pub fn hour_label(&self) -> String {
        format!("{:02} a {:02}", self.start_time.hour(), self.end_time.hour())
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, RequestError> {
    let trimmed = value.trim();
    if trimmed.len() != 10 || trimmed.matches('/').count() != 2 {
        return Err(RequestError::InvalidDateFormat(value.to_string()));
    }
    NaiveDate::parse_from_str(trimmed, "%d/%m/%Y")
        .map_err(|_| RequestError::InvalidDateFormat(value.to_string()))
}

fn parse_time(value: &str) -> Result<NaiveTime, RequestError> {
    let trimmed = value.trim();
    if trimmed.matches(':').count() != 2 {
        return Err(RequestError::InvalidTimeFormat(value.to_string()));
    }
    NaiveTime::parse_from_str(trimmed, "%H:%M:%S")
        .map_err(|_| RequestError::InvalidTimeFormat(value.to_string()))
}

/// Label for a run started at `now`: `YYYYMMDD_HHmm00`, minutes floored to
/// the quarter hour they belong to (0–15 → 00, 16–30 → 15, 31–45 → 30,
/// otherwise 45).
pub fn run_label(now: NaiveDateTime) -> String {
    let quarter = match now.minute() {
        0..=15 => 0,
        16..=30 => 15,
        31..=45 => 30,
        _ => 45,
    };
    format!("{}{:02}00", now.format("%Y%m%d_%H"), quarter)
}
