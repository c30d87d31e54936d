/// Rolling-window maxima over one station's reading stream.
///
/// Readings arrive every 15 minutes, each carrying the rainfall accumulated
/// over five trailing windows (m15, h01, h04, h24, h96). For every
/// aggregation window (a day, an hour or a single quarter hour, per
/// `Granularity`) the aggregator keeps the largest value seen for each
/// field and when it was first seen.
///
/// State machine, per station:
///
/// ```text
///   Unseeded ──seed──▶ Accumulating ──close──▶ Flushed ──seed──▶ Accumulating …
/// ```
///
/// A reading on a seed boundary opens a window and seeds every maximum from
/// itself. A reading on a close boundary is applied, then the window is
/// finalized. A reading that arrives with no open window and off a seed
/// boundary opens a zero-valued window at its own timestamp; the station is
/// flagged as having a misaligned start.

use chrono::{NaiveDateTime, NaiveTime, Timelike};

use crate::config::Granularity;
use crate::model::{RainReading, WindowMaxima, WindowedMaximum};
use crate::period::WindowFilter;

const TARGET: &str = "history";

// ---------------------------------------------------------------------------
// Boundaries
// ---------------------------------------------------------------------------

/// Whether a reading at `time` opens a new window.
pub fn is_seed_boundary(granularity: Granularity, time: NaiveTime) -> bool {
    if time.second() != 0 {
        return false;
    }
    match granularity {
        Granularity::Day => time.hour() == 0 && time.minute() == 0,
        Granularity::Hour => time.minute() == 0,
        Granularity::QuarterHour => time.minute() % 15 == 0,
    }
}

/// Whether a reading at `time` is the last one of its window.
pub fn is_close_boundary(granularity: Granularity, time: NaiveTime) -> bool {
    if time.second() != 0 {
        return false;
    }
    match granularity {
        Granularity::Day => time.hour() == 23 && time.minute() == 45,
        Granularity::Hour => time.minute() == 45,
        Granularity::QuarterHour => time.minute() % 15 == 0,
    }
}

// ---------------------------------------------------------------------------
// Aggregator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum WindowState {
    Unseeded,
    Accumulating {
        start: NaiveDateTime,
        maxima: WindowMaxima,
    },
    Flushed,
}

#[derive(Debug, Clone)]
pub struct WindowAggregator {
    station_code: u32,
    granularity: Granularity,
    state: WindowState,
    misaligned_starts: usize,
}

impl WindowAggregator {
    pub fn new(station_code: u32, granularity: Granularity) -> Self {
        WindowAggregator {
            station_code,
            granularity,
            state: WindowState::Unseeded,
            misaligned_starts: 0,
        }
    }

    pub fn state(&self) -> &WindowState {
        &self.state
    }

    /// True once any window had to be zero-seeded.
    pub fn misaligned_start(&self) -> bool {
        self.misaligned_starts > 0
    }

    pub fn misaligned_starts(&self) -> usize {
        self.misaligned_starts
    }

    /// Feeds one reading. Returns the window it finalized, if any.
    pub fn push(&mut self, reading: &RainReading) -> Option<WindowedMaximum> {
        let time = reading.time();

        if is_seed_boundary(self.granularity, time) {
            if let WindowState::Accumulating { start, .. } = &self.state {
                log::warn!(
                    target: TARGET,
                    "station {}: window opened at {} never reached its close boundary, discarded",
                    self.station_code,
                    start
                );
            }
            self.state = WindowState::Accumulating {
                start: reading.measured_at,
                maxima: WindowMaxima::seeded_from(reading),
            };
        } else if let WindowState::Accumulating { maxima, .. } = &mut self.state {
            maxima.observe(reading);
        } else {
            self.misaligned_starts += 1;
            log::warn!(
                target: TARGET,
                "station {}: reading at {} is off a window boundary, starting from zero",
                self.station_code,
                reading.measured_at
            );
            let mut maxima = WindowMaxima::default();
            maxima.observe(reading);
            self.state = WindowState::Accumulating {
                start: reading.measured_at,
                maxima,
            };
        }

        if is_close_boundary(self.granularity, time) {
            if let WindowState::Accumulating { start, maxima } =
                std::mem::replace(&mut self.state, WindowState::Flushed)
            {
                return Some(WindowedMaximum {
                    station_code: self.station_code,
                    window_start: start,
                    maxima,
                });
            }
        }

        None
    }
}

/// Result of running one station's readings through an aggregator.
#[derive(Debug, Clone, PartialEq)]
pub struct StationWindows {
    pub windows: Vec<WindowedMaximum>,
    pub misaligned_start: bool,
}

/// Aggregates a station's readings, keeping only windows whose start lies
/// inside `filter` (all windows when `None`). Windows outside the filter are
/// still computed so that state carries correctly across them.
pub fn aggregate_station(
    station_code: u32,
    readings: &[RainReading],
    granularity: Granularity,
    filter: Option<&WindowFilter>,
) -> StationWindows {
    let mut aggregator = WindowAggregator::new(station_code, granularity);
    let windows = readings
        .iter()
        .filter_map(|r| aggregator.push(r))
        .filter(|w| filter.is_none_or(|f| f.contains(w.window_start)))
        .collect();

    StationWindows {
        windows,
        misaligned_start: aggregator.misaligned_start(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
