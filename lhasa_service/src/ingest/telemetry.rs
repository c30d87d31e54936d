/// Live telemetry fetch with fallback.
///
/// The nowcast prefers INMET (station list, then one detail call per
/// station) and falls back to the legacy municipal bulk endpoint when the
/// INMET station list cannot be used. Per-station detail calls run on a
/// bounded thread pool and each carries its own timeout; a failing station
/// is logged and left out, it never fails the fetch.
///
/// HTTP goes through the `HttpTransport` trait so the whole fetch can be
/// exercised without a network.

use chrono::{NaiveDate, NaiveDateTime};
use std::sync::{Arc, mpsc};
use std::time::Duration;
use threadpool::ThreadPool;

use crate::analysis::matching::match_station;
use crate::config::{NormalizerKind, TelemetryConfig};
use crate::ingest::inmet::{self, InmetObservation, InmetStation};
use crate::ingest::legacy;
use crate::logging::{DataSource, log_run_summary, log_station_failure};
use crate::model::{LiveReading, TelemetryError, TelemetryRecord, Zone};

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Minimal blocking HTTP GET. Non-2xx statuses are returned as responses;
/// only transport failures and timeouts are errors.
pub trait HttpTransport: Send + Sync {
    fn get(&self, url: &str, timeout: Duration) -> Result<HttpResponse, TelemetryError>;
}

/// Production transport over `reqwest::blocking`.
pub struct ReqwestTransport {
    client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, TelemetryError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("lhasa_service/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TelemetryError::Transport {
                url: String::new(),
                message: e.to_string(),
            })?;
        Ok(ReqwestTransport { client })
    }
}

fn transport_error(url: &str, err: reqwest::Error) -> TelemetryError {
    if err.is_timeout() {
        TelemetryError::Timeout { url: url.to_string() }
    } else {
        TelemetryError::Transport {
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}

impl HttpTransport for ReqwestTransport {
    fn get(&self, url: &str, timeout: Duration) -> Result<HttpResponse, TelemetryError> {
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .timeout(timeout)
            .send()
            .map_err(|e| transport_error(url, e))?;

        let status = response.status().as_u16();
        let body = response.text().map_err(|e| transport_error(url, e))?;
        Ok(HttpResponse { status, body })
    }
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Turns a station's hourly INMET observations into window values.
///
/// INMET reports one hourly accumulation; every other window is a guess.
/// Each strategy makes exactly one kind of guess.
pub trait TelemetryNormalizer: Send + Sync {
    fn name(&self) -> &'static str;

    /// `None` when no observation reports rainfall.
    fn normalize(&self, observations: &[InmetObservation]) -> Option<LiveReading>;
}

fn latest_hourly_value(observations: &[InmetObservation]) -> Option<(NaiveDateTime, f64)> {
    let latest = inmet::latest_observation(observations)?;
    let rain = latest.rainfall()?.max(0.0);
    Some((latest.measured_at()?, rain))
}

/// h01 and h24 both take the latest hourly value; nothing else is known.
pub struct LatestHourly;

impl TelemetryNormalizer for LatestHourly {
    fn name(&self) -> &'static str {
        "latest_hourly"
    }

    fn normalize(&self, observations: &[InmetObservation]) -> Option<LiveReading> {
        let (at, c) = latest_hourly_value(observations)?;
        Some(LiveReading {
            collected_at: Some(at),
            h01: c,
            h24: c,
            ..LiveReading::default()
        })
    }
}

/// Assumes the latest hourly rate held for the whole of every window.
pub struct LinearExtrapolation;

impl TelemetryNormalizer for LinearExtrapolation {
    fn name(&self) -> &'static str {
        "linear_extrapolation"
    }

    fn normalize(&self, observations: &[InmetObservation]) -> Option<LiveReading> {
        let (at, c) = latest_hourly_value(observations)?;
        Some(LiveReading {
            collected_at: Some(at),
            m15: c,
            h01: c,
            h02: 2.0 * c,
            h03: 3.0 * c,
            h04: 4.0 * c,
            h24: 24.0 * c,
            h96: 96.0 * c,
            month: 720.0 * c,
        })
    }
}

pub fn normalizer_for(kind: NormalizerKind) -> Arc<dyn TelemetryNormalizer> {
    match kind {
        NormalizerKind::LatestHourly => Arc::new(LatestHourly),
        NormalizerKind::LinearExtrapolation => Arc::new(LinearExtrapolation),
    }
}

// ---------------------------------------------------------------------------
// Fetcher
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TelemetrySourceKind {
    Primary,
    Legacy,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TelemetrySnapshot {
    pub source: TelemetrySourceKind,
    pub records: Vec<TelemetryRecord>,
}

pub struct LiveTelemetryFetcher<T: HttpTransport + 'static> {
    transport: Arc<T>,
    config: TelemetryConfig,
    normalizer: Arc<dyn TelemetryNormalizer>,
}

impl<T: HttpTransport + 'static> LiveTelemetryFetcher<T> {
    /// Uses the normalizer selected in `config`.
    pub fn new(transport: T, config: TelemetryConfig) -> Self {
        let normalizer = normalizer_for(config.normalizer);
        LiveTelemetryFetcher {
            transport: Arc::new(transport),
            config,
            normalizer,
        }
    }

    pub fn normalizer_name(&self) -> &'static str {
        self.normalizer.name()
    }

    /// Fetches current conditions for `zones` as of `now` (local time).
    ///
    /// # Errors
    /// `TelemetryError::AllSourcesFailed` when the primary path failed and
    /// the legacy endpoint failed too.
    pub fn fetch(&self, zones: &[Zone], now: NaiveDateTime) -> Result<TelemetrySnapshot, TelemetryError> {
        let primary_err = match self.fetch_primary(zones, now.date()) {
            Ok(records) => {
                return Ok(TelemetrySnapshot {
                    source: TelemetrySourceKind::Primary,
                    records,
                });
            }
            Err(e) => e,
        };

        log::warn!(
            target: DataSource::Inmet.target(),
            "primary telemetry unavailable ({}), falling back to legacy endpoint",
            primary_err
        );

        match self.fetch_legacy(now) {
            Ok(records) => {
                log::info!(
                    target: DataSource::Legacy.target(),
                    "loaded {} stations from legacy endpoint",
                    records.len()
                );
                Ok(TelemetrySnapshot {
                    source: TelemetrySourceKind::Legacy,
                    records,
                })
            }
            Err(legacy_err) => {
                log::error!(target: DataSource::Legacy.target(), "legacy endpoint failed: {}", legacy_err);
                Err(TelemetryError::AllSourcesFailed {
                    primary: primary_err.to_string(),
                    legacy: legacy_err.to_string(),
                })
            }
        }
    }

    /// INMET path. Fails only if the station list is unusable; individual
    /// stations that fail are logged and omitted.
    pub fn fetch_primary(&self, zones: &[Zone], today: NaiveDate) -> Result<Vec<TelemetryRecord>, TelemetryError> {
        let stations = self.fetch_station_list()?;
        let selected = self.stations_for_zones(zones, stations);
        if selected.is_empty() {
            log::warn!(target: DataSource::Inmet.target(), "no INMET station relates to any zone");
            return Ok(Vec::new());
        }

        let start = today - chrono::Duration::days(self.config.lookback_days);
        let pool = ThreadPool::new(self.config.worker_threads.clamp(1, selected.len()));
        let (tx, rx) = mpsc::channel();

        for (idx, station) in selected.iter().enumerate() {
            let url = inmet::build_station_data_url(
                &self.config.data_url,
                start,
                today,
                &station.code,
                self.config.token.as_deref(),
            );
            let transport = Arc::clone(&self.transport);
            let normalizer = Arc::clone(&self.normalizer);
            let timeout = self.config.timeout();
            let tx = tx.clone();

            pool.execute(move || {
                let result = fetch_station_data(transport.as_ref(), normalizer.as_ref(), &url, timeout);
                // The receiver outlives the pool; a send error means the
                // fetch was abandoned and the result is not needed.
                let _ = tx.send((idx, result));
            });
        }
        drop(tx);

        let mut results: Vec<(usize, Result<LiveReading, TelemetryError>)> = rx.iter().collect();
        pool.join();
        results.sort_by_key(|(idx, _)| *idx);

        let total = selected.len();
        let mut records = Vec::with_capacity(total);
        for (idx, result) in results {
            let station = &selected[idx];
            match result {
                Ok(reading) => records.push(TelemetryRecord {
                    code: Some(station.code.clone()),
                    name: station.name.clone(),
                    reading,
                }),
                Err(e) => log_station_failure(DataSource::Inmet, &station.code, "station data", &e),
            }
        }

        log_run_summary(
            DataSource::Inmet,
            "INMET stations loaded",
            total,
            records.len(),
            total - records.len(),
        );
        Ok(records)
    }

    fn fetch_station_list(&self) -> Result<Vec<InmetStation>, TelemetryError> {
        let url = &self.config.stations_url;
        let response = self.transport.get(url, self.config.timeout())?;
        if response.status == 204 {
            return Err(TelemetryError::NoData("INMET station list is empty".to_string()));
        }
        if !response.is_success() {
            return Err(TelemetryError::HttpStatus {
                url: url.clone(),
                status: response.status,
            });
        }

        let stations = inmet::parse_station_list(&response.body).map_err(|e| TelemetryError::Parse {
            url: url.clone(),
            message: e.to_string(),
        })?;
        let operating = inmet::select_operating(stations, &self.config.state);
        if operating.is_empty() {
            return Err(TelemetryError::NoData(format!(
                "no operating INMET stations in {}",
                self.config.state
            )));
        }

        log::info!(
            target: DataSource::Inmet.target(),
            "{} operating stations in {}",
            operating.len(),
            self.config.state
        );
        Ok(operating)
    }

    /// Stations matched by at least one zone, in first-match order, capped
    /// at `max_stations`.
    fn stations_for_zones(&self, zones: &[Zone], stations: Vec<InmetStation>) -> Vec<InmetStation> {
        let mut wanted: Vec<usize> = Vec::new();
        for zone in zones {
            if let Some(hit) = match_station(&zone.name, zone.code, &stations) {
                if let Some(idx) = stations.iter().position(|s| s.code == hit.code) {
                    if !wanted.contains(&idx) {
                        wanted.push(idx);
                    }
                }
            }
        }

        if wanted.len() > self.config.max_stations {
            log::warn!(
                target: DataSource::Inmet.target(),
                "{} stations match zones, only the first {} will be fetched",
                wanted.len(),
                self.config.max_stations
            );
            wanted.truncate(self.config.max_stations);
        }

        wanted.into_iter().map(|idx| stations[idx].clone()).collect()
    }

    /// Legacy bulk path.
    pub fn fetch_legacy(&self, now: NaiveDateTime) -> Result<Vec<TelemetryRecord>, TelemetryError> {
        let url = legacy::build_legacy_url(&self.config.legacy_url, now);
        log::info!(target: DataSource::Legacy.target(), "requesting {}", url);

        let response = self.transport.get(&url, self.config.legacy_timeout())?;
        if !response.is_success() {
            return Err(TelemetryError::HttpStatus {
                url,
                status: response.status,
            });
        }

        let records = legacy::parse_legacy_response(&response.body).map_err(|e| TelemetryError::Parse {
            url: url.clone(),
            message: e.to_string(),
        })?;
        if records.is_empty() {
            return Err(TelemetryError::NoData("legacy endpoint returned no stations".to_string()));
        }
        Ok(records)
    }
}

fn fetch_station_data(
    transport: &dyn HttpTransport,
    normalizer: &dyn TelemetryNormalizer,
    url: &str,
    timeout: Duration,
) -> Result<LiveReading, TelemetryError> {
    let response = transport.get(url, timeout)?;
    if response.status == 204 {
        return Err(TelemetryError::NoData(url.to_string()));
    }
    if !response.is_success() {
        return Err(TelemetryError::HttpStatus {
            url: url.to_string(),
            status: response.status,
        });
    }

    let observations = inmet::parse_station_data(&response.body).map_err(|e| TelemetryError::Parse {
        url: url.to_string(),
        message: e.to_string(),
    })?;

    normalizer
        .normalize(&observations)
        .ok_or_else(|| TelemetryError::NoData(url.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
