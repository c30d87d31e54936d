/// INMET automatic-station API client.
///
/// Handles URL construction and JSON parsing for the two INMET endpoints
/// the nowcast uses:
///   station list    https://apitempo.inmet.gov.br/estacoes/T
///   station data    https://apitempo.inmet.gov.br/estacao/{start}/{end}/{code}
///
/// INMET publishes hourly accumulations only; turning those into window
/// values is the normalizer's job (`telemetry.rs`). See `fixtures.rs` for
/// annotated payloads.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Deserialize;
use serde_json::Value;

use crate::ingest::json_number;

/// Value of `CD_SITUACAO` for stations currently reporting.
pub const STATUS_OPERATING: &str = "Operante";

// ---------------------------------------------------------------------------
// Serde structures
// ---------------------------------------------------------------------------

/// One entry of the station list.
#[derive(Debug, Clone, Deserialize)]
pub struct InmetStation {
    #[serde(rename = "CD_ESTACAO")]
    pub code: String,
    #[serde(rename = "DC_NOME")]
    pub name: String,
    #[serde(rename = "VL_LATITUDE", default)]
    latitude: Value,
    #[serde(rename = "VL_LONGITUDE", default)]
    longitude: Value,
    #[serde(rename = "SG_ESTADO", default)]
    pub state: Option<String>,
    #[serde(rename = "CD_SITUACAO", default)]
    pub status: Option<String>,
}

impl InmetStation {
    pub fn latitude(&self) -> Option<f64> {
        json_number(&self.latitude)
    }

    pub fn longitude(&self) -> Option<f64> {
        json_number(&self.longitude)
    }

    pub fn is_operating(&self) -> bool {
        self.status.as_deref() == Some(STATUS_OPERATING)
    }
}

/// One hourly observation of a station.
#[derive(Debug, Clone, Deserialize)]
pub struct InmetObservation {
    /// `YYYY-MM-DD`
    #[serde(rename = "DT_MEDICAO")]
    pub date: String,
    /// `HHMM`, UTC
    #[serde(rename = "HR_MEDICAO")]
    pub hour: String,
    /// Hourly rainfall (mm). String, number or null depending on the
    /// station firmware.
    #[serde(rename = "CHUVA", default)]
    rain: Value,
}

impl InmetObservation {
    pub fn measured_at(&self) -> Option<NaiveDateTime> {
        let date = NaiveDate::parse_from_str(self.date.trim(), "%Y-%m-%d").ok()?;
        let time = NaiveTime::parse_from_str(self.hour.trim(), "%H%M").ok()?;
        Some(date.and_time(time))
    }

    /// Reported rainfall, `None` when the hour has not been observed yet.
    pub fn rainfall(&self) -> Option<f64> {
        json_number(&self.rain)
    }
}

// ---------------------------------------------------------------------------
// URL construction
// ---------------------------------------------------------------------------

/// Builds the per-station data URL for an inclusive date range.
///
/// With a token, the authenticated form
/// `{base}/token/estacao/{start}/{end}/{code}/{token}` is used.
pub fn build_station_data_url(
    base_url: &str,
    start: NaiveDate,
    end: NaiveDate,
    station_code: &str,
    token: Option<&str>,
) -> String {
    let base = base_url.trim_end_matches('/');
    let start = start.format("%Y-%m-%d");
    let end = end.format("%Y-%m-%d");
    let code = urlencoding::encode(station_code.trim());

    match token {
        Some(token) => format!(
            "{}/token/estacao/{}/{}/{}/{}",
            base,
            start,
            end,
            code,
            urlencoding::encode(token)
        ),
        None => format!("{}/estacao/{}/{}/{}", base, start, end, code),
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

pub fn parse_station_list(json: &str) -> Result<Vec<InmetStation>, serde_json::Error> {
    serde_json::from_str(json)
}

/// Keeps operating stations of `state` (`SG_ESTADO`, case-insensitive).
pub fn select_operating(stations: Vec<InmetStation>, state: &str) -> Vec<InmetStation> {
    stations
        .into_iter()
        .filter(|s| s.is_operating())
        .filter(|s| {
            s.state
                .as_deref()
                .is_some_and(|st| st.trim().eq_ignore_ascii_case(state.trim()))
        })
        .collect()
}

/// Parses a station data response. An empty body means no data.
pub fn parse_station_data(json: &str) -> Result<Vec<InmetObservation>, serde_json::Error> {
    if json.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(json)
}

/// The most recent observation that actually reports rainfall.
pub fn latest_observation(observations: &[InmetObservation]) -> Option<&InmetObservation> {
    observations
        .iter()
        .filter(|o| o.rainfall().is_some())
        .filter_map(|o| o.measured_at().map(|at| (at, o)))
        .max_by_key(|(at, _)| *at)
        .map(|(_, o)| o)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
