/// Legacy municipal rain-gauge endpoint, used as the nowcast fallback.
///
/// One call returns every gauge of the city network:
///   http://websempre.rio.rj.gov.br/json/chuvas?queryTime=YYYYMMDD_HHMM
///
/// Unlike INMET, this source already reports every accumulation window, so
/// records map directly onto `LiveReading` without normalization.

use chrono::NaiveDateTime;
use serde::Deserialize;
use serde_json::Value;

use crate::ingest::json_number;
use crate::model::{LiveReading, TelemetryRecord};

// ---------------------------------------------------------------------------
// Serde structures
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct LegacyResponse {
    objects: Vec<LegacyObject>,
}

#[derive(Deserialize)]
struct LegacyObject {
    name: String,
    #[serde(default)]
    read_at: Option<String>,
    #[serde(default)]
    data: LegacyData,
}

#[derive(Deserialize, Default)]
struct LegacyData {
    #[serde(default)]
    m15: Value,
    #[serde(default)]
    h01: Value,
    #[serde(default)]
    h02: Value,
    #[serde(default)]
    h03: Value,
    #[serde(default)]
    h04: Value,
    #[serde(default)]
    h24: Value,
    #[serde(default)]
    h96: Value,
    #[serde(default)]
    mes: Value,
}

// ---------------------------------------------------------------------------
// URL construction
// ---------------------------------------------------------------------------

/// Appends `queryTime=YYYYMMDD_HHMM` for `now` to the bulk endpoint.
pub fn build_legacy_url(base_url: &str, now: NaiveDateTime) -> String {
    let separator = if base_url.contains('?') { '&' } else { '?' };
    format!("{}{}queryTime={}", base_url, separator, now.format("%Y%m%d_%H%M"))
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// `read_at` carries an offset and sometimes fractional seconds; only the
/// leading `YYYY-MM-DDTHH:MM:SS` is used.
fn parse_read_at(read_at: Option<&str>) -> Option<NaiveDateTime> {
    let raw = read_at?.trim();
    let head = raw.get(..19)?;
    NaiveDateTime::parse_from_str(head, "%Y-%m-%dT%H:%M:%S").ok()
}

fn value_or_zero(value: &Value) -> f64 {
    json_number(value).filter(|v| *v >= 0.0).unwrap_or(0.0)
}

/// Reshapes a bulk response into telemetry records, one per gauge.
pub fn parse_legacy_response(json: &str) -> Result<Vec<TelemetryRecord>, serde_json::Error> {
    let response: LegacyResponse = serde_json::from_str(json)?;

    let records = response
        .objects
        .into_iter()
        .map(|obj| {
            let collected_at = parse_read_at(obj.read_at.as_deref());
            if collected_at.is_none() {
                log::debug!(target: "legacy", "{}: no usable read_at", obj.name);
            }
            let d = &obj.data;
            TelemetryRecord {
                code: None,
                reading: LiveReading {
                    collected_at,
                    m15: value_or_zero(&d.m15),
                    h01: value_or_zero(&d.h01),
                    h02: value_or_zero(&d.h02),
                    h03: value_or_zero(&d.h03),
                    h04: value_or_zero(&d.h04),
                    h24: value_or_zero(&d.h24),
                    h96: value_or_zero(&d.h96),
                    month: value_or_zero(&d.mes),
                },
                name: obj.name,
            }
        })
        .collect();

    Ok(records)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
