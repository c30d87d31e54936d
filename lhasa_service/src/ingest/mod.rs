/// Data ingestion for the landslide danger service.
///
/// Submodules:
/// - `history`: monthly per-station rain logs on disk
/// - `inmet`: INMET station list and hourly data API
/// - `legacy`: municipal bulk rain-gauge endpoint (fallback)
/// - `telemetry`: live fetch orchestration over both APIs
/// - `fixtures`: representative payloads, test only

pub mod history;
pub mod inmet;
pub mod legacy;
pub mod telemetry;

#[cfg(test)]
pub(crate) mod fixtures;

use serde_json::Value;

/// Reads a rainfall or coordinate value that may arrive as a JSON number,
/// a string (possibly with a decimal comma) or null.
///
/// Non-finite values are rejected. Negative values are accepted here;
/// coordinates are negative in this hemisphere.
pub(crate) fn json_number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                None
            } else {
                s.replace(',', ".").parse::<f64>().ok()
            }
        }
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}
