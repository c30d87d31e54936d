/// Station matching between zones and telemetry sources.
///
/// Zone names come from the GIS, telemetry names from whichever API
/// answered, and the two were never curated against each other. Matching
/// therefore runs three passes over the candidates, first hit wins:
///
/// 1. exact equality of normalized names
/// 2. the candidate's normalized name contains the zone's
/// 3. the candidate's code equals the zone code
///
/// A handful of zones are spelled too differently from their gauge for any
/// of these to work; `ZONE_ALIASES` rewrites those before matching.

use crate::ingest::inmet::InmetStation;
use crate::model::TelemetryRecord;
use crate::zones::normalize_name;

/// Zone name (normalized) → name used by the telemetry network.
pub static ZONE_ALIASES: &[(&str, &str)] = &[
    ("BARRA/RIO CENTRO", "Barra/Riocentro"),
    ("ESTRADA GRAJAU/JACAREPAGUA", "Est. Grajau/Jacarepagua"),
    ("BARRA/ITANHANGA", "Barra/Barrinha"),
];

// ---------------------------------------------------------------------------
// Candidates
// ---------------------------------------------------------------------------

/// Anything a zone can be matched against.
pub trait StationIdentity {
    fn station_name(&self) -> &str;
    fn station_code(&self) -> Option<&str>;
}

impl StationIdentity for TelemetryRecord {
    fn station_name(&self) -> &str {
        &self.name
    }

    fn station_code(&self) -> Option<&str> {
        self.code.as_deref()
    }
}

impl StationIdentity for InmetStation {
    fn station_name(&self) -> &str {
        &self.name
    }

    fn station_code(&self) -> Option<&str> {
        Some(&self.code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Exact,
    Substring,
    Code,
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// Normalized name to look for in telemetry for a zone, alias applied.
pub fn telemetry_name_for(zone_name: &str) -> String {
    let normalized = normalize_name(zone_name);
    ZONE_ALIASES
        .iter()
        .find(|(zone, _)| *zone == normalized)
        .map(|(_, station)| normalize_name(station))
        .unwrap_or(normalized)
}

fn code_matches(candidate_code: &str, zone_code: u32) -> bool {
    let code = candidate_code.trim();
    code == zone_code.to_string() || code.parse::<u32>().is_ok_and(|c| c == zone_code)
}

/// Like `match_station`, also reporting which pass matched.
pub fn find_match<'a, C: StationIdentity>(
    zone_name: &str,
    zone_code: u32,
    candidates: &'a [C],
) -> Option<(&'a C, MatchKind)> {
    let wanted = telemetry_name_for(zone_name);

    if !wanted.is_empty() {
        let normalized: Vec<String> = candidates
            .iter()
            .map(|c| normalize_name(c.station_name()))
            .collect();

        if let Some(i) = normalized.iter().position(|n| *n == wanted) {
            return Some((&candidates[i], MatchKind::Exact));
        }
        if let Some(i) = normalized.iter().position(|n| n.contains(&wanted)) {
            return Some((&candidates[i], MatchKind::Substring));
        }
    }

    candidates
        .iter()
        .find(|c| c.station_code().is_some_and(|code| code_matches(code, zone_code)))
        .map(|c| (c, MatchKind::Code))
}

/// Finds the telemetry candidate for a zone, or `None`.
pub fn match_station<'a, C: StationIdentity>(
    zone_name: &str,
    zone_code: u32,
    candidates: &'a [C],
) -> Option<&'a C> {
    find_match(zone_name, zone_code, candidates).map(|(c, _)| c)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LiveReading;

    fn record(name: &str, code: Option<&str>) -> TelemetryRecord {
        TelemetryRecord {
            code: code.map(str::to_string),
            name: name.to_string(),
            reading: LiveReading::default(),
        }
    }

    #[test]
    fn test_alias_table_is_applied() {
        assert_eq!(telemetry_name_for("Barra/Rio Centro"), "BARRA/RIOCENTRO");
        assert_eq!(telemetry_name_for("BARRA/ITANHANGA"), "BARRA/BARRINHA");
        assert_eq!(
            telemetry_name_for("ESTRADA GRAJAU/JACAREPAGUA"),
            "EST. GRAJAU/JACAREPAGUA"
        );
        assert_eq!(telemetry_name_for("Tijuca"), "TIJUCA");
    }

    #[test]
    fn test_aliased_zone_matches_exactly() {
        let candidates = vec![record("Barra/Riocentro", None), record("Barra/Barrinha", None)];
        let (hit, kind) = find_match("BARRA/RIO CENTRO", 19, &candidates).expect("alias hit");
        assert_eq!(hit.name, "Barra/Riocentro");
        assert_eq!(kind, MatchKind::Exact);
    }

    #[test]
    fn test_exact_match_beats_earlier_substring_match() {
        let candidates = vec![record("Tijuca/Muda", None), record("Tijuca", None)];
        let (hit, kind) = find_match("TIJUCA", 4, &candidates).unwrap();
        assert_eq!(hit.name, "Tijuca");
        assert_eq!(kind, MatchKind::Exact);
    }

    #[test]
    fn test_substring_match_folds_accents() {
        let candidates = vec![record("RIO DE JANEIRO - FORTE DE COPACABANA", Some("A652"))];
        let (hit, kind) = find_match("Copacabana", 6, &candidates).unwrap();
        assert_eq!(hit.code.as_deref(), Some("A652"));
        assert_eq!(kind, MatchKind::Substring);

        let candidates = vec![record("São Cristóvão", None)];
        assert!(match_station("SAO CRISTOVAO", 32, &candidates).is_some());
    }

    #[test]
    fn test_code_match_is_last_resort() {
        let candidates = vec![record("Gauge A", Some(" 07 ")), record("Gauge B", Some("7"))];
        let (hit, kind) = find_match("GRAJAU", 7, &candidates).unwrap();
        assert_eq!(hit.name, "Gauge A", "numeric codes compare by value");
        assert_eq!(kind, MatchKind::Code);
    }

    #[test]
    fn test_no_match() {
        let candidates = vec![record("Urca", None), record("Penha", Some("A600"))];
        assert!(match_station("BANGU", 12, &candidates).is_none());
        assert!(match_station::<TelemetryRecord>("BANGU", 12, &[]).is_none());
    }

    #[test]
    fn test_blank_zone_name_only_matches_by_code() {
        let candidates = vec![record("Urca", None), record("Penha", Some("9"))];
        let (hit, kind) = find_match("   ", 9, &candidates).unwrap();
        assert_eq!(hit.name, "Penha");
        assert_eq!(kind, MatchKind::Code);
    }
}
