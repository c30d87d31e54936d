/// Zone repository adapter.
///
/// Pluviometric zones and susceptibility areas live in an external GIS.
/// This module defines the seams through which they enter the core
/// (`ZoneSource`, `SusceptibilitySource`), normalizes zone names on load,
/// and provides a TOML-backed source (`zones.toml`) for offline runs.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::model::{GeometryHandle, SusceptibilityArea, Zone};

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum ZoneSourceError {
    #[error("failed to read zone file '{0}'")]
    Read(PathBuf, #[source] std::io::Error),
    #[error("failed to parse zone file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("zone source unavailable: {0}")]
    Unavailable(String),
}

// ============================================================================
// Collaborator seams
// ============================================================================

/// A zone row as delivered by the geographic layer, before normalization.
#[derive(Debug, Clone, Deserialize)]
pub struct ZoneRecord {
    pub code: u32,
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub geometry: String,
}

/// External provider of pluviometric zone records.
pub trait ZoneSource {
    fn zone_records(&self) -> Result<Vec<ZoneRecord>, ZoneSourceError>;
}

/// External provider of susceptibility areas already intersected with zones.
pub trait SusceptibilitySource {
    fn areas(&self) -> Result<Vec<SusceptibilityArea>, ZoneSourceError>;
}

// ============================================================================
// Normalization
// ============================================================================

/// Upper-cases, strips diacritics and collapses whitespace, so that
/// "São Cristóvão " and "SAO CRISTOVAO" compare equal.
pub fn normalize_name(name: &str) -> String {
    deunicode::deunicode(name)
        .to_uppercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Loads every zone from `source`, normalizing names and addresses.
pub fn load_zones(source: &dyn ZoneSource) -> Result<Vec<Zone>, ZoneSourceError> {
    let zones = source
        .zone_records()?
        .into_iter()
        .map(|record| Zone {
            code: record.code,
            name: normalize_name(&record.name),
            address: normalize_name(&record.address),
            geometry: GeometryHandle(record.geometry),
        })
        .collect();
    Ok(zones)
}

/// Finds a loaded zone by code.
pub fn find_zone(zones: &[Zone], code: u32) -> Option<&Zone> {
    zones.iter().find(|z| z.code == code)
}

// ============================================================================
// TOML-backed source
// ============================================================================

#[derive(Debug, Deserialize)]
struct AreaRecord {
    zone: u32,
    gridcode: i64,
    #[serde(default)]
    geometry: String,
}

#[derive(Debug, Deserialize)]
struct ZonesFile {
    #[serde(default)]
    zone: Vec<ZoneRecord>,
    #[serde(default)]
    area: Vec<AreaRecord>,
}

/// Zone and susceptibility data read from a `zones.toml` export:
///
/// ```text
/// [[zone]]
/// code = 4
/// name = "Tijuca"
/// address = "Rua ..."
/// geometry = "pz-4"
///
/// [[area]]
/// zone = 4
/// gridcode = 3
/// geometry = "sz-4-1"
/// ```
#[derive(Debug)]
pub struct TomlZoneSource {
    zones: Vec<ZoneRecord>,
    areas: Vec<SusceptibilityArea>,
}

impl TomlZoneSource {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ZoneSourceError> {
        let path = path.as_ref();
        let content =
            fs::read_to_string(path).map_err(|e| ZoneSourceError::Read(path.to_path_buf(), e))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ZoneSourceError> {
        let file: ZonesFile = toml::from_str(content)?;
        let areas = file
            .area
            .into_iter()
            .map(|a| SusceptibilityArea {
                zone_code: a.zone,
                gridcode: a.gridcode,
                geometry: GeometryHandle(a.geometry),
            })
            .collect();
        Ok(TomlZoneSource {
            zones: file.zone,
            areas,
        })
    }
}

impl ZoneSource for TomlZoneSource {
    fn zone_records(&self) -> Result<Vec<ZoneRecord>, ZoneSourceError> {
        Ok(self.zones.clone())
    }
}

impl SusceptibilitySource for TomlZoneSource {
    fn areas(&self) -> Result<Vec<SusceptibilityArea>, ZoneSourceError> {
        Ok(self.areas.clone())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const ZONES_TOML: &str = r#"
        [[zone]]
        code = 32
        name = "São Cristóvão"
        address = "Rua Bela, 1"
        geometry = "pz-32"

        [[zone]]
        code = 19
        name = "Barra/Rio Centro"

        [[area]]
        zone = 32
        gridcode = 3
        geometry = "sz-32-a"

        [[area]]
        zone = 19
        gridcode = 1
    "#;

    #[test]
    fn test_normalize_name_folds_case_accents_and_spaces() {
        assert_eq!(normalize_name("  São   Cristóvão "), "SAO CRISTOVAO");
        assert_eq!(normalize_name("Jacarepaguá"), "JACAREPAGUA");
        assert_eq!(normalize_name("Est. Grajaú/Jacarepaguá"), "EST. GRAJAU/JACAREPAGUA");
    }

    #[test]
    fn test_load_zones_normalizes_names_and_addresses() {
        let source = TomlZoneSource::parse(ZONES_TOML).expect("fixture should parse");
        let zones = load_zones(&source).expect("load should succeed");

        assert_eq!(zones.len(), 2);
        let sao = find_zone(&zones, 32).expect("zone 32 present");
        assert_eq!(sao.name, "SAO CRISTOVAO");
        assert_eq!(sao.address, "RUA BELA, 1");
        assert_eq!(sao.geometry, GeometryHandle("pz-32".to_string()));

        let barra = find_zone(&zones, 19).expect("zone 19 present");
        assert_eq!(barra.address, "", "missing address defaults to empty");
    }

    #[test]
    fn test_toml_source_exposes_areas() {
        let source = TomlZoneSource::parse(ZONES_TOML).unwrap();
        let areas = source.areas().unwrap();
        assert_eq!(areas.len(), 2);
        assert_eq!(areas[0].zone_code, 32);
        assert_eq!(areas[0].gridcode, 3);
    }

    #[test]
    fn test_parse_rejects_malformed_toml() {
        let result = TomlZoneSource::parse("[[zone]]\ncode = \"not a number\"");
        assert!(matches!(result, Err(ZoneSourceError::Parse(_))));
    }

    #[test]
    fn test_load_missing_file_reports_path() {
        let err = TomlZoneSource::load("/nonexistent/zones.toml").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/zones.toml"));
    }
}
