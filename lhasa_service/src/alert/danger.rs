/// Landslide danger classification.
///
/// The danger level of an area depends on its susceptibility class and on
/// three rainfall accumulations of the zone it lies in. Two rainfall bands
/// are checked in order; the first that applies decides:
///
/// | band      | condition                                                  | low  | medium    | high     |
/// |-----------|------------------------------------------------------------|------|-----------|----------|
/// | elevated  | 50 ≤ h01 < 70, or 140 ≤ h24 < 185, or (185 ≤ h96 < 255 and 55 ≤ h24 < 100) | NONE | MODERATE  | HIGH     |
/// | severe    | h01 ≥ 70, or h24 ≥ 185, or (h96 ≥ 255 and h24 ≥ 100)        | NONE | VERY_HIGH | CRITICAL |
/// | otherwise |                                                            | LOW  | LOW       | LOW      |
///
/// Low-susceptibility areas are never in danger, however much it rains.

use crate::logging::DataSource;
use crate::model::{
    AssociatedZone, ClassificationError, ClassifiedZone, DangerLevel, Susceptibility,
    SusceptibilityArea,
};

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

fn in_band(value: f64, low: f64, high: f64) -> bool {
    value >= low && value < high
}

fn elevated_rainfall(h01: f64, h24: f64, h96: f64) -> bool {
    in_band(h01, 50.0, 70.0)
        || in_band(h24, 140.0, 185.0)
        || (in_band(h96, 185.0, 255.0) && in_band(h24, 55.0, 100.0))
}

fn severe_rainfall(h01: f64, h24: f64, h96: f64) -> bool {
    h01 >= 70.0 || h24 >= 185.0 || (h96 >= 255.0 && h24 >= 100.0)
}

/// Maps susceptibility and rainfall (mm) to a danger level.
pub fn classify(susceptibility: Susceptibility, h01: f64, h24: f64, h96: f64) -> DangerLevel {
    if elevated_rainfall(h01, h24, h96) {
        match susceptibility {
            Susceptibility::Low => DangerLevel::None,
            Susceptibility::Medium => DangerLevel::Moderate,
            Susceptibility::High => DangerLevel::High,
        }
    } else if severe_rainfall(h01, h24, h96) {
        match susceptibility {
            Susceptibility::Low => DangerLevel::None,
            Susceptibility::Medium => DangerLevel::VeryHigh,
            Susceptibility::High => DangerLevel::Critical,
        }
    } else {
        DangerLevel::Low
    }
}

/// `classify` for a raw gridcode from the susceptibility layer.
pub fn classify_gridcode(
    gridcode: i64,
    h01: f64,
    h24: f64,
    h96: f64,
) -> Result<DangerLevel, ClassificationError> {
    let susceptibility = Susceptibility::try_from(gridcode)?;
    Ok(classify(susceptibility, h01, h24, h96))
}

// ---------------------------------------------------------------------------
// Areas of risk
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct ClassificationOutcome {
    pub classified: Vec<ClassifiedZone>,
    /// Areas whose gridcode is outside 1..=3.
    pub rejected: Vec<(SusceptibilityArea, ClassificationError)>,
    /// Low-susceptibility areas, dropped before classification.
    pub skipped_low: usize,
    /// Areas referring to a zone that was not loaded.
    pub orphaned: usize,
}

/// Classifies every area of risk (susceptibility medium or high) against the
/// rainfall of the zone it intersects. Results follow the order of `areas`.
pub fn classify_areas(zones: &[AssociatedZone], areas: &[SusceptibilityArea]) -> ClassificationOutcome {
    let target = DataSource::Classifier.target();
    let mut outcome = ClassificationOutcome::default();

    for area in areas {
        let susceptibility = match Susceptibility::try_from(area.gridcode) {
            Ok(s) => s,
            Err(e) => {
                log::error!(target: target, "area {} of zone {}: {}", area.geometry, area.zone_code, e);
                outcome.rejected.push((area.clone(), e));
                continue;
            }
        };
        if !susceptibility.is_area_of_risk() {
            outcome.skipped_low += 1;
            continue;
        }

        let Some(associated) = zones.iter().find(|z| z.zone.code == area.zone_code) else {
            log::warn!(target: target, "area {} refers to unknown zone {}", area.geometry, area.zone_code);
            outcome.orphaned += 1;
            continue;
        };

        let rainfall = &associated.rainfall;
        let danger_level = classify(susceptibility, rainfall.h01(), rainfall.h24(), rainfall.h96());

        outcome.classified.push(ClassifiedZone {
            zone: associated.zone.clone(),
            rainfall: rainfall.clone(),
            susceptibility,
            area: area.geometry.clone(),
            danger_level,
        });
    }

    log::info!(
        target: target,
        "{} areas classified, {} low-susceptibility skipped, {} invalid, {} without zone",
        outcome.classified.len(),
        outcome.skipped_low,
        outcome.rejected.len(),
        outcome.orphaned
    );
    outcome
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
