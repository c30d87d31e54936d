/// Zone-reading association.
///
/// Joins the loaded zones with either live telemetry or merged historical
/// maxima. Every zone yields exactly one `AssociatedZone`; zones without a
/// source record carry zeros and `has_data == false` so the GIS still gets a
/// row for them.

use std::collections::HashMap;

use crate::analysis::matching::find_match;
use crate::analysis::merge::ZoneMaxima;
use crate::logging::{DataSource, log_run_summary};
use crate::model::{AssociatedZone, HistoricalMaxima, LiveReading, TelemetryRecord, Zone, ZoneRainfall};
use crate::period::HistoricalRequest;

/// Attaches live telemetry to each zone through the station matcher.
pub fn associate_live(zones: &[Zone], records: &[TelemetryRecord]) -> Vec<AssociatedZone> {
    let target = DataSource::Matcher.target();

    let associated: Vec<AssociatedZone> = zones
        .iter()
        .map(|zone| match find_match(&zone.name, zone.code, records) {
            Some((record, kind)) => {
                log::info!(target: target, "{:02} | {} | collectedAt: LOADED", zone.code, zone.name);
                log::debug!(target: target, "zone {} matched '{}' ({:?})", zone.code, record.name, kind);
                AssociatedZone {
                    zone: zone.clone(),
                    rainfall: ZoneRainfall::Live(record.reading),
                    has_data: true,
                }
            }
            None => {
                log::info!(target: target, "{:02} | {} | collectedAt: ---", zone.code, zone.name);
                AssociatedZone {
                    zone: zone.clone(),
                    rainfall: ZoneRainfall::Live(LiveReading::default()),
                    has_data: false,
                }
            }
        })
        .collect();

    let matched = associated.iter().filter(|z| z.has_data).count();
    log_run_summary(DataSource::Matcher, "zones matched to telemetry", zones.len(), matched, zones.len() - matched);
    associated
}

/// Attaches merged maxima (keyed by station code == zone code) to each zone.
pub fn associate_historical(
    zones: &[Zone],
    merged: &HashMap<u32, ZoneMaxima>,
    request: &HistoricalRequest,
) -> Vec<AssociatedZone> {
    let date_label = request.date_label();
    let hour_label = request.hour_label();

    let associated: Vec<AssociatedZone> = zones
        .iter()
        .map(|zone| {
            let found = merged.get(&zone.code).filter(|m| m.windows_merged > 0);
            if found.is_none() {
                log::debug!(target: DataSource::Matcher.target(), "zone {} has no historical windows", zone.code);
            }
            let maxima = found.copied().unwrap_or_default();
            AssociatedZone {
                zone: zone.clone(),
                rainfall: ZoneRainfall::Historical(HistoricalMaxima {
                    maxima: maxima.maxima,
                    date_label: date_label.clone(),
                    hour_label: hour_label.clone(),
                    windows_merged: maxima.windows_merged,
                }),
                has_data: found.is_some(),
            }
        })
        .collect();

    let with_data = associated.iter().filter(|z| z.has_data).count();
    log_run_summary(
        DataSource::Matcher,
        "zones with historical data",
        zones.len(),
        with_data,
        zones.len() - with_data,
    );
    associated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{GeometryHandle, WindowMax, WindowMaxima};
    use chrono::NaiveDate;

    fn zone(code: u32, name: &str) -> Zone {
        Zone {
            code,
            name: name.to_string(),
            address: String::new(),
            geometry: GeometryHandle(format!("pz-{}", code)),
        }
    }

    fn record(name: &str, h01: f64) -> TelemetryRecord {
        TelemetryRecord {
            code: None,
            name: name.to_string(),
            reading: LiveReading {
                h01,
                ..LiveReading::default()
            },
        }
    }

    #[test]
    fn test_live_association_uses_alias_and_zero_fills() {
        let zones = vec![zone(19, "BARRA/RIO CENTRO"), zone(4, "TIJUCA"), zone(7, "URCA")];
        let records = vec![record("Tijuca", 12.0), record("Barra/Riocentro", 30.0)];

        let associated = associate_live(&zones, &records);

        assert_eq!(associated.len(), 3, "one record per zone");
        assert_eq!(associated[0].rainfall.h01(), 30.0);
        assert!(associated[0].has_data);
        assert_eq!(associated[1].rainfall.h01(), 12.0);
        assert!(!associated[2].has_data);
        assert_eq!(associated[2].rainfall.h01(), 0.0);
    }

    #[test]
    fn test_historical_association_carries_labels() {
        let request = HistoricalRequest::parse("01/01/2024", "01/01/2024", "08:00:00", "20:00:00")
            .expect("valid request");
        let at = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(10, 0, 0).unwrap();
        let mut merged = HashMap::new();
        merged.insert(
            4,
            ZoneMaxima {
                maxima: WindowMaxima {
                    h01: WindowMax::seeded(22.8, at),
                    ..WindowMaxima::default()
                },
                windows_merged: 2,
            },
        );

        let associated = associate_historical(&[zone(4, "TIJUCA"), zone(5, "SANTA TERESA")], &merged, &request);

        assert!(associated[0].has_data);
        assert_eq!(associated[0].rainfall.h01(), 22.8);
        match &associated[1].rainfall {
            ZoneRainfall::Historical(h) => {
                assert_eq!(h.date_label, "01/01/2024");
                assert_eq!(h.hour_label, "08 a 20");
                assert_eq!(h.windows_merged, 0);
                assert_eq!(h.maxima.h01.occurred_at, None);
            }
            other => panic!("expected historical rainfall, got {:?}", other),
        }
        assert!(!associated[1].has_data);
    }
}
