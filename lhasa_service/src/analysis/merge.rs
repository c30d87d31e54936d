/// Zone-level merge of windowed maxima.
///
/// Every window a station emitted inside the requested range is folded into
/// one `WindowMaxima` per zone (zone code == station code). The fold uses
/// `WindowMax::combine`, so the result does not depend on the order in which
/// files or windows were processed.

use std::collections::HashMap;

use crate::model::{WindowMaxima, WindowedMaximum};

/// Folded maxima for one zone.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ZoneMaxima {
    pub maxima: WindowMaxima,
    pub windows_merged: usize,
}

/// Folds `windows` into one value. An empty input yields zero maxima with no
/// timestamps, which is also the identity of the fold.
pub fn fold_windows<'a, I>(windows: I) -> ZoneMaxima
where
    I: IntoIterator<Item = &'a WindowedMaximum>,
{
    windows
        .into_iter()
        .fold(ZoneMaxima::default(), |acc, w| ZoneMaxima {
            maxima: acc.maxima.combine(&w.maxima),
            windows_merged: acc.windows_merged + 1,
        })
}

/// Groups windows by station code and folds each group.
pub fn merge_by_zone(windows: &[WindowedMaximum]) -> HashMap<u32, ZoneMaxima> {
    let mut grouped: HashMap<u32, Vec<&WindowedMaximum>> = HashMap::new();
    for window in windows {
        grouped.entry(window.station_code).or_default().push(window);
    }

    grouped
        .into_iter()
        .map(|(code, group)| (code, fold_windows(group)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RainReading, WindowMax};
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn window(code: u32, h: u32, m: u32, values: [f64; 5]) -> WindowedMaximum {
        let reading = RainReading {
            measured_at: at(h, m),
            m15: values[0],
            h01: values[1],
            h04: values[2],
            h24: values[3],
            h96: values[4],
        };
        WindowedMaximum {
            station_code: code,
            window_start: at(h, 0),
            maxima: WindowMaxima::seeded_from(&reading),
        }
    }

    #[test]
    fn test_fold_takes_fieldwise_maximum() {
        let windows = vec![
            window(4, 10, 30, [8.0, 20.0, 25.0, 50.0, 90.0]),
            window(4, 11, 0, [2.0, 30.0, 25.0, 40.0, 95.0]),
        ];
        let merged = fold_windows(&windows);
        assert_eq!(merged.windows_merged, 2);
        assert_eq!(merged.maxima.m15, WindowMax::seeded(8.0, at(10, 30)));
        assert_eq!(merged.maxima.h01, WindowMax::seeded(30.0, at(11, 0)));
        assert_eq!(merged.maxima.h04, WindowMax::seeded(25.0, at(10, 30)), "tie keeps earlier");
        assert_eq!(merged.maxima.h96.value, 95.0);
    }

    #[test]
    fn test_fold_is_order_independent() {
        let windows = vec![
            window(4, 10, 30, [8.0, 20.0, 25.0, 50.0, 90.0]),
            window(4, 11, 0, [2.0, 30.0, 25.0, 40.0, 95.0]),
            window(4, 12, 15, [8.0, 30.0, 0.0, 50.0, 0.0]),
        ];
        let expected = fold_windows(&windows);

        let permutations: [[usize; 3]; 6] =
            [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];
        for order in permutations {
            let shuffled: Vec<&WindowedMaximum> = order.iter().map(|&i| &windows[i]).collect();
            assert_eq!(fold_windows(shuffled), expected, "order {:?}", order);
        }

        let doubled: Vec<_> = windows.iter().chain(windows.iter()).collect();
        assert_eq!(fold_windows(doubled).maxima, expected.maxima, "fold is idempotent");
    }

    #[test]
    fn test_empty_fold_is_zero_without_timestamps() {
        let none: [WindowedMaximum; 0] = [];
        let merged = fold_windows(&none);
        assert_eq!(merged.windows_merged, 0);
        assert_eq!(merged.maxima.h24.value, 0.0);
        assert_eq!(merged.maxima.h24.occurred_at, None);
    }

    #[test]
    fn test_merge_by_zone_groups_by_station_code() {
        let windows = vec![
            window(4, 10, 0, [1.0, 1.0, 1.0, 1.0, 1.0]),
            window(5, 10, 0, [9.0, 9.0, 9.0, 9.0, 9.0]),
            window(4, 11, 0, [3.0, 3.0, 3.0, 3.0, 3.0]),
        ];
        let merged = merge_by_zone(&windows);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[&4].windows_merged, 2);
        assert_eq!(merged[&4].maxima.h01.value, 3.0);
        assert_eq!(merged[&5].maxima.h01.value, 9.0);
    }
}
