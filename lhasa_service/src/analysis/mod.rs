/// Rainfall analysis for the landslide nowcast.
///
/// Submodules:
/// - `windows`: per-station rolling-window maxima with boundary resets.
/// - `merge`: order-independent fold of windows into zone maxima.
/// - `matching`: zone name to telemetry station resolution.
/// - `associate`: joins zones with live or historical rainfall.

pub mod associate;
pub mod matching;
pub mod merge;
pub mod windows;
