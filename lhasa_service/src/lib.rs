/// lhasa_service: landslide danger nowcast for the Rio de Janeiro
/// pluviometric network.
///
/// # Module structure
///
/// ```text
/// lhasa_service
/// ├── model       shared data types (RainReading, WindowMaxima, Zone, DangerLevel, errors)
/// ├── config      service configuration loader (lhasa.toml)
/// ├── logging     log facade backend, failure classes, audit summaries
/// ├── stations    static station catalog with historical file tokens
/// ├── zones       zone/susceptibility sources and name normalization
/// ├── period      historical request validation and run labels
/// ├── ingest
/// │   ├── history   fixed-width monthly rain logs
/// │   ├── inmet     INMET station list and hourly data
/// │   ├── legacy    municipal bulk rainfall endpoint
/// │   ├── telemetry live fetch with fallback over an HttpTransport
/// │   └── fixtures (test only) representative payloads
/// ├── analysis
/// │   ├── windows   per-station rolling-window maxima
/// │   ├── merge     zone-level fold of windows
/// │   ├── matching  zone name to telemetry station
/// │   └── associate zones joined with rainfall
/// ├── alert
/// │   └── danger    susceptibility × rainfall danger matrix
/// └── pipeline    nowcast and historical runs
/// ```

/// Public modules
pub mod alert;
pub mod analysis;
pub mod config;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod period;
pub mod pipeline;
pub mod stations;
pub mod zones;
