//! Catfish odds logger.
//!
//! Samples barometric pressure, air temperature and river gage height for one
//! location, scores fishing conditions, and keeps a rolling 30-day JSON log
//! with at most one entry per UTC hour.
//!
//! - `model`    — shared types and errors
//! - `config`   — defaults, `odds.toml`, environment overrides
//! - `logging`  — structured console/file logging
//! - `ingest`   — Nominatim, weather.gov and USGS clients
//! - `analysis` — stability estimate and composite score
//! - `store`    — the on-disk log (prune, merge-by-hour, atomic save)
//! - `pipeline` — one run from readings to a persisted entry

pub mod analysis;
pub mod config;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod store;
