//! HTTP front end for the hydromon alert engine: configuration, the reading
//! ingest worker and the query API consumed by dashboards.

pub mod api;
pub mod app;
pub mod config;
pub mod ingest;
pub mod logging;
pub mod state;
