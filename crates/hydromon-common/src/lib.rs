//! Shared data model for hydromon: sensor readings, alert log entries and
//! active alert records, plus the process-wide id generator used by the
//! durable log store.

pub mod id;
pub mod types;
