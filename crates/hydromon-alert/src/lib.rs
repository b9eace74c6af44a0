//! Edge-triggered alert lifecycle for hydroponic sensor parameters.
//!
//! A [`threshold::ThresholdTable`] holds the safe `[min, max]` range of each
//! monitored parameter. The [`engine::AlertEngine`] evaluates the latest
//! reading against it, opens an alert the moment a parameter leaves its
//! range, resolves it the moment the parameter comes back, and records both
//! transitions through a [`hydromon_storage::LogSink`].

pub mod engine;
pub mod error;
pub mod history;
pub mod threshold;


pub use engine::{AlertEngine, EvaluationOutcome};
pub use error::AlertError;
pub use threshold::{Bounds, Threshold, ThresholdTable};
