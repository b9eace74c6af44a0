use crate::error::AlertError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Safe ranges used when no thresholds are configured.
pub const DEFAULT_THRESHOLDS: [(&str, f64, f64); 4] = [
    ("temperature", 18.0, 35.0),
    ("humidity", 40.0, 80.0),
    ("ph", 5.5, 7.5),
    ("tds", 800.0, 1600.0),
];

/// The inclusive safe range configured for one parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    pub parameter: String,
    pub min: f64,
    pub max: f64,
}

impl Threshold {
    pub fn new(parameter: impl Into<String>, min: f64, max: f64) -> Self {
        Self {
            parameter: parameter.into(),
            min,
            max,
        }
    }

    pub fn bounds(&self) -> Bounds {
        Bounds {
            min: self.min,
            max: self.max,
        }
    }

    fn validate(&self) -> Result<(), AlertError> {
        let invalid = |reason: &str| AlertError::InvalidThreshold {
            parameter: self.parameter.clone(),
            reason: reason.to_string(),
        };
        if self.parameter.trim().is_empty() {
            return Err(invalid("parameter name is empty"));
        }
        if !self.min.is_finite() || !self.max.is_finite() {
            return Err(invalid("bounds must be finite"));
        }
        if self.min > self.max {
            return Err(invalid("min is greater than max"));
        }
        Ok(())
    }
}

/// `[min, max]` bounds of a parameter.
///
/// ```
/// use hydromon_alert::Bounds;
///
/// let bounds = Bounds { min: 18.0, max: 35.0 };
/// assert!(bounds.is_out_of_range(40.0));
/// assert!(!bounds.is_out_of_range(35.0));
/// assert_eq!(bounds.label(), "18–35");
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    /// True when `value` lies outside `[min, max]`. Both ends are safe.
    pub fn is_out_of_range(&self, value: f64) -> bool {
        value < self.min || value > self.max
    }

    /// Range as logged in issue details, e.g. `"5.5–7.5"`.
    pub fn label(&self) -> String {
        format!("{}–{}", self.min, self.max)
    }
}

/// Static parameter → bounds lookup, fixed at startup.
///
/// Evaluation walks the table in configuration order, so issues inside a log
/// entry are listed in that order too.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdTable {
    thresholds: Vec<Threshold>,
}

impl ThresholdTable {
    /// Validates and builds a table.
    ///
    /// # Errors
    ///
    /// Returns [`AlertError::InvalidThreshold`] for non-finite or inverted
    /// bounds and [`AlertError::DuplicateThreshold`] when a parameter appears
    /// twice.
    pub fn new(thresholds: Vec<Threshold>) -> Result<Self, AlertError> {
        let mut seen = HashSet::new();
        for threshold in &thresholds {
            threshold.validate()?;
            if !seen.insert(threshold.parameter.as_str()) {
                return Err(AlertError::DuplicateThreshold(threshold.parameter.clone()));
            }
        }
        Ok(Self { thresholds })
    }

    pub fn bounds(&self, parameter: &str) -> Option<Bounds> {
        self.get(parameter).map(Threshold::bounds)
    }

    pub fn get(&self, parameter: &str) -> Option<&Threshold> {
        self.thresholds.iter().find(|t| t.parameter == parameter)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Threshold> {
        self.thresholds.iter()
    }

    pub fn len(&self) -> usize {
        self.thresholds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.thresholds.is_empty()
    }
}

impl Default for ThresholdTable {
    fn default() -> Self {
        Self {
            thresholds: DEFAULT_THRESHOLDS
                .iter()
                .map(|(parameter, min, max)| Threshold::new(*parameter, *min, *max))
                .collect(),
        }
    }
}
