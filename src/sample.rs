//! Sample values with an explicit missing marker.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Value of a time series sample.
///
/// A sample is either known or missing. Missing samples never win a
/// [`Sample::min`]/[`Sample::max`] comparison and are skipped by [`Sample::sum`],
/// so they behave as "absent" rather than poisoning a result the way a raw NaN would.
///
/// Serialized as an optional float (`null` when missing).
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "Option<f64>", into = "Option<f64>")]
pub enum Sample {
    #[default]
    Missing,
    Known(f64),
}

impl Sample {
    pub fn is_missing(self) -> bool {
        matches!(self, Sample::Missing)
    }

    pub fn known(self) -> Option<f64> {
        match self {
            Sample::Known(val) => Some(val),
            Sample::Missing => None,
        }
    }

    /// Smaller of two samples, ignoring missing ones.
    pub fn min(self, other: Sample) -> Sample {
        match (self, other) {
            (Sample::Known(a), Sample::Known(b)) => Sample::Known(if b < a { b } else { a }),
            (Sample::Known(_), Sample::Missing) => self,
            (Sample::Missing, _) => other,
        }
    }

    /// Larger of two samples, ignoring missing ones.
    pub fn max(self, other: Sample) -> Sample {
        match (self, other) {
            (Sample::Known(a), Sample::Known(b)) => Sample::Known(if b > a { b } else { a }),
            (Sample::Known(_), Sample::Missing) => self,
            (Sample::Missing, _) => other,
        }
    }

    /// Sum of two samples, ignoring missing ones.
    pub fn sum(self, other: Sample) -> Sample {
        match (self, other) {
            (Sample::Known(a), Sample::Known(b)) => Sample::Known(a + b),
            (Sample::Known(_), Sample::Missing) => self,
            (Sample::Missing, _) => other,
        }
    }
}

impl From<f64> for Sample {
    /// NaN maps to [`Sample::Missing`].
    fn from(val: f64) -> Self {
        if val.is_nan() {
            Sample::Missing
        } else {
            Sample::Known(val)
        }
    }
}

impl From<Option<f64>> for Sample {
    fn from(val: Option<f64>) -> Self {
        val.map_or(Sample::Missing, Sample::from)
    }
}

impl From<Sample> for Option<f64> {
    fn from(sample: Sample) -> Self {
        sample.known()
    }
}

impl From<Sample> for f64 {
    fn from(sample: Sample) -> Self {
        sample.known().unwrap_or(f64::NAN)
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sample::Known(val) => write!(f, "{val:.10e}"),
            Sample::Missing => write!(f, "NaN"),
        }
    }
}
