//! Windowed aggregation of fixed-step time series.

use crate::sample::Sample;
use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fraction of the largest values discarded by [`Aggregator::percentile_95`].
const PERCENTILE_95_DISCARD: f64 = 0.05;

/// Kind of aggregated value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggregateKind {
    #[serde(rename = "MIN")]
    Min,
    #[serde(rename = "MAX")]
    Max,
    #[serde(rename = "FIRST")]
    First,
    #[serde(rename = "LAST")]
    Last,
    #[serde(rename = "AVERAGE")]
    Average,
    #[serde(rename = "TOTAL")]
    Total,
    #[serde(rename = "95PCT")]
    Percentile95,
}

impl AggregateKind {
    pub const ALL: [AggregateKind; 7] = [
        AggregateKind::Min,
        AggregateKind::Max,
        AggregateKind::First,
        AggregateKind::Last,
        AggregateKind::Average,
        AggregateKind::Total,
        AggregateKind::Percentile95,
    ];

    pub fn name(self) -> &'static str {
        match self {
            AggregateKind::Min => "MIN",
            AggregateKind::Max => "MAX",
            AggregateKind::First => "FIRST",
            AggregateKind::Last => "LAST",
            AggregateKind::Average => "AVERAGE",
            AggregateKind::Total => "TOTAL",
            AggregateKind::Percentile95 => "95PCT",
        }
    }
}

/// Aggregated values of a series over a time window.
///
/// Each field is [`Sample::Missing`] when undefined for the window.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aggregates {
    pub min: Sample,
    pub max: Sample,
    pub first: Sample,
    pub last: Sample,
    pub average: Sample,
    pub total: Sample,
}

impl Aggregates {
    /// Get a single aggregated value by kind.
    ///
    /// Returns `None` for [`AggregateKind::Percentile95`], which is not part of
    /// the aggregates (see [`Aggregator::percentile_95`]).
    pub fn get(&self, kind: AggregateKind) -> Option<Sample> {
        match kind {
            AggregateKind::Min => Some(self.min),
            AggregateKind::Max => Some(self.max),
            AggregateKind::First => Some(self.first),
            AggregateKind::Last => Some(self.last),
            AggregateKind::Average => Some(self.average),
            AggregateKind::Total => Some(self.total),
            AggregateKind::Percentile95 => None,
        }
    }
}

impl fmt::Display for Aggregates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MIN={} MAX={} FIRST={} LAST={} AVERAGE={} TOTAL={}",
            self.min, self.max, self.first, self.last, self.average, self.total
        )
    }
}

/// Aggregation engine over a fixed-step time series.
///
/// Sample `i` holds during the validity interval `(timestamps[i] - step, timestamps[i]]`.
/// The engine is immutable after construction and can be queried from any
/// number of threads.
#[derive(Debug, Clone)]
pub struct Aggregator {
    timestamps: Vec<i64>,
    values: Vec<Sample>,
    step: i64,
}

impl Aggregator {
    /// Create a new `Aggregator` from timestamps (in seconds) and their values.
    ///
    /// The step is taken from the first two timestamps and assumed constant;
    /// consecutive pairs are not re-checked.
    ///
    /// # Errors
    /// Returns an error if the lengths differ, if fewer than two samples are
    /// given, or if the step is not positive or does not fit in an `i64`.
    pub fn new<V: Into<Sample>>(timestamps: Vec<i64>, values: Vec<V>) -> Result<Self> {
        let n_ts = timestamps.len();
        let n_vals = values.len();
        if n_ts != n_vals {
            bail!("timestamps and values must have equal lengths, but have {n_ts} and {n_vals}");
        }
        if n_ts < 2 {
            bail!("at least 2 samples must be supplied, but {n_ts} were");
        }
        let Some(step) = timestamps[1].checked_sub(timestamps[0]) else {
            bail!("step between {} and {} overflows", timestamps[0], timestamps[1]);
        };
        if step <= 0 {
            bail!("step must be positive, but is {step}");
        }

        // Known NaN payloads are missing values too.
        let values = values
            .into_iter()
            .map(|val| {
                let sample: Sample = val.into();
                Sample::from(f64::from(sample))
            })
            .collect();

        Ok(Self {
            timestamps,
            values,
            step,
        })
    }

    pub fn step(&self) -> i64 {
        self.step
    }

    pub fn timestamps(&self) -> &[i64] {
        &self.timestamps
    }

    pub fn values(&self) -> &[Sample] {
        &self.values
    }

    /// Compute all aggregates over the window `[t_start, t_end]`.
    ///
    /// Samples whose validity interval overlaps the window contribute in
    /// proportion to the overlap. Missing samples are ignored by min, max,
    /// total and average but may still be the first or last value.
    pub fn compute_aggregates(&self, t_start: i64, t_end: i64) -> Aggregates {
        let mut agg = Aggregates::default();
        let mut total_secs: i128 = 0;
        let mut first_found = false;

        for (delta, val) in self.overlaps(t_start, t_end) {
            agg.min = agg.min.min(val);
            agg.max = agg.max.max(val);
            if !first_found {
                agg.first = val;
                first_found = true;
            }
            agg.last = val;
            if let Sample::Known(val) = val {
                agg.total = agg.total.sum(Sample::Known(delta as f64 * val));
                total_secs += delta;
            }
        }

        agg.average = match agg.total {
            Sample::Known(total) if total_secs > 0 => Sample::Known(total / total_secs as f64),
            _ => Sample::Missing,
        };

        agg
    }

    /// Compute the 95th percentile over the window `[t_start, t_end]`.
    ///
    /// This is the highest known value left after the top `ceil(5%)` of the sorted
    /// known values are discarded. Ties count individually. At least two known
    /// values must overlap the window for the result to be defined.
    pub fn percentile_95(&self, t_start: i64, t_end: i64) -> Sample {
        let mut vals: Vec<f64> = self
            .overlaps(t_start, t_end)
            .filter_map(|(_, val)| val.known())
            .collect();

        let n_vals = vals.len();
        if n_vals < 2 {
            return Sample::Missing;
        }

        vals.sort_by(f64::total_cmp);

        let n_discard = (n_vals as f64 * PERCENTILE_95_DISCARD).ceil() as usize;
        match n_vals.checked_sub(n_discard) {
            Some(n_keep) if n_keep > 0 => Sample::Known(vals[n_keep - 1]),
            _ => Sample::Missing,
        }
    }

    /// Iterate over the samples overlapping the window, with the overlap in seconds.
    ///
    /// Bounds are widened to `i128` so extreme timestamps cannot overflow.
    fn overlaps(&self, t_start: i64, t_end: i64) -> impl Iterator<Item = (i128, Sample)> + '_ {
        let step = i128::from(self.step);
        let t_start = i128::from(t_start);
        let t_end = i128::from(t_end);
        self.timestamps
            .iter()
            .zip(self.values.iter())
            .filter_map(move |(&ts, &val)| {
                let ts = i128::from(ts);
                let left = (ts - step).max(t_start);
                let right = ts.min(t_end);
                let delta = right - left;
                (delta > 0).then_some((delta, val))
            })
    }
}
