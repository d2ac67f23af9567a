//! Series file format.

use crate::aggregator::Aggregator;
use crate::sample::Sample;
use anyhow::{Context, Result, bail};
use rmp_serde::{decode, encode};
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, BufWriter, Write},
    path::Path,
};

/// Time series as stored in a series file.
///
/// Missing values are encoded as nil.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct SeriesData {
    /// Name of the series (e.g. the datasource it was fetched from).
    pub name: String,
    /// Timestamps in seconds, advancing by a constant step.
    pub timestamps: Vec<i64>,
    /// Values ending at each timestamp.
    pub values: Vec<Sample>,
}

impl SeriesData {
    /// Load a [`SeriesData`] from a MessagePack-encoded file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or deserialized, or if its
    /// timestamps do not advance by a constant positive step.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let file = File::open(file).with_context(|| format!("failed to open {file:?}"))?;
        let mut reader = BufReader::new(file);

        let data: SeriesData =
            decode::from_read(&mut reader).context("failed to deserialize series")?;

        data.validate().context("failed to validate series")?;

        Ok(data)
    }

    /// Save the series to a MessagePack-encoded file.
    pub fn save_file<P: AsRef<Path>>(&self, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
        let mut writer = BufWriter::new(file);
        encode::write(&mut writer, self).context("failed to serialize series")?;
        writer.flush().context("failed to flush writer stream")?;
        Ok(())
    }

    /// Build an [`Aggregator`] over the series.
    pub fn aggregator(&self) -> Result<Aggregator> {
        Aggregator::new(self.timestamps.clone(), self.values.clone())
    }

    fn validate(&self) -> Result<()> {
        let n_ts = self.timestamps.len();
        let n_vals = self.values.len();
        if n_ts != n_vals {
            bail!("series must have as many values as timestamps ({n_ts}), but has {n_vals}");
        }
        if n_ts < 2 {
            bail!("series must have at least 2 samples, but has {n_ts}");
        }

        // The aggregator trusts the step, so check every pair here.
        let step = self.timestamps[1]
            .checked_sub(self.timestamps[0])
            .context("step overflows")?;
        if step <= 0 {
            bail!("step must be positive, but is {step}");
        }
        for (i_ts, pair) in self.timestamps.windows(2).enumerate() {
            let Some(diff) = pair[1].checked_sub(pair[0]) else {
                bail!("timestamp {} overflows the distance to the previous one", i_ts + 1);
            };
            if diff != step {
                bail!("timestamp {} is {diff} s after the previous one, expected {step} s", i_ts + 1);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(timestamps: Vec<i64>) -> SeriesData {
        let values = vec![Sample::Known(1.0); timestamps.len()];
        SeriesData {
            name: "eth0".to_string(),
            timestamps,
            values,
        }
    }

    #[test]
    fn accepts_uniform_step() {
        assert!(series(vec![300, 600, 900, 1200]).validate().is_ok());
    }

    #[test]
    fn rejects_irregular_step() {
        let err = series(vec![300, 600, 1000]).validate().unwrap_err();
        assert!(err.to_string().contains("timestamp 2"));
        assert!(series(vec![600, 300]).validate().is_err());
        assert!(series(vec![600]).validate().is_err());
    }

    #[test]
    fn rejects_overflowing_timestamps() {
        assert!(series(vec![i64::MIN, i64::MAX]).validate().is_err());
        assert!(series(vec![i64::MIN, 0, i64::MAX]).validate().is_err());
        assert!(series(vec![i64::MIN, i64::MIN + 10, i64::MIN + 20]).validate().is_ok());
    }

    #[test]
    fn rejects_length_mismatch() {
        let mut data = series(vec![300, 600, 900]);
        data.values.pop();
        assert!(data.validate().is_err());
    }
}
