use crate::aggregator::{AggregateKind, Aggregator};
use crate::config::{Config, Window};
use crate::data::SeriesData;
use anyhow::{Context, Result};
use std::{fs::File, io::BufWriter, path::Path};

/// Builds the report of a series for every configured window.
pub struct Reporter {
    cfg: Config,
}

impl Reporter {
    pub fn new(cfg: Config) -> Self {
        Self { cfg }
    }

    pub fn report(&self, data: &SeriesData) -> Result<serde_json::Value> {
        let aggregator = data.aggregator().context("failed to construct aggregator")?;

        let windows: Vec<_> = self
            .cfg
            .windows
            .iter()
            .map(|window| self.report_window(&aggregator, window))
            .collect();

        Ok(serde_json::json!({
            "series": data.name,
            "step": aggregator.step(),
            "windows": windows,
        }))
    }

    pub fn save_report<P: AsRef<Path>>(&self, report: &serde_json::Value, file: P) -> Result<()> {
        let file = file.as_ref();
        let file = File::create(file).with_context(|| format!("failed to create {file:?}"))?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, report).context("failed to serialize report")?;
        Ok(())
    }

    fn report_window(&self, aggregator: &Aggregator, window: &Window) -> serde_json::Value {
        let agg = aggregator.compute_aggregates(window.t_start, window.t_end);

        let mut map = serde_json::Map::new();
        map.insert("name".into(), window.name.clone().into());
        map.insert("t_start".into(), window.t_start.into());
        map.insert("t_end".into(), window.t_end.into());
        for &kind in &self.cfg.kinds {
            let val = match agg.get(kind) {
                Some(val) => val,
                None => aggregator.percentile_95(window.t_start, window.t_end),
            };
            map.insert(kind.name().into(), serde_json::json!(val));
        }

        serde_json::Value::Object(map)
    }
}
