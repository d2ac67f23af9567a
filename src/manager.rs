use crate::config::Config;
use crate::data::SeriesData;
use crate::report::Reporter;
use anyhow::{Context, Result};
use glob::{Pattern, glob};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Runs reports over the series files of a data directory.
pub struct Manager {
    data_dir: PathBuf,
    cfg: Config,
}

impl Manager {
    pub fn new<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();

        let cfg =
            Config::from_file(data_dir.join("config.toml")).context("failed to construct cfg")?;
        log::info!("{cfg:#?}");

        Ok(Self { data_dir, cfg })
    }

    pub fn aggregate(&self) -> Result<()> {
        let reporter = Reporter::new(self.cfg.clone());

        let series_files = self.series_files().context("failed to list series files")?;
        if series_files.is_empty() {
            log::warn!("no series files found in {:?}", self.data_dir);
        }

        for series_file in series_files {
            let data = SeriesData::from_file(&series_file)
                .with_context(|| format!("failed to load {series_file:?}"))?;
            log::info!("loaded {series_file:?}");

            let report = reporter
                .report(&data)
                .with_context(|| format!("failed to report {series_file:?}"))?;

            let results_file = self.results_file(&series_file)?;
            reporter
                .save_report(&report, &results_file)
                .context("failed to save report")?;
            log::info!("saved {results_file:?}");
        }

        Ok(())
    }

    pub fn clean(&self) -> Result<()> {
        let results_files = self
            .glob_files("results-*.json")
            .context("failed to list results files")?;

        for results_file in results_files {
            fs::remove_file(&results_file)
                .with_context(|| format!("failed to remove {results_file:?}"))?;
            log::info!("removed {results_file:?}");
        }

        Ok(())
    }

    fn series_files(&self) -> Result<Vec<PathBuf>> {
        self.glob_files("series-*.msgpack")
    }

    fn glob_files(&self, pattern: &str) -> Result<Vec<PathBuf>> {
        let data_dir = self.data_dir.to_str().context("data dir is not valid UTF-8")?;
        let pattern = Path::new(&Pattern::escape(data_dir)).join(pattern);
        let pattern = pattern.to_str().context("pattern is not valid UTF-8")?;
        let files = glob(pattern)
            .context("failed to glob files")?
            .filter_map(Result::ok)
            .filter(|p| p.is_file())
            .collect();
        Ok(files)
    }

    fn results_file(&self, series_file: &Path) -> Result<PathBuf> {
        let stem = series_file
            .file_stem()
            .and_then(|stem| stem.to_str())
            .context("series file name is not valid UTF-8")?;
        let name = stem.strip_prefix("series-").unwrap_or(stem);
        Ok(self.data_dir.join(format!("results-{name}.json")))
    }
}
