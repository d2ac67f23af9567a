use crate::aggregator::AggregateKind;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, fmt::Debug, fs, ops::RangeBounds, path::Path};

/// Report configuration.
///
/// Loaded from a TOML file and validated before use.
/// See [`Config::from_file`] for loading.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Aggregated values to report for every window.
    #[serde(default = "all_kinds")]
    pub kinds: Vec<AggregateKind>,

    /// Query windows.
    pub windows: Vec<Window>,
}

/// Named query window `[t_start, t_end]` (timestamps in seconds).
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Window {
    pub name: String,
    pub t_start: i64,
    pub t_end: i64,
}

fn all_kinds() -> Vec<AggregateKind> {
    AggregateKind::ALL.to_vec()
}

impl Config {
    /// Load a [`Config`] from a file.
    ///
    /// The file must be TOML-encoded and contain a serialized [`Config`].
    /// Performs validation on all parameters before returning.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, deserialized,
    /// or if the configuration values are invalid.
    pub fn from_file<P: AsRef<Path>>(file: P) -> Result<Self> {
        let file = file.as_ref();
        let contents =
            fs::read_to_string(file).with_context(|| format!("failed to read {file:?}"))?;

        Self::from_toml(&contents)
    }

    /// Parse and validate a [`Config`] from a TOML string.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents).context("failed to deserialize config")?;

        config.validate().context("failed to validate config")?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        check_num(self.kinds.len(), 1..).context("invalid number of kinds")?;
        let mut kinds = HashSet::new();
        for kind in &self.kinds {
            if !kinds.insert(kind) {
                bail!("kind {} is listed more than once", kind.name());
            }
        }

        check_num(self.windows.len(), 1..=10_000).context("invalid number of windows")?;
        let mut names = HashSet::new();
        for (i_win, window) in self.windows.iter().enumerate() {
            window
                .validate()
                .with_context(|| format!("invalid window {i_win}"))?;
            if !names.insert(window.name.as_str()) {
                bail!("window name {:?} is used more than once", window.name);
            }
        }

        Ok(())
    }
}

impl Window {
    fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            bail!("window name must not be empty");
        }
        if self.t_end <= self.t_start {
            bail!(
                "window must end after it starts, but spans [{}, {}]",
                self.t_start,
                self.t_end
            );
        }
        Ok(())
    }
}

fn check_num<T, R>(num: T, range: R) -> Result<()>
where
    T: PartialOrd + Debug,
    R: RangeBounds<T> + Debug,
{
    if !range.contains(&num) {
        bail!("number must be in the range {range:?}, but is {num:?}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_windows_and_kinds() {
        let config = Config::from_toml(
            r#"
kinds = ["MIN", "MAX", "95PCT"]

[[windows]]
name = "morning"
t_start = 0
t_end = 43200
"#,
        )
        .unwrap();
        assert_eq!(
            config.kinds,
            vec![
                AggregateKind::Min,
                AggregateKind::Max,
                AggregateKind::Percentile95
            ]
        );
        assert_eq!(
            config.windows,
            vec![Window {
                name: "morning".to_string(),
                t_start: 0,
                t_end: 43200,
            }]
        );
    }

    #[test]
    fn kinds_default_to_all() {
        let config = Config::from_toml(
            r#"
[[windows]]
name = "all"
t_start = -10
t_end = 10
"#,
        )
        .unwrap();
        assert_eq!(config.kinds, AggregateKind::ALL.to_vec());
    }

    #[test]
    fn accepts_window_limit() {
        let windows = (0..10_000)
            .map(|i_win| format!("[[windows]]\nname = \"w{i_win}\"\nt_start = 0\nt_end = 10\n"))
            .collect::<String>();
        let config = Config::from_toml(&windows).unwrap();
        assert_eq!(config.windows.len(), 10_000);
    }

    #[test]
    fn rejects_invalid_config() {
        let empty_window = "[[windows]]\nname = \"w\"\nt_start = 10\nt_end = 10\n";
        assert!(Config::from_toml(empty_window).is_err());

        let no_windows = "kinds = [\"MIN\"]\nwindows = []\n";
        assert!(Config::from_toml(no_windows).is_err());

        let no_kinds = "kinds = []\n[[windows]]\nname = \"w\"\nt_start = 0\nt_end = 10\n";
        assert!(Config::from_toml(no_kinds).is_err());

        let unknown_kind = "kinds = [\"MEDIAN\"]\n[[windows]]\nname = \"w\"\nt_start = 0\nt_end = 10\n";
        assert!(Config::from_toml(unknown_kind).is_err());

        let dup_kind = "kinds = [\"MIN\", \"MIN\"]\n[[windows]]\nname = \"w\"\nt_start = 0\nt_end = 10\n";
        assert!(Config::from_toml(dup_kind).is_err());

        let dup_name = String::new()
            + "[[windows]]\nname = \"w\"\nt_start = 0\nt_end = 10\n"
            + "[[windows]]\nname = \"w\"\nt_start = 10\nt_end = 20\n";
        assert!(Config::from_toml(&dup_name).is_err());

        let too_many_windows = (0..=10_000)
            .map(|i_win| format!("[[windows]]\nname = \"w{i_win}\"\nt_start = 0\nt_end = 10\n"))
            .collect::<String>();
        assert!(Config::from_toml(&too_many_windows).is_err());

        let unnamed = "[[windows]]\nname = \"\"\nt_start = 0\nt_end = 10\n";
        assert!(Config::from_toml(unnamed).is_err());
    }
}
