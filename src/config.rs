// imports
use crate::context::ContextWindow;
use crate::error::{CoocError, Result};
use crate::subsampling::{DroppedTokens, Subsampler};
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::thread;


#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowKind {
    #[default]
    Window,
    Sentence,
}

/// Context window parameters as written in a configuration file.
/// `before`/`after`, when given, override `half_size` on their side.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub kind: WindowKind,
    pub half_size: usize,
    pub before: Option<usize>,
    pub after: Option<usize>,
    pub dirty: bool,
    pub dynamic: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self { kind: WindowKind::Window, half_size: 1, before: None, after: None, dirty: false, dynamic: false }
    }
}

impl WindowConfig {

    pub fn symmetric(half_size: usize) -> Self {
        Self { half_size, ..Self::default() }
    }

    pub fn to_window(&self) -> ContextWindow {
        match self.kind {
            WindowKind::Sentence => ContextWindow::Sentence,
            WindowKind::Window => ContextWindow::asymmetric(
                self.before.unwrap_or(self.half_size),
                self.after.unwrap_or(self.half_size),
            )
            .dirty(self.dirty)
            .dynamic(self.dynamic),
        }
    }
}


/// Parameters of one counting run. Every field has a default, so a
/// configuration file only needs the values it changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CountingConfig {
    /// Free-form description of the corpus, carried into the metadata.
    pub corpus: String,
    pub window: WindowConfig,
    pub subsampling: bool,
    pub threshold: f64,
    pub dropped_tokens: DroppedTokens,
    /// Worker pool size; defaults to the available parallelism minus one.
    pub num_workers: Option<usize>,
    /// Sentences per shard.
    pub shard_size: usize,
    pub seed: u64,
}

impl Default for CountingConfig {
    fn default() -> Self {
        Self {
            corpus: String::new(),
            window: WindowConfig::default(),
            subsampling: false,
            threshold: Subsampler::DEFAULT_THRESHOLD,
            dropped_tokens: DroppedTokens::KeepAsContext,
            num_workers: None,
            shard_size: 10_000,
            seed: 0,
        }
    }
}

impl Display for CountingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "counting parameters:
        corpus: {}
        window: {:?}
        subsampling: {} (threshold {}, dropped tokens {:?})
        num_workers: {}
        shard_size: {}
        seed: {}",
        self.corpus, self.window.to_window(), self.subsampling, self.threshold, self.dropped_tokens,
        self.workers(), self.shard_size, self.seed
        )
    }
}

impl CountingConfig {

    pub fn from_json_str(json: &str) -> Result<CountingConfig> {
        let config: CountingConfig = serde_json::from_str(json)?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<CountingConfig> {
        let f = BufReader::new(File::open(path)?);
        let config: CountingConfig = serde_json::from_reader(f)?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Effective pool size.
    pub fn workers(&self) -> usize {
        match self.num_workers {
            Some(n) => n,
            None => thread::available_parallelism()
                .map(|n| n.get().saturating_sub(1))
                .unwrap_or(1)
                .max(1),
        }
    }

    /// Checks everything that can be checked before a run starts.
    pub fn validate(&self) -> Result<()> {
        if self.num_workers == Some(0) {
            return Err(CoocError::Config("num_workers must be at least 1".to_string()))
        }
        if self.shard_size == 0 {
            return Err(CoocError::Config("shard_size must be at least 1".to_string()))
        }
        if self.subsampling && !(self.threshold > 0.0 && self.threshold < 1.0) {
            return Err(CoocError::Config(format!("subsampling threshold must be in (0, 1), got {}", self.threshold)))
        }
        if self.window.dynamic && self.window.kind == WindowKind::Sentence {
            tracing::warn!("dynamic has no effect on a sentence context");
        }
        Ok(())
    }
}


/// What a run was computed from, kept next to the matrix so that it can be
/// reproduced or looked up in a cache.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CountingMetadata {
    pub corpus: String,
    pub window: ContextWindow,
    pub subsampling: bool,
    pub threshold: Option<f64>,
    pub dropped_tokens: DroppedTokens,
    pub dynamic_contexts: bool,
    pub seed: u64,
    pub shard_size: usize,
    pub num_workers: usize,
    pub sentences: usize,
}

impl CountingMetadata {

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}


#[cfg(test)]
mod tests {

    use super::{CountingConfig, WindowConfig, WindowKind};
    use crate::context::ContextWindow;
    use crate::subsampling::DroppedTokens;

    #[test]
    fn defaults_from_empty_json() {
        let config = CountingConfig::from_json_str("{}").unwrap();
        assert_eq!(config, CountingConfig::default());
        assert_eq!(config.window.to_window(), ContextWindow::symmetric(1));
        assert!(config.workers() >= 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn json_overrides() {
        let json = r#"{
            "corpus": "toy",
            "window": {"half_size": 3, "after": 1, "dirty": true},
            "subsampling": true,
            "threshold": 0.001,
            "dropped_tokens": "remove",
            "num_workers": 2,
            "shard_size": 5,
            "seed": 42
        }"#;
        let config = CountingConfig::from_json_str(json).unwrap();

        assert_eq!(config.corpus, "toy");
        assert_eq!(config.window.to_window(), ContextWindow::asymmetric(3, 1).dirty(true));
        assert_eq!(config.dropped_tokens, DroppedTokens::Remove);
        assert_eq!(config.workers(), 2);
        assert_eq!(config.seed, 42);
        assert!(config.validate().is_ok());

        // round trip through the pretty printer
        let again = CountingConfig::from_json_str(&config.to_json().unwrap()).unwrap();
        assert_eq!(again, config);
    }

    #[test]
    fn sentence_window() {
        let window = WindowConfig { kind: WindowKind::Sentence, ..WindowConfig::default() };
        assert_eq!(window.to_window(), ContextWindow::Sentence);
    }

    #[test]
    fn invalid_configurations() {
        let bad_workers = CountingConfig { num_workers: Some(0), ..CountingConfig::default() };
        assert!(bad_workers.validate().is_err());

        let bad_shard = CountingConfig { shard_size: 0, ..CountingConfig::default() };
        assert!(bad_shard.validate().is_err());

        let bad_threshold = CountingConfig { subsampling: true, threshold: 1.5, ..CountingConfig::default() };
        assert!(bad_threshold.validate().is_err());

        // threshold is only checked when subsampling is on
        let unused_threshold = CountingConfig { subsampling: false, threshold: 1.5, ..CountingConfig::default() };
        assert!(unused_threshold.validate().is_ok());

        // a negative half size is rejected by the parser
        assert!(CountingConfig::from_json_str(r#"{"window": {"half_size": -1}}"#).is_err());
    }
}
