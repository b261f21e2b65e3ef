//! Search configuration loaded from TOML.
//!
//! ```toml
//! [data]
//! path = "data/GER30_D1.csv"
//! symbol = "GER30"
//! count = 2000
//!
//! [pipeline]
//! classifier = "breakout"
//! score = "percentage"
//!
//! [space]
//! window = { start = 5, stop = 60 }
//! bias = { start = 1, stop = 4 }
//!
//! [search]
//! type = "genetic"
//! generations = 10
//!
//! [output]
//! dir = "results"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use levellab_core::data::{BarRequest, CsvSource, MarketDataSource, SyntheticShape, SyntheticSource};
use levellab_core::fingerprint::ConfigHash;
use levellab_core::objective::PipelineConfig;

use crate::genetic::{GeneticConfig, GeneticError};
use crate::space::{Candidates, ParamSpace};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("[data] needs either `path` or a [data.synthetic] table")]
    NoDataSource,
    #[error("[data] delimiter must be a single ASCII character, got {0:?}")]
    Delimiter(String),
    #[error("[space] {axis} range has a zero step")]
    ZeroStep { axis: &'static str },
    #[error("[space] {len} candidate pairs exceeds the limit of {max}")]
    SpaceTooLarge { len: usize, max: usize },
    #[error("[data] symbol {0:?} must be non-empty and free of path separators")]
    InvalidSymbol(String),
    #[error("[search] n_splits must be at least 1")]
    InvalidSplits,
    #[error("[search] {0}")]
    Genetic(#[from] GeneticError),
    #[error("failed to hash config: {0}")]
    Hash(#[from] serde_json::Error),
}

/// Largest grid a config may describe.
pub const MAX_CANDIDATES: usize = 1_000_000;

// ─── Sections ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticConfig {
    #[serde(flatten)]
    pub shape: SyntheticShape,
    #[serde(default = "default_synthetic_bars")]
    pub bars: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_synthetic_bars() -> usize {
    500
}

fn default_seed() -> u64 {
    42
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    pub symbol: String,
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Keep only the most recent `count` bars.
    #[serde(default)]
    pub count: Option<usize>,
    #[serde(default)]
    pub delimiter: Option<String>,
    #[serde(default)]
    pub synthetic: Option<SyntheticConfig>,
}

impl DataConfig {
    pub fn request(&self) -> BarRequest {
        BarRequest {
            symbol: self.symbol.clone(),
            count: self.count,
        }
    }

    /// CSV when `path` is set, otherwise the synthetic generator.
    pub fn source(&self) -> Result<Box<dyn MarketDataSource>, ConfigError> {
        if let Some(path) = &self.path {
            let mut source = CsvSource::new(path);
            if let Some(delimiter) = &self.delimiter {
                source = source.with_delimiter(parse_delimiter(delimiter)?);
            }
            return Ok(Box::new(source));
        }
        match &self.synthetic {
            Some(synth) => Ok(Box::new(SyntheticSource::new(
                synth.shape,
                synth.bars,
                synth.seed,
            ))),
            None => Err(ConfigError::NoDataSource),
        }
    }
}

/// Symbols name files and artifact directories, so they stay one path
/// component.
pub fn is_valid_symbol(symbol: &str) -> bool {
    !symbol.is_empty()
        && symbol != "."
        && symbol != ".."
        && !symbol.contains(&['/', '\\', '\0'][..])
}

fn parse_delimiter(text: &str) -> Result<u8, ConfigError> {
    let text = if text == "\\t" { "\t" } else { text };
    match text.as_bytes() {
        [byte] if byte.is_ascii() => Ok(*byte),
        _ => Err(ConfigError::Delimiter(text.to_string())),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceConfig {
    pub window: Candidates,
    #[serde(default = "default_bias")]
    pub bias: Candidates,
}

fn default_bias() -> Candidates {
    Candidates::List(vec![1])
}

impl SpaceConfig {
    pub fn to_space(&self) -> ParamSpace {
        ParamSpace::new(self.window.clone(), self.bias.clone())
    }
}

/// Which search to run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SearchStrategy {
    #[default]
    Grid,
    CrossValidated {
        #[serde(default = "default_n_splits")]
        n_splits: usize,
    },
    Genetic(GeneticConfig),
}

fn default_n_splits() -> usize {
    5
}

impl SearchStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Grid => "grid",
            Self::CrossValidated { .. } => "cross_validated",
            Self::Genetic(_) => "genetic",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub top_n: usize,
    pub parallel: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("results"),
            top_n: 10,
            parallel: true,
        }
    }
}

// ─── Top level ───────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    pub data: DataConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    pub space: SpaceConfig,
    #[serde(default)]
    pub search: SearchStrategy,
    #[serde(default)]
    pub output: OutputConfig,
}

/// The parts of a config that change results. Output settings don't.
#[derive(Serialize)]
struct RunIdentity<'a> {
    data: &'a DataConfig,
    pipeline: &'a PipelineConfig,
    space: &'a SpaceConfig,
    search: &'a SearchStrategy,
}

impl SearchConfig {
    /// Load and validate a config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a config string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.data.path.is_none() && self.data.synthetic.is_none() {
            return Err(ConfigError::NoDataSource);
        }
        if !is_valid_symbol(&self.data.symbol) {
            return Err(ConfigError::InvalidSymbol(self.data.symbol.clone()));
        }
        if let Some(delimiter) = &self.data.delimiter {
            parse_delimiter(delimiter)?;
        }
        for (axis, candidates) in [("window", &self.space.window), ("bias", &self.space.bias)] {
            if let Candidates::Range(range) = candidates {
                if range.step == 0 {
                    return Err(ConfigError::ZeroStep { axis });
                }
            }
        }
        let len = self.space.window.len().saturating_mul(self.space.bias.len());
        if len > MAX_CANDIDATES {
            return Err(ConfigError::SpaceTooLarge {
                len,
                max: MAX_CANDIDATES,
            });
        }
        match &self.search {
            SearchStrategy::Grid => {}
            SearchStrategy::CrossValidated { n_splits } => {
                if *n_splits == 0 {
                    return Err(ConfigError::InvalidSplits);
                }
            }
            SearchStrategy::Genetic(genetic) => genetic.validate()?,
        }
        Ok(())
    }

    /// BLAKE3 over the canonical JSON of everything that affects results.
    pub fn config_hash(&self) -> Result<ConfigHash, ConfigError> {
        Ok(ConfigHash::of(&RunIdentity {
            data: &self.data,
            pipeline: &self.pipeline,
            space: &self.space,
            search: &self.search,
        })?)
    }
}
