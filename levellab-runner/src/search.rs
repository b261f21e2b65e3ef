//! Search runner: wires config, data, objective and strategy together.
//!
//! Two entry points:
//! - `run_search()`: loads bars from the configured source, then searches.
//!   Used by the CLI.
//! - `run_search_on_bars()`: takes pre-loaded bars.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use levellab_core::data::DataError;
use levellab_core::domain::{ParamError, PriceBar};
use levellab_core::fingerprint::DatasetHash;
use levellab_core::objective::{Objective, PipelineConfig};
use levellab_core::scoring::{ScoreBreakdown, ScoredRun};

use crate::config::{ConfigError, SearchConfig, SearchStrategy};
use crate::cross_validation::{cross_validated_sweep, CvError};
use crate::genetic::{GenerationStats, GeneticError, GeneticSearch};
use crate::grid::GridSweep;
use crate::result::{ranked, Evaluation, SearchResult};

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] DataError),
    #[error("invalid parameters: {0}")]
    Param(#[from] ParamError),
    #[error("cross-validation error: {0}")]
    Cv(#[from] CvError),
    #[error("genetic search error: {0}")]
    Genetic(#[from] GeneticError),
    #[error("no data to search over for '{symbol}'")]
    NoData { symbol: String },
}

/// Current schema version for persisted reports.
pub const SCHEMA_VERSION: u32 = 1;

/// Genetic-only details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneticSummary {
    pub best_seen: Option<SearchResult>,
    pub generations: Vec<GenerationStats>,
}

/// Complete record of one search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchReport {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub symbol: String,
    pub strategy: String,
    pub pipeline: PipelineConfig,
    pub config_hash: String,
    pub dataset_hash: String,
    pub bar_count: usize,
    pub first_bar: Option<NaiveDateTime>,
    pub last_bar: Option<NaiveDateTime>,
    pub best: Option<SearchResult>,
    /// Full-series breakdown for the best parameters.
    pub best_breakdown: Option<ScoreBreakdown>,
    pub candidates_evaluated: usize,
    pub top: Vec<SearchResult>,
    /// Every candidate in evaluation order (final population for genetic).
    #[serde(default)]
    pub candidates: Vec<Evaluation>,
    #[serde(default)]
    pub genetic: Option<GeneticSummary>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// A finished search: the report plus the best parameters' scored run.
#[derive(Debug, Clone)]
pub struct SearchRun {
    pub report: SearchReport,
    pub best_run: Option<ScoredRun>,
}

/// Load bars from the configured source, then search.
pub fn run_search(config: &SearchConfig) -> Result<SearchRun, SearchError> {
    let source = config.data.source()?;
    let request = config.data.request();
    info!(source = source.name(), symbol = %request.symbol, "loading bars");

    let bars = match source.fetch(&request) {
        Ok(bars) => bars,
        Err(DataError::Empty { symbol }) => {
            warn!(%symbol, "data source returned no bars");
            return Err(SearchError::NoData { symbol });
        }
        Err(e) => return Err(e.into()),
    };

    run_search_on_bars(config, &bars)
}

/// Search over pre-loaded bars.
pub fn run_search_on_bars(config: &SearchConfig, bars: &[PriceBar]) -> Result<SearchRun, SearchError> {
    let symbol = config.data.symbol.clone();
    if bars.is_empty() {
        warn!(%symbol, "no bars to search over");
        return Err(SearchError::NoData { symbol });
    }

    let objective = Objective::new(config.pipeline);
    let space = config.space.to_space();
    let parallel = config.output.parallel;
    let config_hash = config.config_hash()?;
    let dataset_hash = DatasetHash::of(bars);

    info!(
        %symbol,
        strategy = config.search.name(),
        classifier = config.pipeline.classifier.name(),
        score = config.pipeline.score.name(),
        bars = bars.len(),
        candidates = space.len(),
        config_hash = config_hash.short(),
        "search started"
    );

    let (best, candidates, candidates_evaluated, genetic) = match &config.search {
        SearchStrategy::Grid => {
            let results = GridSweep::new(&objective)
                .with_parallelism(parallel)
                .sweep(bars, &space)?;
            (results.best(), results.all().to_vec(), results.len(), None)
        }
        SearchStrategy::CrossValidated { n_splits } => {
            let results = cross_validated_sweep(bars, &space, *n_splits, &objective, parallel)?;
            (results.best(), results.all().to_vec(), results.len(), None)
        }
        SearchStrategy::Genetic(genetic) => {
            let outcome = GeneticSearch::new(&objective, genetic.clone())
                .with_parallelism(parallel)
                .run(bars, &space)?;
            let summary = GeneticSummary {
                best_seen: outcome.best_seen,
                generations: outcome.generations,
            };
            (
                outcome.best,
                outcome.population,
                outcome.evaluations,
                Some(summary),
            )
        }
    };

    let best_run = best.map(|b| objective.scored_run(bars, b.params()));
    let best_breakdown = best_run.as_ref().and_then(|run| run.score);

    match &best {
        Some(b) => info!(
            window_size = b.window_size,
            bias = b.bias,
            score = b.score,
            candidates_evaluated,
            "search finished"
        ),
        None => warn!(candidates_evaluated, "search finished without a scored candidate"),
    }

    let report = SearchReport {
        schema_version: SCHEMA_VERSION,
        symbol,
        strategy: config.search.name().to_string(),
        pipeline: config.pipeline,
        config_hash: config_hash.0,
        dataset_hash: dataset_hash.0,
        bar_count: bars.len(),
        first_bar: bars.first().map(|b| b.timestamp),
        last_bar: bars.last().map(|b| b.timestamp),
        best,
        best_breakdown,
        candidates_evaluated,
        top: ranked(&candidates).into_iter().take(config.output.top_n).collect(),
        candidates,
        genetic,
    };

    Ok(SearchRun { report, best_run })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(search: &str) -> SearchConfig {
        SearchConfig::from_toml(&format!(
            r#"
            [data]
            symbol = "SINE"
            [data.synthetic]
            shape = "sine"
            period = 30.0
            amplitude = 8.0
            bars = 240
            seed = 3

            [space]
            window = {{ start = 3, stop = 12 }}
            bias = [0, 1]

            [search]
            {search}

            [output]
            top_n = 3
            "#
        ))
        .unwrap()
    }

    #[test]
    fn grid_report_is_complete() {
        let run = run_search(&config(r#"type = "grid""#)).unwrap();
        let report = &run.report;
        assert_eq!(report.strategy, "grid");
        assert_eq!(report.bar_count, 240);
        assert_eq!(report.candidates_evaluated, 18);
        assert_eq!(report.candidates.len(), 18);
        assert_eq!(report.top.len(), 3);
        assert_eq!(report.top[0], report.best.unwrap());
        assert!(report.genetic.is_none());

        let best_run = run.best_run.unwrap();
        assert_eq!(best_run.score, report.best_breakdown);
        assert_eq!(best_run.score.map(|s| s.combined), report.best.map(|b| b.score));
    }

    #[test]
    fn genetic_report_carries_generations() {
        let run = run_search(&config(
            r#"
            type = "genetic"
            generations = 4
            "#,
        ))
        .unwrap();
        let genetic = run.report.genetic.unwrap();
        assert_eq!(genetic.generations.len(), 4);
        assert!(!run.report.candidates.is_empty() && run.report.candidates.len() <= 10);
        assert!(run.report.best.is_some());
    }

    #[test]
    fn cross_validated_best_is_block_mean() {
        let run = run_search(&config(
            r#"
            type = "cross_validated"
            n_splits = 3
            "#,
        ))
        .unwrap();
        assert_eq!(run.report.strategy, "cross_validated");
        assert_eq!(run.report.candidates_evaluated, 18);
    }

    #[test]
    fn searches_replay() {
        let cfg = config(r#"type = "genetic""#);
        let a = run_search(&cfg).unwrap().report;
        let b = run_search(&cfg).unwrap().report;
        assert_eq!(a, b);
    }

    #[test]
    fn empty_bars_is_no_data() {
        let err = run_search_on_bars(&config(r#"type = "grid""#), &[]).unwrap_err();
        assert!(matches!(err, SearchError::NoData { .. }));
    }
}
