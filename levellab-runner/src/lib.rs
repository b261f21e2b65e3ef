//! LevelLab Runner: parameter search orchestration on top of `levellab-core`.
//!
//! This crate provides:
//! - Candidate spaces from explicit lists or integer ranges
//! - Exhaustive grid search with optional rayon parallelism
//! - Blocked cross-validation (each block scored independently)
//! - A seeded (mu + lambda) genetic search
//! - TOML run configs, config/dataset fingerprints, JSON and CSV reports

pub mod config;
pub mod cross_validation;
pub mod export;
pub mod genetic;
pub mod grid;
pub mod result;
pub mod search;
pub mod space;

pub use config::{
    ConfigError, DataConfig, OutputConfig, SearchConfig, SearchStrategy, SpaceConfig,
    SyntheticConfig,
};
pub use cross_validation::{
    block_scores, create_blocks, cross_validated_score, cross_validated_search,
    cross_validated_sweep, Block, CvError,
};
pub use export::{
    export_candidates_csv, export_json, export_signals_csv, import_json, load_report,
    save_artifacts,
};
pub use genetic::{
    genetic_search, GenerationStats, GeneticConfig, GeneticError, GeneticOutcome, GeneticSearch,
};
pub use grid::{evaluate_candidates, grid_search, GridSweep, SweepResults};
pub use result::{best_of, ranked, Evaluation, SearchResult};
pub use search::{
    run_search, run_search_on_bars, GeneticSummary, SearchError, SearchReport, SearchRun,
    SCHEMA_VERSION,
};
pub use space::{Candidates, IntRange, ParamSpace};
