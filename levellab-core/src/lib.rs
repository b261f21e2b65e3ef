//! LevelLab Core: price bars, rolling levels, signal classifiers, scoring.
//!
//! This crate contains the pure pipeline evaluated for every parameter
//! candidate:
//! - Domain types (bars, levels, signals, validated parameters)
//! - Rolling support/resistance annotation with a bias shift
//! - Breakout and rebound classifiers with explicit tie-breaking
//! - Percentage-quality and accumulated-price-change scoring
//! - The `Objective` that chains them for search
//! - Market-data sources (CSV exports, synthetic series)
//! - Feature registry, dataset fingerprints, deterministic RNG hierarchy
//!
//! Nothing here logs or touches global state.

pub mod data;
pub mod domain;
pub mod features;
pub mod fingerprint;
pub mod levels;
pub mod objective;
pub mod rng;
pub mod scoring;
pub mod signals;
