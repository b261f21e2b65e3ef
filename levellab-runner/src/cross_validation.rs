//! Cross-validated grid search over chronological blocks.
//!
//! The series is cut into `n_splits` contiguous blocks of `len / n_splits`
//! bars (any remainder at the end is discarded). Each candidate is scored on
//! every block independently, as its own slice, so rolling windows never see
//! a neighbouring block. The candidate's score is the mean of its block
//! scores; a candidate unscored on any block is unscored.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use levellab_core::domain::{LevelParams, ParamError, PriceBar};
use levellab_core::objective::Objective;

use crate::grid::{evaluate_candidates, SweepResults};
use crate::result::SearchResult;
use crate::space::ParamSpace;

// ─── Errors ──────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum CvError {
    #[error("n_splits must be at least 1")]
    InvalidSplits,
    #[error("insufficient data: {len} bars cannot fill {n_splits} non-empty blocks")]
    InsufficientData { len: usize, n_splits: usize },
    #[error(transparent)]
    Param(#[from] ParamError),
}

// ─── Block creation ──────────────────────────────────────────────────

/// Bar index range of one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub index: usize,
    /// Start bar index (inclusive).
    pub start: usize,
    /// End bar index (exclusive).
    pub end: usize,
}

impl Block {
    pub fn slice<'a>(&self, bars: &'a [PriceBar]) -> &'a [PriceBar] {
        &bars[self.start..self.end]
    }
}

pub fn create_blocks(len: usize, n_splits: usize) -> Result<Vec<Block>, CvError> {
    if n_splits == 0 {
        return Err(CvError::InvalidSplits);
    }
    let size = len / n_splits;
    if size == 0 {
        return Err(CvError::InsufficientData { len, n_splits });
    }

    Ok((0..n_splits)
        .map(|index| Block {
            index,
            start: index * size,
            end: (index + 1) * size,
        })
        .collect())
}

// ─── Scoring ─────────────────────────────────────────────────────────

/// Per-block scores for one candidate.
pub fn block_scores(
    bars: &[PriceBar],
    blocks: &[Block],
    objective: &Objective,
    params: LevelParams,
) -> Vec<Option<f64>> {
    blocks
        .iter()
        .map(|block| objective.score(block.slice(bars), params))
        .collect()
}

/// Mean block score, or `None` if any block is unscored.
pub fn cross_validated_score(
    bars: &[PriceBar],
    blocks: &[Block],
    objective: &Objective,
    params: LevelParams,
) -> Option<f64> {
    let scores = block_scores(bars, blocks, objective, params)
        .into_iter()
        .collect::<Option<Vec<f64>>>()?;
    if scores.is_empty() {
        return None;
    }
    Some(scores.iter().sum::<f64>() / scores.len() as f64)
}

// ─── Search ──────────────────────────────────────────────────────────

pub fn cross_validated_sweep(
    bars: &[PriceBar],
    space: &ParamSpace,
    n_splits: usize,
    objective: &Objective,
    parallel: bool,
) -> Result<SweepResults, CvError> {
    let blocks = create_blocks(bars.len(), n_splits)?;
    let candidates = space.validated(objective)?;
    info!(
        candidates = candidates.len(),
        blocks = blocks.len(),
        block_size = blocks[0].end - blocks[0].start,
        "cross-validated sweep started"
    );

    let evaluations = evaluate_candidates(&candidates, parallel, |params| {
        cross_validated_score(bars, &blocks, objective, params)
    });
    Ok(SweepResults::new(evaluations))
}

pub fn cross_validated_search(
    bars: &[PriceBar],
    space: &ParamSpace,
    n_splits: usize,
    objective: &Objective,
    parallel: bool,
) -> Result<Option<SearchResult>, CvError> {
    Ok(cross_validated_sweep(bars, space, n_splits, objective, parallel)?.best())
}
