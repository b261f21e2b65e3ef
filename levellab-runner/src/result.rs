//! Search results and the arg-max reduction shared by every strategy.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use levellab_core::domain::{LevelParams, ParamError};

/// A scored parameter pair. Loading one with a zero window fails.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawSearchResult")]
pub struct SearchResult {
    pub window_size: usize,
    pub bias: usize,
    pub score: f64,
}

#[derive(Deserialize)]
struct RawSearchResult {
    window_size: usize,
    bias: usize,
    score: f64,
}

impl TryFrom<RawSearchResult> for SearchResult {
    type Error = ParamError;

    fn try_from(raw: RawSearchResult) -> Result<Self, Self::Error> {
        let params = LevelParams::try_new(raw.window_size, raw.bias)?;
        Ok(Self::new(params, raw.score))
    }
}

impl SearchResult {
    pub fn new(params: LevelParams, score: f64) -> Self {
        Self {
            window_size: params.window_size,
            bias: params.bias,
            score,
        }
    }

    /// Panics if `window_size` is zero, which neither the searches nor
    /// deserialization can produce.
    pub fn params(&self) -> LevelParams {
        LevelParams::new(self.window_size, self.bias)
    }
}

/// One candidate and its score; `None` means unscored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub params: LevelParams,
    pub score: Option<f64>,
}

impl Evaluation {
    /// The candidate as a result, if it scored.
    pub fn result(&self) -> Option<SearchResult> {
        match self.score {
            Some(score) if !score.is_nan() => Some(SearchResult::new(self.params, score)),
            _ => None,
        }
    }
}

/// Arg-max over evaluations in order. A candidate replaces the current best
/// only with a strictly greater score, so ties keep the first one seen.
pub fn best_of<'a, I>(evaluations: I) -> Option<SearchResult>
where
    I: IntoIterator<Item = &'a Evaluation>,
{
    evaluations
        .into_iter()
        .filter_map(Evaluation::result)
        .fold(None, |best, candidate| match best {
            Some(best) if candidate.score <= best.score => Some(best),
            _ => Some(candidate),
        })
}

/// Scored candidates, best first, one entry per parameter pair. The sort is
/// stable, so equal scores keep evaluation order.
pub fn ranked<'a, I>(evaluations: I) -> Vec<SearchResult>
where
    I: IntoIterator<Item = &'a Evaluation>,
{
    let mut sorted: Vec<SearchResult> = evaluations
        .into_iter()
        .filter_map(Evaluation::result)
        .collect();
    sorted.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let mut seen = HashSet::new();
    sorted.retain(|r| seen.insert(r.params()));
    sorted
}
