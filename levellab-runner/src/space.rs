//! Candidate space for `(window_size, bias)`.
//!
//! Each axis is an explicit list or a half-open integer range with a step,
//! the way research scripts write `range(5, 60)`. Raw values stay signed
//! integers until the objective validates them, so a coercing pipeline sees
//! exactly what the caller wrote.

use serde::{Deserialize, Serialize};

use levellab_core::domain::{LevelParams, ParamError};
use levellab_core::objective::Objective;

/// Half-open `start..stop` with a nonzero step (may be negative).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntRange {
    pub start: i64,
    pub stop: i64,
    #[serde(default = "default_step")]
    pub step: i64,
}

fn default_step() -> i64 {
    1
}

impl IntRange {
    pub fn new(start: i64, stop: i64) -> Self {
        Self {
            start,
            stop,
            step: 1,
        }
    }

    pub fn with_step(mut self, step: i64) -> Self {
        self.step = step;
        self
    }

    /// Number of values, computed without materializing them.
    pub fn len(&self) -> usize {
        let (start, stop, step) = (self.start as i128, self.stop as i128, self.step as i128);
        let span = match step.signum() {
            1 if stop > start => stop - start,
            -1 if start > stop => start - stop,
            _ => return 0,
        };
        let count = (span + step.abs() - 1) / step.abs();
        usize::try_from(count).unwrap_or(usize::MAX)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Values in range order. A zero step yields nothing.
    pub fn values(&self) -> Vec<i64> {
        let mut out = Vec::with_capacity(self.len().min(1 << 16));
        let mut next = Some(self.start);
        while let Some(v) = next {
            let inside = match self.step.signum() {
                1 => v < self.stop,
                -1 => v > self.stop,
                _ => false,
            };
            if !inside {
                break;
            }
            out.push(v);
            next = v.checked_add(self.step);
        }
        out
    }
}

/// One axis of the space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Candidates {
    List(Vec<i64>),
    Range(IntRange),
}

impl Candidates {
    pub fn len(&self) -> usize {
        match self {
            Self::List(values) => values.len(),
            Self::Range(range) => range.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn values(&self) -> Vec<i64> {
        match self {
            Self::List(values) => values.clone(),
            Self::Range(range) => range.values(),
        }
    }
}

impl From<IntRange> for Candidates {
    fn from(range: IntRange) -> Self {
        Self::Range(range)
    }
}

impl From<Vec<i64>> for Candidates {
    fn from(values: Vec<i64>) -> Self {
        Self::List(values)
    }
}

/// Window sizes and biases to search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamSpace {
    pub window_sizes: Vec<i64>,
    pub biases: Vec<i64>,
}

impl ParamSpace {
    pub fn new(window: impl Into<Candidates>, bias: impl Into<Candidates>) -> Self {
        Self {
            window_sizes: window.into().values(),
            biases: bias.into().values(),
        }
    }

    /// Number of grid pairs.
    pub fn len(&self) -> usize {
        self.window_sizes.len() * self.biases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw grid pairs, window outer and bias inner.
    pub fn pairs(&self) -> Vec<(i64, i64)> {
        self.window_sizes
            .iter()
            .flat_map(|&w| self.biases.iter().map(move |&b| (w, b)))
            .collect()
    }

    /// Grid pairs validated with the objective's validation mode.
    pub fn validated(&self, objective: &Objective) -> Result<Vec<LevelParams>, ParamError> {
        self.pairs()
            .into_iter()
            .map(|(w, b)| objective.params(w as f64, b as f64))
            .collect()
    }
}
