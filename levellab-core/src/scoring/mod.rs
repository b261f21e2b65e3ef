//! Scoring: reduce a signalled run to a comparable number.
//!
//! Two methods, both reporting a buy side, a sell side, and a combined value:
//! - `Percentage`: share of price movement that happened on directionally
//!   correct bars, per side, on a 0..=100 scale. Combined = mean of sides.
//! - `AccumulatedPriceChange`: price gained from each run of signals up to the
//!   next reversal, in raw price units. Combined = sum of sides.
//!
//! An empty run is unscored (`None`). Unscored candidates never win a
//! comparison during search.

pub mod accumulated;
pub mod percentage;

pub use accumulated::{accumulated_price_changes, accumulated_score};
pub use percentage::percentage_score;

use serde::{Deserialize, Serialize};

use crate::domain::SignaledBar;

/// Which scoring method to apply.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreMethod {
    #[default]
    Percentage,
    AccumulatedPriceChange,
}

impl ScoreMethod {
    /// Score a signalled run. `None` when the run is empty.
    pub fn evaluate(&self, bars: &[SignaledBar]) -> Option<ScoreBreakdown> {
        match self {
            Self::Percentage => percentage_score(bars),
            Self::AccumulatedPriceChange => accumulated_score(bars),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Percentage => "percentage",
            Self::AccumulatedPriceChange => "accumulated_price_change",
        }
    }
}

/// Per-side scores and the value used for ranking.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub buy: f64,
    pub sell: f64,
    pub combined: f64,
}

/// `|close[i] - close[i-1]|` per bar; the first bar has none.
pub fn price_changes(bars: &[SignaledBar]) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(bars.len());
    for (i, bar) in bars.iter().enumerate() {
        if i == 0 {
            out.push(None);
        } else {
            out.push(Some((bar.bar.close - bars[i - 1].bar.close).abs()));
        }
    }
    out
}

/// One row of a scored run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredBar {
    pub bar: SignaledBar,
    pub price_change: Option<f64>,
    pub accumulated_price_change: f64,
}

/// A signalled run with its derived columns and summary score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredRun {
    pub method: ScoreMethod,
    pub rows: Vec<ScoredBar>,
    pub score: Option<ScoreBreakdown>,
}

/// Attach price-change columns and the summary score to a signalled run.
pub fn score_run(bars: &[SignaledBar], method: ScoreMethod) -> ScoredRun {
    let changes = price_changes(bars);
    let accumulated = accumulated_price_changes(bars);

    let rows = bars
        .iter()
        .zip(changes)
        .zip(accumulated)
        .map(|((bar, price_change), accumulated_price_change)| ScoredBar {
            bar: *bar,
            price_change,
            accumulated_price_change,
        })
        .collect();

    ScoredRun {
        method,
        rows,
        score: method.evaluate(bars),
    }
}

/// Signalled bars from `(open, close, signal)` rows. High/low hug the body.
#[cfg(test)]
pub fn make_signaled(rows: &[(f64, f64, crate::domain::Signal)]) -> Vec<SignaledBar> {
    use crate::domain::{AnnotatedBar, Levels};
    use crate::levels::make_ohlc_bars;

    let data: Vec<_> = rows
        .iter()
        .map(|&(open, close, _)| (open, open.max(close), open.min(close), close))
        .collect();
    make_ohlc_bars(&data)
        .into_iter()
        .zip(rows)
        .map(|(bar, &(_, _, signal))| {
            SignaledBar::new(
                AnnotatedBar {
                    bar,
                    levels: Levels {
                        rolling_max: f64::NAN,
                        rolling_min: f64::NAN,
                    },
                },
                signal,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Signal::{Buy, Sell};
    use crate::levels::{assert_approx, DEFAULT_EPSILON};

    #[test]
    fn price_change_skips_first_row() {
        let bars = make_signaled(&[(10.0, 10.0, Sell), (10.0, 9.0, Sell), (9.0, 11.5, Buy)]);
        let changes = price_changes(&bars);
        assert_eq!(changes[0], None);
        assert_approx(changes[1].unwrap(), 1.0, DEFAULT_EPSILON);
        assert_approx(changes[2].unwrap(), 2.5, DEFAULT_EPSILON);
    }

    #[test]
    fn score_run_carries_columns() {
        let bars = make_signaled(&[
            (10.0, 10.0, Sell),
            (10.0, 9.0, Sell),
            (9.0, 11.0, Buy),
            (11.0, 12.0, Buy),
        ]);
        let run = score_run(&bars, ScoreMethod::AccumulatedPriceChange);
        assert_eq!(run.rows.len(), 4);
        assert_eq!(run.rows[0].price_change, None);
        // sell run 10 -> buy at 11 is a loss of 1, booked on the last sell bar
        assert_approx(run.rows[1].accumulated_price_change, -1.0, DEFAULT_EPSILON);
        assert_eq!(run.score, ScoreMethod::AccumulatedPriceChange.evaluate(&bars));
    }

    #[test]
    fn empty_run_is_unscored() {
        assert_eq!(ScoreMethod::Percentage.evaluate(&[]), None);
        assert_eq!(ScoreMethod::AccumulatedPriceChange.evaluate(&[]), None);
        assert!(score_run(&[], ScoreMethod::Percentage).rows.is_empty());
    }
}
