//! Accumulated-price-change score.
//!
//! Each signal run is valued from its first bar's close to the first close of
//! the following run: a sell run earns `start - end`, a buy run `end - start`.
//! The value is booked on the run's last bar, so a bar's
//! `accumulated_price_change` always belongs to the signal it carries. The
//! final run has no reversal yet and books nothing.

use crate::domain::{Signal, SignaledBar};

use super::ScoreBreakdown;

/// Per-bar accumulated price change column (zero except on run-closing bars).
pub fn accumulated_price_changes(bars: &[SignaledBar]) -> Vec<f64> {
    let mut column = vec![0.0; bars.len()];

    let run_starts: Vec<usize> = (0..bars.len())
        .filter(|&i| i == 0 || bars[i].signal != bars[i - 1].signal)
        .collect();

    for pair in run_starts.windows(2) {
        let (start, next) = (pair[0], pair[1]);
        let start_close = bars[start].bar.close;
        let next_close = bars[next].bar.close;
        let change = match bars[start].signal {
            Signal::Sell => start_close - next_close,
            Signal::Buy => next_close - start_close,
        };
        column[next - 1] = change;
    }

    column
}

pub fn accumulated_score(bars: &[SignaledBar]) -> Option<ScoreBreakdown> {
    if bars.is_empty() {
        return None;
    }

    let column = accumulated_price_changes(bars);
    let mut buy = 0.0;
    let mut sell = 0.0;
    for (bar, change) in bars.iter().zip(column) {
        match bar.signal {
            Signal::Buy => buy += change,
            Signal::Sell => sell += change,
        }
    }

    Some(ScoreBreakdown {
        buy,
        sell,
        combined: buy + sell,
    })
}
