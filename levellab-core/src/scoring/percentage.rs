//! Percentage-quality score.
//!
//! Walks the run once. Every bar's price change goes into the denominator of
//! the side its signal names. It also goes into that side's numerator when the
//! bar moved the signalled way (close < open for sell, close > open for buy).
//!
//! Crossover rule: when a correct bar follows correct bars of the opposite
//! side, its price change is also credited once to the opposite side's
//! numerator and denominator, and that side's streak counter resets. After the
//! walk, a side with an open streak is credited the last bar's price change.
//!
//! Every row takes part in the streak bookkeeping. The first row has no
//! price change, so it adds nothing to either sum.
//!
//! A side with an empty denominator scores 0.0.

use crate::domain::{Signal, SignaledBar};

use super::{price_changes, ScoreBreakdown};

#[derive(Debug, Default)]
struct Side {
    correct: f64,
    total: f64,
    streak: usize,
}

impl Side {
    fn credit(&mut self, change: f64) {
        self.correct += change;
        self.total += change;
    }

    fn percentage(&self) -> f64 {
        if self.total == 0.0 {
            0.0
        } else {
            self.correct / self.total * 100.0
        }
    }
}

pub fn percentage_score(bars: &[SignaledBar]) -> Option<ScoreBreakdown> {
    if bars.is_empty() {
        return None;
    }

    let changes = price_changes(bars);
    let mut buy = Side::default();
    let mut sell = Side::default();
    let mut last_change = None;

    for (bar, change) in bars.iter().zip(&changes) {
        if change.is_some() {
            last_change = *change;
        }

        let (own, other, correct) = match bar.signal {
            Signal::Sell => (&mut sell, &mut buy, bar.bar.close < bar.bar.open),
            Signal::Buy => (&mut buy, &mut sell, bar.bar.close > bar.bar.open),
        };

        // The first row has no price change but still opens a streak.
        let change = change.unwrap_or(0.0);
        own.total += change;
        if correct {
            own.correct += change;
            own.streak += 1;
            if other.streak > 0 {
                other.credit(change);
                other.streak = 0;
            }
        }
    }

    if let Some(change) = last_change {
        if sell.streak > 0 {
            sell.credit(change);
        }
        if buy.streak > 0 {
            buy.credit(change);
        }
    }

    let buy_pct = buy.percentage();
    let sell_pct = sell.percentage();
    Some(ScoreBreakdown {
        buy: buy_pct,
        sell: sell_pct,
        combined: (buy_pct + sell_pct) / 2.0,
    })
}
