//! Breakout classifier: price pushes through a level and closes beyond it.
//!
//! - Buy when rolling_max < high and rolling_max < close.
//! - Sell when rolling_min > low and rolling_min > close.
//!
//! For sane bars (rolling_max >= rolling_min) both triggers can't fire on the
//! same bar; the tie-break only matters for malformed input.

use crate::domain::AnnotatedBar;

use super::{LevelClassifier, TieBreak, Triggers};

#[derive(Debug, Clone, Copy, Default)]
pub struct Breakout {
    tie_break: TieBreak,
}

impl Breakout {
    pub fn new(tie_break: TieBreak) -> Self {
        Self { tie_break }
    }
}

impl LevelClassifier for Breakout {
    fn name(&self) -> &str {
        "breakout"
    }

    fn triggers(&self, bar: &AnnotatedBar) -> Triggers {
        let max = bar.levels.rolling_max;
        let min = bar.levels.rolling_min;
        Triggers {
            buy: max < bar.bar.high && max < bar.bar.close,
            sell: min > bar.bar.low && min > bar.bar.close,
        }
    }

    fn tie_break(&self) -> TieBreak {
        self.tie_break
    }
}
