//! Rebound classifier: price pierces a level and closes back inside.
//!
//! - Sell when rolling_max < high and rolling_max > close (rejected at resistance).
//! - Buy when rolling_min > low and rolling_min < close (rejected at support).
//!
//! A wide bar can pierce both levels and close between them; the tie-break rule
//! decides that case.

use crate::domain::AnnotatedBar;

use super::{LevelClassifier, TieBreak, Triggers};

#[derive(Debug, Clone, Copy, Default)]
pub struct Rebound {
    tie_break: TieBreak,
}

impl Rebound {
    pub fn new(tie_break: TieBreak) -> Self {
        Self { tie_break }
    }
}

impl LevelClassifier for Rebound {
    fn name(&self) -> &str {
        "rebound"
    }

    fn triggers(&self, bar: &AnnotatedBar) -> Triggers {
        let max = bar.levels.rolling_max;
        let min = bar.levels.rolling_min;
        Triggers {
            buy: min > bar.bar.low && min < bar.bar.close,
            sell: max < bar.bar.high && max > bar.bar.close,
        }
    }

    fn tie_break(&self) -> TieBreak {
        self.tie_break
    }
}
