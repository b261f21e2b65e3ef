//! Bar types: raw price bars and the columns derived from them.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::Signal;

/// OHLC bar for one trading period.
///
/// Bars are supplied by a market-data source and never mutated afterwards.
/// Every derived sequence (levels, signals, scores) is rebuilt from a slice of
/// these.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl PriceBar {
    /// Returns true if any OHLC field is NaN.
    pub fn is_void(&self) -> bool {
        self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan()
    }

    /// Basic OHLC sanity check: high >= low and the body sits inside the range.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
    }
}

/// Rolling resistance (`rolling_max`) and support (`rolling_min`) for one bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Levels {
    pub rolling_max: f64,
    pub rolling_min: f64,
}

/// A price bar together with the levels known at that bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedBar {
    pub bar: PriceBar,
    pub levels: Levels,
}

/// An annotated bar carrying the signal in force at that bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignaledBar {
    pub bar: PriceBar,
    pub levels: Levels,
    pub signal: Signal,
}

impl SignaledBar {
    pub fn new(annotated: AnnotatedBar, signal: Signal) -> Self {
        Self {
            bar: annotated.bar,
            levels: annotated.levels,
            signal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample_bar() -> PriceBar {
        PriceBar {
            timestamp: NaiveDate::from_ymd_opt(2024, 1, 2)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            open: 100.0,
            high: 105.0,
            low: 98.0,
            close: 103.0,
        }
    }

    #[test]
    fn bar_is_sane() {
        assert!(sample_bar().is_sane());
    }

    #[test]
    fn bar_detects_void() {
        let mut bar = sample_bar();
        bar.close = f64::NAN;
        assert!(bar.is_void());
        assert!(!bar.is_sane());
    }

    #[test]
    fn bar_detects_insane_high_low() {
        let mut bar = sample_bar();
        bar.high = 97.0;
        assert!(!bar.is_sane());
    }

    #[test]
    fn signaled_bar_keeps_annotation() {
        let annotated = AnnotatedBar {
            bar: sample_bar(),
            levels: Levels {
                rolling_max: 104.0,
                rolling_min: 99.0,
            },
        };
        let signaled = SignaledBar::new(annotated, Signal::Buy);
        assert_eq!(signaled.bar, annotated.bar);
        assert_eq!(signaled.levels, annotated.levels);
        assert_eq!(signaled.signal, Signal::Buy);
    }
}
