//! Rolling support/resistance levels.
//!
//! `annotate` attaches to each bar the highest high and lowest low of a
//! trailing window, shifted `bias` bars into the past:
//! - rolling_max[t] = max(high[t-bias-window+1..=t-bias])
//! - rolling_min[t] = min(low[t-bias-window+1..=t-bias])
//!
//! Bars whose window is incomplete or touches a NaN are dropped, so for clean
//! input the output has `n - window - bias + 1` rows. No value at bar t depends
//! on bars after t.

use serde::{Deserialize, Serialize};

use crate::domain::{AnnotatedBar, LevelParams, Levels, PriceBar};

/// Which bar field a rolling statistic reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceField {
    Open,
    High,
    Low,
    Close,
}

impl PriceField {
    pub fn value(&self, bar: &PriceBar) -> f64 {
        match self {
            Self::Open => bar.open,
            Self::High => bar.high,
            Self::Low => bar.low,
            Self::Close => bar.close,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Extreme {
    Max,
    Min,
}

/// Trailing max/min over `period` values. Warm-up slots and windows that
/// contain a NaN are NaN.
fn rolling_extreme(values: &[f64], period: usize, extreme: Extreme) -> Vec<f64> {
    let n = values.len();
    let mut result = vec![f64::NAN; n];

    if period == 0 || n < period {
        return result;
    }

    for i in (period - 1)..n {
        let window = &values[i + 1 - period..=i];
        if window.iter().any(|v| v.is_nan()) {
            continue;
        }
        result[i] = match extreme {
            Extreme::Max => window.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Extreme::Min => window.iter().copied().fold(f64::INFINITY, f64::min),
        };
    }

    result
}

/// Shift a series `by` slots toward the end, filling the front with NaN.
fn shift(values: Vec<f64>, by: usize) -> Vec<f64> {
    if by == 0 {
        return values;
    }
    let n = values.len();
    let mut shifted = vec![f64::NAN; n];
    if by < n {
        shifted[by..].copy_from_slice(&values[..n - by]);
    }
    shifted
}

/// Attach shifted rolling levels to every bar that has a complete window.
pub fn annotate(bars: &[PriceBar], params: LevelParams) -> Vec<AnnotatedBar> {
    let highs: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let lows: Vec<f64> = bars.iter().map(|b| b.low).collect();

    let rolling_max = shift(
        rolling_extreme(&highs, params.window_size, Extreme::Max),
        params.bias,
    );
    let rolling_min = shift(
        rolling_extreme(&lows, params.window_size, Extreme::Min),
        params.bias,
    );

    bars.iter()
        .zip(rolling_max.into_iter().zip(rolling_min))
        .filter(|(bar, (max, min))| !bar.is_void() && !max.is_nan() && !min.is_nan())
        .map(|(bar, (rolling_max, rolling_min))| AnnotatedBar {
            bar: *bar,
            levels: Levels {
                rolling_max,
                rolling_min,
            },
        })
        .collect()
}

/// Support and resistance lines for one lookback period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportResistance {
    pub period: usize,
    pub support: Vec<f64>,
    pub resistance: Vec<f64>,
}

/// Unshifted multi-period support/resistance lines, aligned with `bars`.
///
/// Support is the rolling min of `support_field`, resistance the rolling max
/// of `resistance_field`. Warm-up rows stay NaN; nothing is dropped.
pub fn support_resistance_lines(
    bars: &[PriceBar],
    periods: &[usize],
    support_field: PriceField,
    resistance_field: PriceField,
) -> Vec<SupportResistance> {
    let support_values: Vec<f64> = bars.iter().map(|b| support_field.value(b)).collect();
    let resistance_values: Vec<f64> = bars.iter().map(|b| resistance_field.value(b)).collect();

    periods
        .iter()
        .filter(|&&p| p >= 1)
        .map(|&period| SupportResistance {
            period,
            support: rolling_extreme(&support_values, period, Extreme::Min),
            resistance: rolling_extreme(&resistance_values, period, Extreme::Max),
        })
        .collect()
}

/// Build bars from `(open, high, low, close)` tuples on consecutive days.
#[cfg(test)]
pub fn make_ohlc_bars(data: &[(f64, f64, f64, f64)]) -> Vec<PriceBar> {
    let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    data.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| PriceBar {
            timestamp: base + chrono::Duration::days(i as i64),
            open,
            high,
            low,
            close,
        })
        .collect()
}

/// Synthetic bars from closes: open = previous close, high/low = body +- 1.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<PriceBar> {
    let data: Vec<(f64, f64, f64, f64)> = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            (open, open.max(close) + 1.0, open.min(close) - 1.0, close)
        })
        .collect();
    make_ohlc_bars(&data)
}

#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;

#[cfg(test)]
mod tests {
    use super::*;

    fn five_bars() -> Vec<PriceBar> {
        make_ohlc_bars(&[
            (10.0, 12.0, 9.0, 11.0),
            (11.0, 15.0, 10.0, 14.0),
            (14.0, 14.0, 13.0, 13.5),
            (13.5, 16.0, 12.0, 15.0),
            (15.0, 15.5, 14.0, 14.5),
        ])
    }

    #[test]
    fn window_3_without_bias() {
        let annotated = annotate(&five_bars(), LevelParams::new(3, 0));
        assert_eq!(annotated.len(), 3);

        // bar 2: max(12, 15, 14) / min(9, 10, 13)
        assert_approx(annotated[0].levels.rolling_max, 15.0, DEFAULT_EPSILON);
        assert_approx(annotated[0].levels.rolling_min, 9.0, DEFAULT_EPSILON);
        // bar 4: max(14, 16, 15.5) / min(13, 12, 14)
        assert_approx(annotated[2].levels.rolling_max, 16.0, DEFAULT_EPSILON);
        assert_approx(annotated[2].levels.rolling_min, 12.0, DEFAULT_EPSILON);
        assert_eq!(annotated[0].bar.close, 13.5);
    }

    #[test]
    fn bias_shifts_levels_into_the_past() {
        let bars = five_bars();
        let annotated = annotate(&bars, LevelParams::new(2, 1));
        // 5 - 2 - 1 + 1 = 3 rows, starting at bar 2
        assert_eq!(annotated.len(), 3);
        assert_eq!(annotated[0].bar, bars[2]);
        // bar 2 sees window over bars 0..=1
        assert_approx(annotated[0].levels.rolling_max, 15.0, DEFAULT_EPSILON);
        assert_approx(annotated[0].levels.rolling_min, 9.0, DEFAULT_EPSILON);
        // bar 4 sees window over bars 2..=3
        assert_approx(annotated[2].levels.rolling_max, 16.0, DEFAULT_EPSILON);
        assert_approx(annotated[2].levels.rolling_min, 12.0, DEFAULT_EPSILON);
    }

    #[test]
    fn window_longer_than_data_is_empty() {
        assert!(annotate(&five_bars(), LevelParams::new(6, 0)).is_empty());
        assert!(annotate(&five_bars(), LevelParams::new(3, 3)).is_empty());
        assert!(annotate(&[], LevelParams::new(1, 0)).is_empty());
    }

    #[test]
    fn nan_in_window_drops_affected_rows() {
        let mut bars = five_bars();
        bars[1].high = f64::NAN;
        let annotated = annotate(&bars, LevelParams::new(2, 0));
        // windows ending at 1 and 2 touch the NaN high; bar 1 is void too
        let kept: Vec<f64> = annotated.iter().map(|a| a.bar.close).collect();
        assert_eq!(kept, vec![15.0, 14.5]);
    }

    #[test]
    fn window_of_one_without_bias_uses_own_bar() {
        let bars = five_bars();
        let annotated = annotate(&bars, LevelParams::new(1, 0));
        assert_eq!(annotated.len(), bars.len());
        for (a, b) in annotated.iter().zip(&bars) {
            assert_eq!(a.levels.rolling_max, b.high);
            assert_eq!(a.levels.rolling_min, b.low);
        }
    }

    #[test]
    fn support_resistance_keeps_warmup_nan() {
        let bars = five_bars();
        let lines =
            support_resistance_lines(&bars, &[2, 3], PriceField::High, PriceField::Low);
        assert_eq!(lines.len(), 2);

        let two = &lines[0];
        assert_eq!(two.period, 2);
        assert_eq!(two.support.len(), bars.len());
        assert!(two.support[0].is_nan());
        // min(high[0], high[1]) = 12, max(low[0], low[1]) = 10
        assert_approx(two.support[1], 12.0, DEFAULT_EPSILON);
        assert_approx(two.resistance[1], 10.0, DEFAULT_EPSILON);

        let three = &lines[1];
        assert!(three.resistance[1].is_nan());
        // max(low[1..=3]) = max(10, 13, 12)
        assert_approx(three.resistance[3], 13.0, DEFAULT_EPSILON);
    }

    #[test]
    fn support_resistance_skips_zero_period() {
        let lines = support_resistance_lines(
            &five_bars(),
            &[0, 2],
            PriceField::Low,
            PriceField::High,
        );
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].period, 2);
    }
}
