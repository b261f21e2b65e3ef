//! Feature registry.
//!
//! Features are plain functions with one signature, listed in `FEATURES` and
//! run in declared order. Each returns one or more columns aligned with the
//! input bars; warm-up and undefined slots are NaN. Tunable features read
//! their settings from `FeatureOptions`.

use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::data::DataError;
use crate::domain::PriceBar;
use crate::levels::{support_resistance_lines, PriceField};

/// Lookback periods `start..stop step` plus the fields the support and
/// resistance lines read. Defaults to `100..250 step 50` over high/low.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportResistanceOptions {
    pub start: usize,
    pub stop: usize,
    pub step: usize,
    pub support_field: PriceField,
    pub resistance_field: PriceField,
}

impl Default for SupportResistanceOptions {
    fn default() -> Self {
        Self {
            start: 100,
            stop: 250,
            step: 50,
            support_field: PriceField::High,
            resistance_field: PriceField::Low,
        }
    }
}

impl SupportResistanceOptions {
    /// Periods in `start..stop`; empty when `step` is zero.
    pub fn periods(&self) -> Vec<usize> {
        if self.step == 0 {
            return Vec::new();
        }
        (self.start..self.stop).step_by(self.step).collect()
    }
}

/// Settings for the tunable features.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureOptions {
    #[serde(default)]
    pub support_resistance: SupportResistanceOptions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureColumn {
    pub name: String,
    pub values: Vec<f64>,
}

pub type FeatureFn = fn(&[PriceBar], &FeatureOptions) -> Vec<FeatureColumn>;

#[derive(Debug, Clone, Copy)]
pub struct Feature {
    pub name: &'static str,
    pub description: &'static str,
    pub compute: FeatureFn,
}

pub static FEATURES: &[Feature] = &[
    Feature {
        name: "support_resistance",
        description: "rolling min of high (support) and max of low (resistance)",
        compute: support_resistance,
    },
    Feature {
        name: "price_change",
        description: "absolute close-to-close change",
        compute: price_change,
    },
    Feature {
        name: "candle_direction",
        description: "+1 bullish, -1 bearish, 0 doji",
        compute: candle_direction,
    },
];

pub fn find(name: &str) -> Option<&'static Feature> {
    FEATURES.iter().find(|f| f.name == name)
}

/// Run `selected` features (all when empty) in registry order with default
/// options.
pub fn compute(bars: &[PriceBar], selected: &[&str]) -> Vec<FeatureColumn> {
    compute_with(bars, selected, &FeatureOptions::default())
}

pub fn compute_with(
    bars: &[PriceBar],
    selected: &[&str],
    options: &FeatureOptions,
) -> Vec<FeatureColumn> {
    FEATURES
        .iter()
        .filter(|f| selected.is_empty() || selected.contains(&f.name))
        .flat_map(|f| (f.compute)(bars, options))
        .collect()
}

fn support_resistance(bars: &[PriceBar], options: &FeatureOptions) -> Vec<FeatureColumn> {
    let sr = &options.support_resistance;
    support_resistance_lines(bars, &sr.periods(), sr.support_field, sr.resistance_field)
    .into_iter()
    .flat_map(|line| {
        [
            FeatureColumn {
                name: format!("support_{}", line.period),
                values: line.support,
            },
            FeatureColumn {
                name: format!("resistance_{}", line.period),
                values: line.resistance,
            },
        ]
    })
    .collect()
}

fn price_change(bars: &[PriceBar], _: &FeatureOptions) -> Vec<FeatureColumn> {
    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            if i == 0 {
                f64::NAN
            } else {
                (bar.close - bars[i - 1].close).abs()
            }
        })
        .collect();
    vec![FeatureColumn {
        name: "price_change".to_string(),
        values,
    }]
}

fn candle_direction(bars: &[PriceBar], _: &FeatureOptions) -> Vec<FeatureColumn> {
    let values = bars
        .iter()
        .map(|bar| {
            if bar.is_void() {
                f64::NAN
            } else if bar.close > bar.open {
                1.0
            } else if bar.close < bar.open {
                -1.0
            } else {
                0.0
            }
        })
        .collect();
    vec![FeatureColumn {
        name: "candle_direction".to_string(),
        values,
    }]
}

/// Write bars plus feature columns as CSV. NaN cells are left empty.
pub fn write_feature_table<W: Write>(
    writer: W,
    bars: &[PriceBar],
    columns: &[FeatureColumn],
) -> Result<(), DataError> {
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header = vec!["time", "open", "high", "low", "close"];
    header.extend(columns.iter().map(|c| c.name.as_str()));
    wtr.write_record(&header)?;

    for (i, bar) in bars.iter().enumerate() {
        let mut row = vec![
            bar.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            bar.open.to_string(),
            bar.high.to_string(),
            bar.low.to_string(),
            bar.close.to_string(),
        ];
        for column in columns {
            row.push(match column.values.get(i) {
                Some(v) if !v.is_nan() => v.to_string(),
                _ => String::new(),
            });
        }
        wtr.write_record(&row)?;
    }

    wtr.flush().map_err(|source| DataError::Io {
        path: "<csv writer>".to_string(),
        source,
    })
}
