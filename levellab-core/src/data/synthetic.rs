//! Synthetic bars for testing and demos.
//!
//! Two shapes: a multiplicative random walk from 100.0, and a sine wave
//! around 100.0 with random wicks. Both are fully determined by the seed and
//! the requested symbol.

use chrono::{Duration, NaiveDate, NaiveDateTime};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::provider::{apply_count, BarRequest, DataError, DataSource, MarketDataSource};
use crate::domain::PriceBar;
use crate::rng::RngHierarchy;

const BASE_PRICE: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum SyntheticShape {
    RandomWalk { volatility: f64 },
    Sine { period: f64, amplitude: f64 },
}

impl Default for SyntheticShape {
    fn default() -> Self {
        Self::RandomWalk { volatility: 0.02 }
    }
}

#[derive(Debug, Clone)]
pub struct SyntheticSource {
    pub shape: SyntheticShape,
    pub bars: usize,
    pub seed: u64,
    pub start: NaiveDateTime,
}

impl SyntheticSource {
    pub fn new(shape: SyntheticShape, bars: usize, seed: u64) -> Self {
        let start = NaiveDate::from_ymd_opt(2020, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap_or_default();
        Self {
            shape,
            bars,
            seed,
            start,
        }
    }

    /// Generate bars for `symbol`. Daily spacing, no calendar gaps.
    pub fn generate(&self, symbol: &str) -> Vec<PriceBar> {
        let mut rng = RngHierarchy::new(self.seed).rng_for(symbol, 0);
        let mut bars = Vec::with_capacity(self.bars);
        let mut prev_close = self.close_at(0, BASE_PRICE, &mut rng);

        for i in 0..self.bars {
            let open = prev_close;
            let close = self.close_at(i, prev_close, &mut rng);
            let wick = open.max(close).abs() * 0.005;
            let high = open.max(close) + rng.gen_range(0.0..=wick);
            let low = open.min(close) - rng.gen_range(0.0..=wick);

            bars.push(PriceBar {
                timestamp: self.start + Duration::days(i as i64),
                open,
                high,
                low,
                close,
            });
            prev_close = close;
        }

        bars
    }

    fn close_at(&self, i: usize, prev_close: f64, rng: &mut impl Rng) -> f64 {
        match self.shape {
            SyntheticShape::RandomWalk { volatility } => {
                let step: f64 = if volatility > 0.0 {
                    rng.gen_range(-volatility..volatility)
                } else {
                    0.0
                };
                prev_close * (1.0 + step)
            }
            SyntheticShape::Sine { period, amplitude } => {
                let phase = std::f64::consts::TAU * i as f64 / period.max(f64::EPSILON);
                BASE_PRICE + amplitude * phase.sin()
            }
        }
    }
}

impl MarketDataSource for SyntheticSource {
    fn name(&self) -> &str {
        "synthetic"
    }

    fn kind(&self) -> DataSource {
        DataSource::Synthetic
    }

    fn fetch(&self, request: &BarRequest) -> Result<Vec<PriceBar>, DataError> {
        let bars = apply_count(self.generate(&request.symbol), request.count);
        if bars.is_empty() {
            return Err(DataError::Empty {
                symbol: request.symbol.clone(),
            });
        }
        Ok(bars)
    }
}
