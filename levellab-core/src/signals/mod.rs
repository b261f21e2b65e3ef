//! Level classifiers: turn annotated bars into buy/sell signals.
//!
//! A classifier inspects one bar against its rolling levels and reports which
//! triggers fired. `classify` resolves the triggers into an optional signal,
//! carries the last signal forward over bars where nothing fired, and drops
//! the leading bars that precede the first trigger. The output never contains
//! an undecided bar.
//!
//! Classifiers see one bar at a time and hold no state, so their output at bar
//! t can't depend on later bars.

pub mod breakout;
pub mod rebound;

pub use breakout::Breakout;
pub use rebound::Rebound;

use serde::{Deserialize, Serialize};

use crate::domain::{AnnotatedBar, Signal, SignaledBar};

/// Which triggers fired on a single bar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Triggers {
    pub buy: bool,
    pub sell: bool,
}

/// Rule applied when the buy and sell triggers fire on the same bar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Sell wins. Matches the historical encoding of the level studies.
    #[default]
    PreferSell,
    PreferBuy,
    /// Neither wins; the bar inherits the previous signal.
    Hold,
}

impl TieBreak {
    pub fn resolve(&self, triggers: Triggers) -> Option<Signal> {
        match (triggers.buy, triggers.sell) {
            (false, false) => None,
            (true, false) => Some(Signal::Buy),
            (false, true) => Some(Signal::Sell),
            (true, true) => match self {
                Self::PreferSell => Some(Signal::Sell),
                Self::PreferBuy => Some(Signal::Buy),
                Self::Hold => None,
            },
        }
    }
}

/// A stateless per-bar trigger policy over rolling levels.
pub trait LevelClassifier: Send + Sync {
    fn name(&self) -> &str;

    /// Evaluate both triggers on one bar.
    fn triggers(&self, bar: &AnnotatedBar) -> Triggers;

    /// Tie-break rule used when both triggers fire.
    fn tie_break(&self) -> TieBreak;

    /// Signal triggered at this bar, if any.
    fn trigger(&self, bar: &AnnotatedBar) -> Option<Signal> {
        self.tie_break().resolve(self.triggers(bar))
    }
}

/// Serializable selector for the built-in classifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierKind {
    #[default]
    Breakout,
    Rebound,
}

impl ClassifierKind {
    pub fn build(&self, tie_break: TieBreak) -> Box<dyn LevelClassifier> {
        match self {
            Self::Breakout => Box::new(Breakout::new(tie_break)),
            Self::Rebound => Box::new(Rebound::new(tie_break)),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Breakout => "breakout",
            Self::Rebound => "rebound",
        }
    }
}

/// Label every annotated bar, forward-filling between triggers.
pub fn classify(bars: &[AnnotatedBar], classifier: &dyn LevelClassifier) -> Vec<SignaledBar> {
    let mut current: Option<Signal> = None;
    let mut out = Vec::with_capacity(bars.len());

    for bar in bars {
        if let Some(signal) = classifier.trigger(bar) {
            current = Some(signal);
        }
        if let Some(signal) = current {
            out.push(SignaledBar::new(*bar, signal));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Levels;
    use crate::levels::make_ohlc_bars;

    /// Fires buy when close > rolling_max and sell when close < rolling_min.
    struct CloseOnly;

    impl LevelClassifier for CloseOnly {
        fn name(&self) -> &str {
            "close_only"
        }

        fn triggers(&self, bar: &AnnotatedBar) -> Triggers {
            Triggers {
                buy: bar.bar.close > bar.levels.rolling_max,
                sell: bar.bar.close < bar.levels.rolling_min,
            }
        }

        fn tie_break(&self) -> TieBreak {
            TieBreak::PreferSell
        }
    }

    fn annotated(closes: &[f64], max: f64, min: f64) -> Vec<AnnotatedBar> {
        let data: Vec<_> = closes.iter().map(|&c| (c, c, c, c)).collect();
        make_ohlc_bars(&data)
            .into_iter()
            .map(|bar| AnnotatedBar {
                bar,
                levels: Levels {
                    rolling_max: max,
                    rolling_min: min,
                },
            })
            .collect()
    }

    #[test]
    fn tie_break_rules() {
        let both = Triggers {
            buy: true,
            sell: true,
        };
        assert_eq!(TieBreak::PreferSell.resolve(both), Some(Signal::Sell));
        assert_eq!(TieBreak::PreferBuy.resolve(both), Some(Signal::Buy));
        assert_eq!(TieBreak::Hold.resolve(both), None);
        assert_eq!(TieBreak::Hold.resolve(Triggers::default()), None);
        assert_eq!(
            TieBreak::Hold.resolve(Triggers {
                buy: true,
                sell: false
            }),
            Some(Signal::Buy)
        );
    }

    #[test]
    fn forward_fills_and_drops_leading_bars() {
        // levels 10..20: 15 undecided, 25 buy, 5 sell
        let bars = annotated(&[15.0, 15.0, 25.0, 15.0, 5.0, 15.0], 20.0, 10.0);
        let signaled = classify(&bars, &CloseOnly);

        let signals: Vec<Signal> = signaled.iter().map(|s| s.signal).collect();
        assert_eq!(
            signals,
            vec![Signal::Buy, Signal::Buy, Signal::Sell, Signal::Sell]
        );
        assert_eq!(signaled[0].bar.close, 25.0);
    }

    #[test]
    fn no_trigger_yields_empty_output() {
        let bars = annotated(&[15.0, 16.0, 14.0], 20.0, 10.0);
        assert!(classify(&bars, &CloseOnly).is_empty());
    }

    #[test]
    fn hold_tie_break_inherits_previous_signal() {
        // rolling_max < rolling_min lets both close-only triggers fire on 15
        let mut bars = annotated(&[25.0, 15.0], 20.0, 10.0);
        bars[1].levels = Levels {
            rolling_max: 12.0,
            rolling_min: 18.0,
        };

        struct Holding;
        impl LevelClassifier for Holding {
            fn name(&self) -> &str {
                "holding"
            }
            fn triggers(&self, bar: &AnnotatedBar) -> Triggers {
                CloseOnly.triggers(bar)
            }
            fn tie_break(&self) -> TieBreak {
                TieBreak::Hold
            }
        }

        let held = classify(&bars, &Holding);
        assert_eq!(held[1].signal, Signal::Buy);

        let sold = classify(&bars, &CloseOnly);
        assert_eq!(sold[1].signal, Signal::Sell);
    }

    #[test]
    fn kind_builds_named_classifier() {
        assert_eq!(ClassifierKind::Breakout.build(TieBreak::default()).name(), "breakout");
        assert_eq!(ClassifierKind::Rebound.build(TieBreak::default()).name(), "rebound");
    }
}
