//! Objective: the full annotate → classify → score pipeline for one
//! parameter pair.
//!
//! Every call recomputes levels and signals from the raw bars; nothing is
//! cached between calls, so an `Objective` can be shared across threads and
//! evaluated in any order.

use serde::{Deserialize, Serialize};

use crate::domain::{LevelParams, ParamError, PriceBar, SignaledBar, ValidationMode};
use crate::levels::annotate;
use crate::scoring::{score_run, ScoreBreakdown, ScoreMethod, ScoredRun};
use crate::signals::{classify, ClassifierKind, LevelClassifier, TieBreak};

/// Serializable description of a pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub classifier: ClassifierKind,
    pub tie_break: TieBreak,
    pub score: ScoreMethod,
    pub validation: ValidationMode,
}

pub struct Objective {
    config: PipelineConfig,
    classifier: Box<dyn LevelClassifier>,
}

impl Objective {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            classifier: config.classifier.build(config.tie_break),
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn classifier(&self) -> &dyn LevelClassifier {
        self.classifier.as_ref()
    }

    /// Validate raw numbers with this pipeline's validation mode.
    pub fn params(&self, window_size: f64, bias: f64) -> Result<LevelParams, ParamError> {
        LevelParams::validate(window_size, bias, self.config.validation)
    }

    /// Annotated and classified bars for `params`.
    pub fn signals(&self, bars: &[PriceBar], params: LevelParams) -> Vec<SignaledBar> {
        let annotated = annotate(bars, params);
        classify(&annotated, self.classifier.as_ref())
    }

    /// Score breakdown for `params`; `None` if no bar received a signal.
    pub fn evaluate(&self, bars: &[PriceBar], params: LevelParams) -> Option<ScoreBreakdown> {
        self.config.score.evaluate(&self.signals(bars, params))
    }

    /// Combined score used for ranking.
    pub fn score(&self, bars: &[PriceBar], params: LevelParams) -> Option<f64> {
        self.evaluate(bars, params).map(|s| s.combined)
    }

    /// Signalled run with derived columns, for reporting.
    pub fn scored_run(&self, bars: &[PriceBar], params: LevelParams) -> ScoredRun {
        score_run(&self.signals(bars, params), self.config.score)
    }
}

impl std::fmt::Debug for Objective {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Objective")
            .field("config", &self.config)
            .field("classifier", &self.classifier.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Signal;
    use crate::levels::make_bars;

    fn zigzag(n: usize) -> Vec<PriceBar> {
        let closes: Vec<f64> = (0..n)
            .map(|i| 100.0 + 10.0 * ((i as f64) * 0.3).sin() + (i % 3) as f64)
            .collect();
        make_bars(&closes)
    }

    #[test]
    fn pipeline_produces_complete_signals() {
        let objective = Objective::new(PipelineConfig::default());
        let signaled = objective.signals(&zigzag(120), LevelParams::new(5, 1));
        assert!(!signaled.is_empty());
        assert!(signaled
            .iter()
            .all(|s| matches!(s.signal, Signal::Buy | Signal::Sell)));
    }

    #[test]
    fn score_matches_breakdown() {
        let bars = zigzag(120);
        let objective = Objective::new(PipelineConfig {
            score: ScoreMethod::AccumulatedPriceChange,
            ..PipelineConfig::default()
        });
        let params = LevelParams::new(8, 1);
        let breakdown = objective.evaluate(&bars, params).unwrap();
        assert_eq!(objective.score(&bars, params), Some(breakdown.combined));
        assert_eq!(objective.scored_run(&bars, params).score, Some(breakdown));
    }

    #[test]
    fn window_beyond_data_is_unscored() {
        let objective = Objective::new(PipelineConfig::default());
        assert_eq!(objective.score(&zigzag(10), LevelParams::new(20, 1)), None);
        assert_eq!(objective.score(&[], LevelParams::new(1, 0)), None);
    }

    #[test]
    fn params_follow_validation_mode() {
        let strict = Objective::new(PipelineConfig {
            validation: ValidationMode::Strict,
            ..PipelineConfig::default()
        });
        assert!(strict.params(3.5, 1.0).is_err());

        let coerce = Objective::new(PipelineConfig::default());
        assert_eq!(coerce.params(3.5, 1.0).unwrap(), LevelParams::new(4, 1));
    }

    #[test]
    fn pipeline_config_parses_with_defaults() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"classifier":"rebound","score":"accumulated_price_change"}"#)
                .unwrap();
        assert_eq!(config.classifier, ClassifierKind::Rebound);
        assert_eq!(config.tie_break, TieBreak::PreferSell);
        assert_eq!(config.score, ScoreMethod::AccumulatedPriceChange);
        assert_eq!(config.validation, ValidationMode::Coerce);
    }
}
