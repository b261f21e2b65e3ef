//! Look-ahead contamination tests.
//!
//! No level, signal or feature value at bar t may depend on bars after t.
//!
//! Method: run on a truncated series (bars 0..100) and on the full series
//! (bars 0..200). Every row the truncated run produces must be identical in
//! the full run.

use levellab_core::data::{SyntheticShape, SyntheticSource};
use levellab_core::domain::{LevelParams, PriceBar};
use levellab_core::features;
use levellab_core::levels::annotate;
use levellab_core::signals::{classify, ClassifierKind, TieBreak};

const FULL: usize = 200;
const TRUNCATED: usize = 100;

fn walk() -> Vec<PriceBar> {
    SyntheticSource::new(SyntheticShape::RandomWalk { volatility: 0.03 }, FULL, 11).generate("LA")
}

fn param_cases() -> Vec<LevelParams> {
    vec![
        LevelParams::new(1, 0),
        LevelParams::new(5, 1),
        LevelParams::new(20, 3),
        LevelParams::new(60, 0),
    ]
}

#[test]
fn annotate_has_no_lookahead() {
    let bars = walk();
    for params in param_cases() {
        let full = annotate(&bars, params);
        let truncated = annotate(&bars[..TRUNCATED], params);
        assert_eq!(
            truncated.len(),
            TRUNCATED - params.window_size - params.bias + 1,
            "{params}"
        );
        assert_eq!(&full[..truncated.len()], truncated.as_slice(), "{params}");
    }
}

#[test]
fn classify_has_no_lookahead() {
    let bars = walk();
    for kind in [ClassifierKind::Breakout, ClassifierKind::Rebound] {
        let classifier = kind.build(TieBreak::default());
        for params in param_cases() {
            let full = classify(&annotate(&bars, params), classifier.as_ref());
            let truncated = classify(&annotate(&bars[..TRUNCATED], params), classifier.as_ref());
            assert!(truncated.len() <= full.len());
            assert_eq!(
                &full[..truncated.len()],
                truncated.as_slice(),
                "{} {params}",
                kind.name()
            );
        }
    }
}

#[test]
fn features_have_no_lookahead() {
    let bars = walk();
    let full = features::compute(&bars, &[]);
    let truncated = features::compute(&bars[..TRUNCATED], &[]);
    assert_eq!(full.len(), truncated.len());

    for (f, t) in full.iter().zip(&truncated) {
        assert_eq!(f.name, t.name);
        for i in 0..TRUNCATED {
            let (a, b) = (f.values[i], t.values[i]);
            assert!(
                (a.is_nan() && b.is_nan()) || a == b,
                "{} differs at bar {i}: {a} vs {b}",
                f.name
            );
        }
    }
}
