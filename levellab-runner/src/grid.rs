//! Exhaustive grid search over a `ParamSpace`.
//!
//! Candidates are evaluated independently (in parallel unless disabled) and
//! collected in grid order; the arg-max runs afterwards over that ordered
//! list, so parallel and sequential sweeps pick the same winner.

use rayon::prelude::*;
use tracing::{debug, info, warn};

use levellab_core::domain::{LevelParams, ParamError, PriceBar};
use levellab_core::objective::Objective;

use crate::result::{best_of, ranked, Evaluation, SearchResult};
use crate::space::ParamSpace;

/// Score every candidate with `score`, preserving input order.
pub fn evaluate_candidates<F>(candidates: &[LevelParams], parallel: bool, score: F) -> Vec<Evaluation>
where
    F: Fn(LevelParams) -> Option<f64> + Sync,
{
    let evaluate = |&params: &LevelParams| {
        let score = score(params);
        debug!(%params, ?score, "candidate evaluated");
        Evaluation { params, score }
    };

    if parallel {
        candidates.par_iter().map(evaluate).collect()
    } else {
        candidates.iter().map(evaluate).collect()
    }
}

/// Grid sweep executor.
pub struct GridSweep<'a> {
    objective: &'a Objective,
    parallel: bool,
}

impl<'a> GridSweep<'a> {
    pub fn new(objective: &'a Objective) -> Self {
        Self {
            objective,
            parallel: true,
        }
    }

    /// Enables or disables parallel execution.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Evaluate every grid pair on the full series.
    pub fn sweep(&self, bars: &[PriceBar], space: &ParamSpace) -> Result<SweepResults, ParamError> {
        let candidates = space.validated(self.objective)?;
        info!(
            candidates = candidates.len(),
            bars = bars.len(),
            parallel = self.parallel,
            "grid sweep started"
        );

        let evaluations = evaluate_candidates(&candidates, self.parallel, |params| {
            self.objective.score(bars, params)
        });
        Ok(SweepResults::new(evaluations))
    }
}

/// Grid search returning only the winner. `Ok(None)` when the space is empty
/// or no candidate scored.
pub fn grid_search(
    bars: &[PriceBar],
    space: &ParamSpace,
    objective: &Objective,
    parallel: bool,
) -> Result<Option<SearchResult>, ParamError> {
    let results = GridSweep::new(objective)
        .with_parallelism(parallel)
        .sweep(bars, space)?;
    Ok(results.best())
}

/// Results from a sweep, in evaluation order.
#[derive(Debug, Clone, Default)]
pub struct SweepResults {
    evaluations: Vec<Evaluation>,
}

impl SweepResults {
    pub fn new(evaluations: Vec<Evaluation>) -> Self {
        let results = Self { evaluations };
        match results.best() {
            Some(best) => info!(
                window_size = best.window_size,
                bias = best.bias,
                score = best.score,
                scored = results.scored_count(),
                total = results.len(),
                "sweep finished"
            ),
            None if !results.is_empty() => {
                warn!(total = results.len(), "sweep finished with no scored candidate")
            }
            None => warn!("sweep finished on an empty candidate space"),
        }
        results
    }

    /// All evaluations in grid order.
    pub fn all(&self) -> &[Evaluation] {
        &self.evaluations
    }

    pub fn len(&self) -> usize {
        self.evaluations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.evaluations.is_empty()
    }

    pub fn scored_count(&self) -> usize {
        self.evaluations.iter().filter(|e| e.result().is_some()).count()
    }

    /// Scored candidates, best first. Equal scores keep grid order.
    pub fn sorted_by_score(&self) -> Vec<SearchResult> {
        ranked(&self.evaluations)
    }

    pub fn top_n(&self, n: usize) -> Vec<SearchResult> {
        self.sorted_by_score().into_iter().take(n).collect()
    }

    pub fn best(&self) -> Option<SearchResult> {
        best_of(&self.evaluations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use levellab_core::data::{SyntheticShape, SyntheticSource};
    use levellab_core::objective::PipelineConfig;
    use levellab_core::scoring::ScoreMethod;

    use crate::space::IntRange;

    fn bars() -> Vec<PriceBar> {
        SyntheticSource::new(SyntheticShape::default(), 300, 42).generate("GRID")
    }

    fn space() -> ParamSpace {
        ParamSpace::new(IntRange::new(3, 20), IntRange::new(0, 3))
    }

    #[test]
    fn sweep_evaluates_every_pair_in_order() {
        let objective = Objective::new(PipelineConfig::default());
        let results = GridSweep::new(&objective).sweep(&bars(), &space()).unwrap();
        assert_eq!(results.len(), 17 * 3);
        assert_eq!(results.all()[0].params, LevelParams::new(3, 0));
        assert_eq!(results.all()[1].params, LevelParams::new(3, 1));
    }

    #[test]
    fn parallel_and_sequential_agree() {
        let objective = Objective::new(PipelineConfig {
            score: ScoreMethod::AccumulatedPriceChange,
            ..PipelineConfig::default()
        });
        let bars = bars();
        let parallel = GridSweep::new(&objective).sweep(&bars, &space()).unwrap();
        let sequential = GridSweep::new(&objective)
            .with_parallelism(false)
            .sweep(&bars, &space())
            .unwrap();
        assert_eq!(parallel.all(), sequential.all());
        assert_eq!(parallel.best(), sequential.best());
    }

    #[test]
    fn best_matches_exhaustive_max() {
        let objective = Objective::new(PipelineConfig::default());
        let bars = bars();
        let best = grid_search(&bars, &space(), &objective, true)
            .unwrap()
            .unwrap();

        for (w, b) in space().pairs() {
            let params = LevelParams::new(w as usize, b as usize);
            if let Some(score) = objective.score(&bars, params) {
                assert!(score <= best.score);
            }
        }
        assert_eq!(objective.score(&bars, best.params()), Some(best.score));
    }

    #[test]
    fn sorted_and_top_n_are_descending() {
        let objective = Objective::new(PipelineConfig::default());
        let results = GridSweep::new(&objective).sweep(&bars(), &space()).unwrap();
        let sorted = results.sorted_by_score();
        assert_eq!(sorted.len(), results.scored_count());
        assert!(sorted.windows(2).all(|w| w[0].score >= w[1].score));

        let top = results.top_n(5);
        assert_eq!(top.len(), 5.min(sorted.len()));
        assert_eq!(top.first().copied(), results.best());
    }

    #[test]
    fn empty_space_is_none() {
        let objective = Objective::new(PipelineConfig::default());
        let empty = ParamSpace::new(IntRange::new(5, 5), vec![1]);
        assert_eq!(grid_search(&bars(), &empty, &objective, true).unwrap(), None);
    }

    #[test]
    fn windows_beyond_data_leave_nothing_scored() {
        let objective = Objective::new(PipelineConfig::default());
        let short = &bars()[..10];
        let space = ParamSpace::new(vec![20, 30], vec![1]);
        let results = GridSweep::new(&objective).sweep(short, &space).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results.scored_count(), 0);
        assert!(results.best().is_none());
    }
}
