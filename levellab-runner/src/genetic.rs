//! (μ + λ) genetic search over `(window_size, bias)`.
//!
//! An individual is a pair of real genes. Genes are truncated toward zero and
//! coerced into valid parameters before scoring; a pair that still fails
//! validation, or scores nothing, has fitness −∞.
//!
//! Each generation:
//! 1. Breed λ offspring. Per offspring draw `u ∈ [0,1)`:
//!    - `u < cx_probability`: blend two distinct random parents, keep the
//!      first child.
//!    - `u < cx_probability + mut_probability`: mutate a random parent. Half
//!      the time the window gene moves by `U{-step..=step}` and is truncated
//!      to `|w|`; otherwise the bias is redrawn from the bias list.
//!    - otherwise: copy a random parent.
//! 2. Score the offspring whose genes changed.
//! 3. Select μ survivors from parents + offspring by size-k tournaments.
//!
//! All random draws happen on the calling thread from one seeded RNG; only
//! fitness evaluation runs in parallel, so a fixed seed replays exactly.

use rand::rngs::StdRng;
use rand::seq::{index, SliceRandom};
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use levellab_core::domain::{LevelParams, PriceBar, ValidationMode};
use levellab_core::objective::Objective;
use levellab_core::rng::RngHierarchy;

use crate::grid::evaluate_candidates;
use crate::result::{Evaluation, SearchResult};
use crate::space::ParamSpace;

// ─── Configuration ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneticConfig {
    /// μ: survivors per generation (and initial population size).
    pub population_size: usize,
    /// λ: offspring bred per generation.
    pub offspring_size: usize,
    pub cx_probability: f64,
    pub mut_probability: f64,
    pub generations: usize,
    pub seed: u64,
    pub tournament_size: usize,
    /// Blend crossover α.
    pub blend_alpha: f64,
    /// Largest window shift a mutation applies.
    pub window_step: i64,
}

impl Default for GeneticConfig {
    fn default() -> Self {
        Self {
            population_size: 10,
            offspring_size: 50,
            cx_probability: 0.7,
            mut_probability: 0.2,
            generations: 10,
            seed: 42,
            tournament_size: 3,
            blend_alpha: 0.5,
            window_step: 5,
        }
    }
}

impl GeneticConfig {
    pub fn validate(&self) -> Result<(), GeneticError> {
        for (name, p) in [
            ("cx_probability", self.cx_probability),
            ("mut_probability", self.mut_probability),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(GeneticError::Probability { name, value: p });
            }
        }
        if self.cx_probability + self.mut_probability > 1.0 {
            return Err(GeneticError::ProbabilitySum {
                cx: self.cx_probability,
                mutation: self.mut_probability,
            });
        }
        if self.population_size < 2 {
            return Err(GeneticError::PopulationTooSmall(self.population_size));
        }
        if self.offspring_size == 0 {
            return Err(GeneticError::NoOffspring);
        }
        if self.tournament_size == 0 {
            return Err(GeneticError::TournamentSize);
        }
        if !self.blend_alpha.is_finite() || self.blend_alpha < 0.0 {
            return Err(GeneticError::BlendAlpha(self.blend_alpha));
        }
        if self.window_step < 0 {
            return Err(GeneticError::WindowStep(self.window_step));
        }
        Ok(())
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum GeneticError {
    #[error("{name} must be within [0, 1], got {value}")]
    Probability { name: &'static str, value: f64 },
    #[error("cx_probability + mut_probability must not exceed 1 (got {cx} + {mutation})")]
    ProbabilitySum { cx: f64, mutation: f64 },
    #[error("population_size must be at least 2, got {0}")]
    PopulationTooSmall(usize),
    #[error("offspring_size must be at least 1")]
    NoOffspring,
    #[error("tournament_size must be at least 1")]
    TournamentSize,
    #[error("blend_alpha must be a non-negative number, got {0}")]
    BlendAlpha(f64),
    #[error("window_step must not be negative, got {0}")]
    WindowStep(i64),
}

// ─── Result types ────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationStats {
    pub generation: usize,
    /// Individuals scored this generation.
    pub evaluated: usize,
    /// Best survivor fitness; `None` when every survivor is unscored.
    pub best: Option<f64>,
    /// Mean over scored survivors.
    pub mean: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneticOutcome {
    /// Best individual of the final population.
    pub best: Option<SearchResult>,
    /// Best individual seen in any generation.
    pub best_seen: Option<SearchResult>,
    pub generations: Vec<GenerationStats>,
    /// Final population, decoded. Undecodable individuals are left out.
    pub population: Vec<Evaluation>,
    /// Fitness evaluations performed, initial population included.
    pub evaluations: usize,
}

// ─── Individuals ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
struct Individual {
    genes: [f64; 2],
    /// `None` until scored; unscored parameters score −∞.
    fitness: Option<f64>,
}

impl Individual {
    fn new(window: i64, bias: i64) -> Self {
        Self {
            genes: [window as f64, bias as f64],
            fitness: None,
        }
    }

    fn fitness(&self) -> f64 {
        self.fitness.unwrap_or(f64::NEG_INFINITY)
    }
}

/// Genes to parameters: truncate, then coerce.
fn decode(genes: [f64; 2]) -> Option<LevelParams> {
    LevelParams::validate(genes[0].trunc(), genes[1].trunc(), ValidationMode::Coerce).ok()
}

/// Index of the fittest individual; the first one wins ties.
fn fittest(individuals: &[Individual]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, ind) in individuals.iter().enumerate() {
        match best {
            Some(b) if ind.fitness() <= individuals[b].fitness() => {}
            _ => best = Some(i),
        }
    }
    best
}

fn as_result(ind: &Individual) -> Option<SearchResult> {
    let fitness = ind.fitness();
    if fitness == f64::NEG_INFINITY {
        return None;
    }
    decode(ind.genes).map(|params| SearchResult::new(params, fitness))
}

// ─── Search ──────────────────────────────────────────────────────────

pub struct GeneticSearch<'a> {
    objective: &'a Objective,
    config: GeneticConfig,
    parallel: bool,
}

impl<'a> GeneticSearch<'a> {
    pub fn new(objective: &'a Objective, config: GeneticConfig) -> Self {
        Self {
            objective,
            config,
            parallel: true,
        }
    }

    /// Enables or disables parallel fitness evaluation.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Run the search. `Ok(None)` best when the space has an empty axis.
    pub fn run(&self, bars: &[PriceBar], space: &ParamSpace) -> Result<GeneticOutcome, GeneticError> {
        self.config.validate()?;
        let cfg = &self.config;

        if space.is_empty() {
            return Ok(GeneticOutcome {
                best: None,
                best_seen: None,
                generations: Vec::new(),
                population: Vec::new(),
                evaluations: 0,
            });
        }

        info!(
            population = cfg.population_size,
            offspring = cfg.offspring_size,
            generations = cfg.generations,
            seed = cfg.seed,
            "genetic search started"
        );

        let mut rng = RngHierarchy::new(cfg.seed).rng_for("genetic", 0);

        let mut population: Vec<Individual> = (0..cfg.population_size)
            .map(|_| {
                let w = space.window_sizes.choose(&mut rng).copied().unwrap_or_default();
                let b = space.biases.choose(&mut rng).copied().unwrap_or_default();
                Individual::new(w, b)
            })
            .collect();

        let mut evaluations = self.score_unscored(bars, &mut population);
        let mut hall_of_fame = fittest(&population).map(|i| population[i]);
        let mut generations = Vec::with_capacity(cfg.generations);

        for generation in 1..=cfg.generations {
            let mut offspring = self.breed(&population, &space.biases, &mut rng);
            let evaluated = self.score_unscored(bars, &mut offspring);
            evaluations += evaluated;

            if let Some(i) = fittest(&offspring) {
                let candidate = offspring[i];
                match hall_of_fame {
                    Some(hof) if candidate.fitness() <= hof.fitness() => {}
                    _ => hall_of_fame = Some(candidate),
                }
            }

            let mut pool = population;
            pool.extend(offspring);
            population = self.tournament(&pool, cfg.population_size, &mut rng);

            let stats = generation_stats(generation, evaluated, &population);
            debug!(
                generation,
                evaluated,
                best = ?stats.best,
                mean = ?stats.mean,
                "generation complete"
            );
            generations.push(stats);
        }

        let best = fittest(&population).and_then(|i| as_result(&population[i]));
        let best_seen = hall_of_fame.as_ref().and_then(as_result);
        let final_population = population
            .iter()
            .filter_map(|ind| {
                decode(ind.genes).map(|params| Evaluation {
                    params,
                    score: ind.fitness.filter(|f| f.is_finite()),
                })
            })
            .collect();

        match &best {
            Some(b) => info!(
                window_size = b.window_size,
                bias = b.bias,
                score = b.score,
                evaluations,
                "genetic search finished"
            ),
            None => info!(evaluations, "genetic search finished with no scored individual"),
        }

        Ok(GeneticOutcome {
            best,
            best_seen,
            generations,
            population: final_population,
            evaluations,
        })
    }

    /// Score individuals without fitness; returns how many were scored.
    fn score_unscored(&self, bars: &[PriceBar], individuals: &mut [Individual]) -> usize {
        let pending: Vec<usize> = individuals
            .iter()
            .enumerate()
            .filter(|(_, ind)| ind.fitness.is_none())
            .map(|(i, _)| i)
            .collect();

        // Undecodable genes skip the objective entirely.
        let decodable: Vec<(usize, LevelParams)> = pending
            .iter()
            .filter_map(|&i| decode(individuals[i].genes).map(|p| (i, p)))
            .collect();
        let params: Vec<LevelParams> = decodable.iter().map(|&(_, p)| p).collect();
        let scored: Vec<Evaluation> = evaluate_candidates(&params, self.parallel, |p| {
            self.objective.score(bars, p)
        });

        for &i in &pending {
            individuals[i].fitness = Some(f64::NEG_INFINITY);
        }
        for (&(i, _), eval) in decodable.iter().zip(&scored) {
            individuals[i].fitness = Some(
                eval.score
                    .filter(|s| !s.is_nan())
                    .unwrap_or(f64::NEG_INFINITY),
            );
        }

        pending.len()
    }

    fn breed(&self, population: &[Individual], biases: &[i64], rng: &mut StdRng) -> Vec<Individual> {
        let cfg = &self.config;
        (0..cfg.offspring_size)
            .map(|_| {
                let op: f64 = rng.gen();
                if op < cfg.cx_probability {
                    let picked = index::sample(rng, population.len(), 2);
                    let (a, b) = (population[picked.index(0)], population[picked.index(1)]);
                    blend(a, b, cfg.blend_alpha, rng)
                } else if op < cfg.cx_probability + cfg.mut_probability {
                    let parent = population[rng.gen_range(0..population.len())];
                    mutate(parent, biases, cfg.window_step, rng)
                } else {
                    population[rng.gen_range(0..population.len())]
                }
            })
            .collect()
    }

    /// `k` tournaments of `tournament_size` aspirants drawn with replacement.
    fn tournament(&self, pool: &[Individual], k: usize, rng: &mut StdRng) -> Vec<Individual> {
        (0..k)
            .map(|_| {
                let aspirants: Vec<Individual> = (0..self.config.tournament_size)
                    .map(|_| pool[rng.gen_range(0..pool.len())])
                    .collect();
                let winner = fittest(&aspirants).unwrap_or(0);
                aspirants[winner]
            })
            .collect()
    }
}

/// Blend crossover; only the first child is kept.
fn blend(a: Individual, b: Individual, alpha: f64, rng: &mut StdRng) -> Individual {
    let mut genes = a.genes;
    for (i, gene) in genes.iter_mut().enumerate() {
        let gamma = (1.0 + 2.0 * alpha) * rng.gen::<f64>() - alpha;
        *gene = (1.0 - gamma) * a.genes[i] + gamma * b.genes[i];
    }
    Individual {
        genes,
        fitness: None,
    }
}

fn mutate(mut ind: Individual, biases: &[i64], window_step: i64, rng: &mut StdRng) -> Individual {
    if rng.gen::<f64>() < 0.5 {
        let shift = rng.gen_range(-window_step..=window_step) as f64;
        ind.genes[0] = (ind.genes[0] + shift).abs().trunc();
    } else if let Some(&bias) = biases.choose(rng) {
        ind.genes[1] = bias as f64;
    }
    ind.fitness = None;
    ind
}

fn generation_stats(generation: usize, evaluated: usize, population: &[Individual]) -> GenerationStats {
    let scored: Vec<f64> = population
        .iter()
        .map(Individual::fitness)
        .filter(|f| f.is_finite())
        .collect();
    let best = scored.iter().copied().fold(None, |acc: Option<f64>, f| {
        Some(acc.map_or(f, |a| a.max(f)))
    });
    let mean = if scored.is_empty() {
        None
    } else {
        Some(scored.iter().sum::<f64>() / scored.len() as f64)
    };
    GenerationStats {
        generation,
        evaluated,
        best,
        mean,
    }
}

/// Convenience wrapper returning the final-population best.
pub fn genetic_search(
    bars: &[PriceBar],
    space: &ParamSpace,
    objective: &Objective,
    config: GeneticConfig,
    parallel: bool,
) -> Result<Option<SearchResult>, GeneticError> {
    Ok(GeneticSearch::new(objective, config)
        .with_parallelism(parallel)
        .run(bars, space)?
        .best)
}
