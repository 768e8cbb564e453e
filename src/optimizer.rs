use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{RngCore, SeedableRng};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::engine::run_simulation;
use crate::error::{Error, Result};
use crate::estimator::{self, Estimate, Metric, WaitingStats};
use crate::models::OptimizerConfig;
use crate::operators::Operator;
use crate::placement::Placement;
use crate::rates;

const REPLICATION_STREAM: u64 = 0xD1B5_4A32_D192_ED03;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    /// Improved on the best metric and became the new best placement.
    Accepted,
    Rejected,
    /// Failed the stability constraint; never simulated.
    Unstable,
    /// No replication produced an eligible request.
    Unevaluated,
}

#[derive(Clone, Debug, Serialize)]
pub struct IterationRecord {
    pub iteration: usize,
    pub operator: Operator,
    pub outcome: Outcome,
    pub estimate: Option<f64>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct OperatorStats {
    pub tried: usize,
    pub accepted: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct OptimizationResult {
    pub metric: Metric,
    /// `None` when no candidate was ever accepted.
    pub best: Option<Placement>,
    pub best_metric: f64,
    pub history: Vec<IterationRecord>,
}

impl OptimizationResult {
    pub fn operator_stats(&self) -> BTreeMap<String, OperatorStats> {
        let mut stats: BTreeMap<String, OperatorStats> = BTreeMap::new();
        for record in &self.history {
            let entry = stats.entry(record.operator.to_string()).or_default();
            entry.tried += 1;
            if record.outcome == Outcome::Accepted {
                entry.accepted += 1;
            }
        }
        stats
    }
}

enum Evaluation {
    Unstable,
    Unevaluated,
    Estimated(Estimate),
}

/// Variable-neighborhood search over edge placements.
///
/// Operators are consulted in list order: an improving candidate resets the
/// cursor to the first operator, anything else moves it to the next one
/// (wrapping). With `random_selection` each iteration draws an operator
/// uniformly instead.
pub struct Optimizer<'a> {
    catalog: &'a Catalog,
    config: OptimizerConfig,
    rng: StdRng,
    replication_seeds: StdRng,
}

impl<'a> Optimizer<'a> {
    pub fn new(catalog: &'a Catalog, config: OptimizerConfig) -> Result<Self> {
        if config.operators.is_empty() {
            return Err(Error::EmptyOperators);
        }
        if config.replications == 0 {
            return Err(Error::ZeroReplications);
        }
        Ok(Self {
            catalog,
            rng: StdRng::seed_from_u64(config.seed),
            replication_seeds: StdRng::seed_from_u64(config.seed ^ REPLICATION_STREAM),
            config,
        })
    }

    pub fn run(&mut self) -> Result<OptimizationResult> {
        let mut best: Option<Placement> = None;
        let mut best_metric = f64::INFINITY;
        let mut cursor = 0usize;
        let mut history = Vec::with_capacity(self.config.iterations);

        for iteration in 0..self.config.iterations {
            let operator = self.select_operator(cursor, best.is_none());
            let candidate = match &best {
                Some(current) => operator.apply(self.catalog, current, &mut self.rng),
                None => operator.apply(self.catalog, &Placement::baseline(), &mut self.rng),
            };

            let (outcome, estimate) = match self.evaluate(&candidate)? {
                Evaluation::Unstable => {
                    debug!(iteration, %operator, "candidate exceeds handling rate, skipped");
                    (Outcome::Unstable, None)
                }
                Evaluation::Unevaluated => {
                    warn!(iteration, %operator, "no replication produced eligible requests");
                    (Outcome::Unevaluated, None)
                }
                Evaluation::Estimated(estimate) if estimate.value() < best_metric => {
                    (Outcome::Accepted, Some(estimate.value()))
                }
                Evaluation::Estimated(estimate) => (Outcome::Rejected, Some(estimate.value())),
            };

            if outcome == Outcome::Accepted {
                best_metric = estimate.unwrap_or(best_metric);
                info!(iteration, %operator, metric = best_metric, "new best placement");
                best = Some(candidate);
                cursor = 0;
            } else {
                cursor = (cursor + 1) % self.config.operators.len();
            }

            history.push(IterationRecord {
                iteration: iteration + 1,
                operator,
                outcome,
                estimate,
            });
        }

        Ok(OptimizationResult {
            metric: self.config.metric,
            best,
            best_metric,
            history,
        })
    }

    fn select_operator(&mut self, cursor: usize, no_best_yet: bool) -> Operator {
        if no_best_yet {
            return Operator::Random;
        }
        if self.config.random_selection {
            if let Some(operator) = self.config.operators.choose(&mut self.rng) {
                return *operator;
            }
        }
        self.config.operators[cursor % self.config.operators.len()]
    }

    fn evaluate(&mut self, candidate: &Placement) -> Result<Evaluation> {
        if self.config.stability_constraint && !rates::is_stable(self.catalog, candidate) {
            return Ok(Evaluation::Unstable);
        }

        let mut metrics = Vec::with_capacity(self.config.replications);
        let mut covariates = Vec::with_capacity(self.config.replications);
        for replication in 0..self.config.replications {
            let seed = self.replication_seeds.next_u64();
            let result = run_simulation(self.catalog, Some(candidate), self.config.arrivals, seed)?;
            let stats = match WaitingStats::from_replication(&result) {
                Ok(stats) => stats,
                Err(Error::InsufficientData) => {
                    debug!(replication, "no eligible requests, replication skipped");
                    continue;
                }
                Err(err) => return Err(err),
            };
            metrics.push(stats.metric(self.config.metric)?);
            if self.config.control_variate {
                covariates.push(rates::observed(self.catalog, &result.requests).max());
            }
        }

        if metrics.is_empty() {
            return Ok(Evaluation::Unevaluated);
        }
        let estimate = if self.config.control_variate {
            let expected = rates::theoretical(self.catalog, candidate);
            estimator::control_variate(&metrics, &covariates, expected.max())?
        } else {
            estimator::estimate(&metrics)?
        };
        Ok(Evaluation::Estimated(estimate))
    }
}

/// Runs the search described by `config` against `catalog`.
pub fn optimize(catalog: &Catalog, config: &OptimizerConfig) -> Result<OptimizationResult> {
    Optimizer::new(catalog, config.clone())?.run()
}
