use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::arrivals::{ArrivalGenerator, ArrivalStrategy};
use crate::catalog::{Catalog, NodeId};
use crate::error::{Error, Result};
use crate::estimator::{self, Metric, ThresholdCount, WaitingStats};
use crate::models::SimulationOptions;
use crate::placement::{Placement, RoutingTable};
use crate::rates;
use crate::queue::StochasticQueue;
use crate::state::{Replication, Request};

// Keeps the service stream independent of the arrival stream for one seed.
const SERVICE_STREAM: u64 = 0x9E37_79B9_7F4A_7C15;

pub struct SimulationEngine<'a> {
    catalog: &'a Catalog,
    arrivals: ArrivalGenerator<'a>,
    queue: StochasticQueue,
    arrival_rng: StdRng,
    service_rng: StdRng,
}

impl<'a> SimulationEngine<'a> {
    pub fn new(catalog: &'a Catalog, strategy: ArrivalStrategy, seed: u64) -> Result<Self> {
        Ok(Self {
            catalog,
            arrivals: ArrivalGenerator::new(catalog, strategy),
            queue: StochasticQueue::from_catalog(catalog)?,
            arrival_rng: StdRng::seed_from_u64(seed),
            service_rng: StdRng::seed_from_u64(seed ^ SERVICE_STREAM),
        })
    }

    /// Generates one horizon of requests under `placement` and replays each
    /// node's queue. Requests come back grouped by node, in arrival order.
    pub fn run(&mut self, placement: &Placement) -> Result<Replication> {
        let horizon = self.catalog.horizon();
        let routes = RoutingTable::build_all(self.catalog, placement);
        let mut per_node: BTreeMap<NodeId, Vec<Request>> = BTreeMap::new();
        let mut next_id = 0usize;

        for (group, table) in routes.iter().enumerate() {
            for arrival in self.arrivals.generate(group, &mut self.arrival_rng)? {
                let node = table.node_for(arrival.movie);
                let latency = self
                    .catalog
                    .latency(group, node)
                    .ok_or_else(|| Error::MissingCentralLink(self.catalog.group(group).name.clone()))?;
                let service_time = self.catalog.service_time(group, node, arrival.movie)?;
                let arrived_at = arrival.created_at + latency;

                per_node.entry(node).or_default().push(Request {
                    id: next_id,
                    group,
                    movie: arrival.movie,
                    node,
                    created_at: arrival.created_at,
                    latency,
                    arrived_at,
                    service_time,
                    handled_at: None,
                    served_at: None,
                    eligible: arrived_at <= horizon,
                });
                next_id += 1;
            }
        }

        let mut requests = Vec::with_capacity(next_id);
        for (node, mut batch) in per_node {
            self.queue.process(&mut batch, &mut self.service_rng);
            debug!(node = %node, requests = batch.len(), "replayed node queue");
            requests.extend(batch);
        }

        Ok(Replication { requests, horizon })
    }
}

/// One replication; `None` runs the all-on-central baseline.
pub fn run_simulation(
    catalog: &Catalog,
    placement: Option<&Placement>,
    strategy: ArrivalStrategy,
    seed: u64,
) -> Result<Replication> {
    let baseline = Placement::baseline();
    let mut engine = SimulationEngine::new(catalog, strategy, seed)?;
    engine.run(placement.unwrap_or(&baseline))
}

#[derive(Clone, Debug, Serialize)]
pub struct WaitingSummary {
    pub mean: f64,
    pub median: f64,
    pub variance: f64,
    pub max: f64,
    pub above_threshold: ThresholdCount,
    pub mean_satisfaction: f64,
    /// Mean handling start to completion.
    pub mean_processing: f64,
    /// Mean arrival at the node to completion.
    pub mean_total: f64,
    pub bootstrap_mse: f64,
    /// Runs needed for the mean wait to reach the configured tolerance.
    pub required_replications: usize,
}

#[derive(Clone, Debug, Serialize)]
pub struct RunSummary {
    pub run: usize,
    pub requests: usize,
    pub eligible: usize,
    pub edge_hit_ratio: Option<f64>,
    /// `None` when the run had no eligible request.
    pub waiting: Option<WaitingSummary>,
}

#[derive(Clone, Debug, Serialize)]
pub struct SimulationReport {
    pub seed: u64,
    pub arrivals: ArrivalStrategy,
    pub threshold: f64,
    /// Expected requests per second over the horizon, all groups together.
    pub request_rate: f64,
    pub placement: Placement,
    pub runs: Vec<RunSummary>,
    pub node_totals: BTreeMap<NodeId, usize>,
}

impl SimulationReport {
    /// Average of a waiting statistic over the runs that produced one.
    pub fn average<F>(&self, pick: F) -> Option<f64>
    where
        F: Fn(&WaitingSummary) -> f64,
    {
        let values: Vec<f64> = self
            .runs
            .iter()
            .filter_map(|run| run.waiting.as_ref().map(&pick))
            .collect();
        if values.is_empty() {
            None
        } else {
            Some(values.iter().sum::<f64>() / values.len() as f64)
        }
    }
}

/// Runs `options.runs` consecutive replications of one placement and
/// summarises the waiting times of each.
pub fn simulate_runs(
    catalog: &Catalog,
    placement: Option<&Placement>,
    options: &SimulationOptions,
) -> Result<SimulationReport> {
    if options.runs == 0 {
        return Err(Error::ZeroRuns);
    }
    if !(options.tolerance.is_finite() && options.tolerance > 0.0) {
        return Err(Error::InvalidTolerance(options.tolerance));
    }
    let placement = placement.cloned().unwrap_or_default();
    placement.validate(catalog)?;

    let mut engine = SimulationEngine::new(catalog, options.arrivals, options.seed)?;
    let mut bootstrap_rng = StdRng::seed_from_u64(options.seed.wrapping_add(1));
    let mut node_totals: BTreeMap<NodeId, usize> =
        NodeId::ALL.iter().map(|node| (*node, 0)).collect();
    let mut runs = Vec::with_capacity(options.runs);

    for run in 0..options.runs {
        let replication = engine.run(&placement)?;
        for (node, count) in replication.node_counts() {
            *node_totals.entry(node).or_default() += count;
        }

        let waiting = match WaitingStats::from_replication(&replication) {
            Ok(stats) => Some(summarize(&stats, &replication, options, &mut bootstrap_rng)?),
            Err(Error::InsufficientData) => {
                debug!(run, "no eligible requests, skipping statistics");
                None
            }
            Err(err) => return Err(err),
        };

        runs.push(RunSummary {
            run: run + 1,
            requests: replication.requests.len(),
            eligible: replication.eligible_count(),
            edge_hit_ratio: replication.edge_hit_ratio(),
            waiting,
        });
    }

    let report = SimulationReport {
        seed: options.seed,
        arrivals: options.arrivals,
        threshold: options.threshold,
        request_rate: rates::overall_request_rate(catalog),
        placement,
        runs,
        node_totals,
    };
    info!(
        runs = report.runs.len(),
        mean_wait = report.average(|w| w.mean).unwrap_or(f64::NAN),
        "simulation finished"
    );
    Ok(report)
}

fn summarize(
    stats: &WaitingStats,
    replication: &Replication,
    options: &SimulationOptions,
    rng: &mut StdRng,
) -> Result<WaitingSummary> {
    let bootstrap_mse = stats.bootstrap_mse(Metric::Mean, options.bootstrap_resamples, rng)?;
    Ok(WaitingSummary {
        mean: stats.metric(Metric::Mean)?,
        median: stats.metric(Metric::Median)?,
        variance: stats.metric(Metric::Variance)?,
        max: stats.metric(Metric::Max)?,
        above_threshold: stats.above_threshold(options.threshold),
        mean_satisfaction: stats.mean_satisfaction(options.critical_wait, options.decay_rate),
        mean_processing: estimator::mean(&replication.processing_times())?,
        mean_total: estimator::mean(&replication.total_times())?,
        bootstrap_mse,
        required_replications: estimator::required_replications(bootstrap_mse, options.tolerance),
    })
}
