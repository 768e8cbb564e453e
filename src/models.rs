use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::arrivals::ArrivalStrategy;
use crate::catalog::{NodeId, SizeClass};
use crate::estimator::Metric;
use crate::operators::Operator;
use crate::placement::Placement;

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct FileConfig {
    #[serde(default)]
    pub scenario: SimConfig,
    #[serde(default)]
    pub simulation: SimulationOptions,
    #[serde(default)]
    pub optimizer: OptimizerConfig,
    #[serde(default)]
    pub placement: Option<Placement>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct SimConfig {
    pub intervals: Vec<IntervalConfig>,
    pub movie_sizes: Vec<u64>,
    pub capacities: BTreeMap<NodeId, u64>,
    pub groups: Vec<GroupConfig>,
    pub handling_mean: f64,
    pub jitter: JitterConfig,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct IntervalConfig {
    pub start: f64,
    pub end: f64,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct GroupConfig {
    pub name: String,
    pub rates: Vec<f64>,
    pub popularity: Vec<f64>,
    pub links: BTreeMap<NodeId, LinkConfig>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct LinkConfig {
    pub latency: f64,
    pub service_times: BTreeMap<SizeClass, f64>,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct JitterConfig {
    pub min: f64,
    pub max: f64,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct SimulationOptions {
    pub runs: usize,
    pub seed: u64,
    pub arrivals: ArrivalStrategy,
    pub threshold: f64,
    pub critical_wait: f64,
    pub decay_rate: f64,
    pub bootstrap_resamples: usize,
    /// Target 95% half-width used to size the number of runs.
    pub tolerance: f64,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            runs: 10,
            seed: 42,
            arrivals: ArrivalStrategy::Iterative,
            threshold: 60.0,
            critical_wait: 120.0,
            decay_rate: 0.025,
            bootstrap_resamples: 100,
            tolerance: 0.05,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct OptimizerConfig {
    pub operators: Vec<Operator>,
    pub iterations: usize,
    pub replications: usize,
    pub metric: Metric,
    pub stability_constraint: bool,
    pub control_variate: bool,
    pub random_selection: bool,
    pub seed: u64,
    pub arrivals: ArrivalStrategy,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            operators: vec![
                Operator::Random,
                Operator::Replace {
                    count: 1,
                    fill: false,
                },
                Operator::Replace {
                    count: 2,
                    fill: false,
                },
                Operator::Swap(1),
                Operator::Swap(2),
                Operator::Swap(3),
                Operator::Replace {
                    count: 1,
                    fill: true,
                },
                Operator::Replace {
                    count: 2,
                    fill: true,
                },
                Operator::Replace {
                    count: 3,
                    fill: true,
                },
            ],
            iterations: 25,
            replications: 10,
            metric: Metric::Mean,
            stability_constraint: false,
            control_variate: false,
            random_selection: false,
            seed: 42,
            arrivals: ArrivalStrategy::Iterative,
        }
    }
}

/// Reference scenario: three language groups, ten movies, one hour split in
/// three twenty-minute intervals.
impl Default for SimConfig {
    fn default() -> Self {
        let intervals = vec![
            IntervalConfig {
                start: 0.0,
                end: 1200.0,
            },
            IntervalConfig {
                start: 1200.0,
                end: 2400.0,
            },
            IntervalConfig {
                start: 2400.0,
                end: 3600.0,
            },
        ];
        let capacities = BTreeMap::from([(NodeId::Asn1, 3500), (NodeId::Asn2, 3500)]);

        let groups = vec![
            GroupConfig {
                name: "G1".to_string(),
                rates: vec![0.8, 1.2, 0.5],
                popularity: vec![2.0, 4.0, 9.0, 8.0, 1.0, 3.0, 5.0, 7.0, 10.0, 6.0],
                links: BTreeMap::from([
                    (NodeId::Msn, link(0.5, [9.0, 12.0, 15.0])),
                    (NodeId::Asn1, link(0.2, [3.0, 4.0, 5.0])),
                ]),
            },
            GroupConfig {
                name: "G2".to_string(),
                rates: vec![0.9, 1.3, 0.3],
                popularity: vec![6.0, 1.0, 3.0, 4.0, 7.0, 9.0, 2.0, 5.0, 8.0, 10.0],
                links: BTreeMap::from([
                    (NodeId::Msn, link(0.5, [8.0, 11.0, 14.0])),
                    (NodeId::Asn1, link(0.3, [4.0, 5.0, 6.0])),
                    (NodeId::Asn2, link(0.4, [5.0, 6.0, 7.0])),
                ]),
            },
            GroupConfig {
                name: "G3".to_string(),
                rates: vec![0.7, 1.5, 0.4],
                popularity: vec![4.0, 7.0, 3.0, 6.0, 1.0, 10.0, 2.0, 9.0, 8.0, 5.0],
                links: BTreeMap::from([
                    (NodeId::Msn, link(0.5, [10.0, 13.0, 16.0])),
                    (NodeId::Asn2, link(0.2, [4.0, 5.0, 6.0])),
                ]),
            },
        ];

        Self {
            intervals,
            movie_sizes: vec![850, 950, 1000, 1200, 800, 900, 1000, 750, 700, 1100],
            capacities,
            groups,
            handling_mean: 0.5,
            jitter: JitterConfig { min: 0.3, max: 0.7 },
        }
    }
}

fn link(latency: f64, [small, medium, large]: [f64; 3]) -> LinkConfig {
    LinkConfig {
        latency,
        service_times: BTreeMap::from([
            (SizeClass::Small, small),
            (SizeClass::Medium, medium),
            (SizeClass::Large, large),
        ]),
    }
}
