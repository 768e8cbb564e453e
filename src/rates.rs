use serde::Serialize;
use std::collections::BTreeMap;

use crate::catalog::{Catalog, NodeId};
use crate::placement::{Placement, RoutingTable};
use crate::state::Request;

/// Request rate per node for each interval of the horizon.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct NodeRates {
    rates: BTreeMap<NodeId, Vec<f64>>,
}

impl NodeRates {
    fn zeroed(intervals: usize) -> Self {
        Self {
            rates: NodeId::ALL
                .iter()
                .map(|node| (*node, vec![0.0; intervals]))
                .collect(),
        }
    }

    pub fn get(&self, node: NodeId) -> &[f64] {
        self.rates.get(&node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &[f64])> {
        self.rates.iter().map(|(node, rates)| (*node, rates.as_slice()))
    }

    /// Largest rate over every node/interval pair.
    pub fn max(&self) -> f64 {
        self.rates
            .values()
            .flatten()
            .copied()
            .fold(0.0, f64::max)
    }

    pub fn exceeds(&self, limit: f64) -> bool {
        self.rates.values().flatten().any(|rate| *rate > limit)
    }
}

/// Expected request rate per node and interval, derived from group rates,
/// popularity and routing without simulating.
pub fn theoretical(catalog: &Catalog, placement: &Placement) -> NodeRates {
    let mut rates = NodeRates::zeroed(catalog.intervals().len());
    for (group_idx, group) in catalog.groups().iter().enumerate() {
        let routes = RoutingTable::build(catalog, placement, group_idx);
        let weights = group.normalized_popularity();
        for (interval, group_rate) in group.rates.iter().enumerate() {
            for (movie, weight) in weights.iter().enumerate() {
                if let Some(node_rates) = rates.rates.get_mut(&routes.node_for(movie)) {
                    node_rates[interval] += group_rate.max(0.0) * weight;
                }
            }
        }
    }
    rates
}

/// Realised request rate per node and interval, bucketing requests by creation time.
pub fn observed(catalog: &Catalog, requests: &[Request]) -> NodeRates {
    let mut rates = NodeRates::zeroed(catalog.intervals().len());
    for request in requests {
        let Some(interval) = catalog.interval_index(request.created_at) else {
            continue;
        };
        if let Some(node_rates) = rates.rates.get_mut(&request.node) {
            node_rates[interval] += 1.0;
        }
    }
    for node_rates in rates.rates.values_mut() {
        for (count, interval) in node_rates.iter_mut().zip(catalog.intervals()) {
            *count /= interval.duration();
        }
    }
    rates
}

/// True when no node is expected to receive requests faster than it can handle them.
pub fn is_stable(catalog: &Catalog, placement: &Placement) -> bool {
    !theoretical(catalog, placement).exceeds(catalog.handling_rate())
}

/// Expected number of requests over the horizon divided by its length.
pub fn overall_request_rate(catalog: &Catalog) -> f64 {
    let expected: f64 = catalog
        .groups()
        .iter()
        .map(|group| {
            group
                .rates
                .iter()
                .zip(catalog.intervals())
                .map(|(rate, interval)| rate.max(0.0) * interval.duration())
                .sum::<f64>()
        })
        .sum();
    expected / (catalog.horizon() - catalog.horizon_start())
}
