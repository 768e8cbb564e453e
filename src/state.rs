use serde::Serialize;
use std::collections::BTreeMap;

use crate::catalog::{MovieId, NodeId};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Request {
    pub id: usize,
    pub group: usize,
    pub movie: MovieId,
    pub node: NodeId,
    pub created_at: f64,
    pub latency: f64,
    pub arrived_at: f64,
    /// Deterministic service component for (group, node, size class).
    pub service_time: f64,
    pub handled_at: Option<f64>,
    pub served_at: Option<f64>,
    pub eligible: bool,
}

impl Request {
    /// Pure queueing delay: handling start minus arrival.
    pub fn waiting_time(&self) -> Option<f64> {
        Some(self.handled_at? - self.arrived_at)
    }

    pub fn processing_time(&self) -> Option<f64> {
        Some(self.served_at? - self.handled_at?)
    }

    pub fn total_time(&self) -> Option<f64> {
        Some(self.served_at? - self.arrived_at)
    }
}

/// One full execution of a simulation run.
#[derive(Clone, Debug, Serialize)]
pub struct Replication {
    pub requests: Vec<Request>,
    pub horizon: f64,
}

impl Replication {
    pub fn eligible(&self) -> impl Iterator<Item = &Request> {
        self.requests.iter().filter(|request| request.eligible)
    }

    pub fn eligible_count(&self) -> usize {
        self.eligible().count()
    }

    pub fn waiting_times(&self) -> Vec<f64> {
        self.eligible()
            .filter_map(|request| request.waiting_time())
            .collect()
    }

    pub fn processing_times(&self) -> Vec<f64> {
        self.eligible()
            .filter_map(|request| request.processing_time())
            .collect()
    }

    pub fn total_times(&self) -> Vec<f64> {
        self.eligible()
            .filter_map(|request| request.total_time())
            .collect()
    }

    /// Requests generated per node, eligible or not.
    pub fn node_counts(&self) -> BTreeMap<NodeId, usize> {
        let mut counts: BTreeMap<NodeId, usize> =
            NodeId::ALL.iter().map(|node| (*node, 0)).collect();
        for request in &self.requests {
            *counts.entry(request.node).or_default() += 1;
        }
        counts
    }

    /// Share of eligible requests served by an edge node.
    pub fn edge_hit_ratio(&self) -> Option<f64> {
        let eligible = self.eligible_count();
        if eligible == 0 {
            return None;
        }
        let hits = self
            .eligible()
            .filter(|request| !request.node.is_central())
            .count();
        Some(hits as f64 / eligible as f64)
    }
}
