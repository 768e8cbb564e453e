use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::catalog::{Catalog, MovieId, NodeId};
use crate::error::{Error, Result};

/// Movie catalogs of the capacity-constrained nodes. The central node is
/// implicit and always holds every movie.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Placement {
    catalogs: BTreeMap<NodeId, BTreeSet<MovieId>>,
}

impl Placement {
    /// Everything served from the central node.
    pub fn baseline() -> Self {
        Self::default()
    }

    pub fn from_catalogs<I>(catalogs: I) -> Self
    where
        I: IntoIterator<Item = (NodeId, BTreeSet<MovieId>)>,
    {
        Self {
            catalogs: catalogs
                .into_iter()
                .filter(|(node, movies)| !node.is_central() && !movies.is_empty())
                .collect(),
        }
    }

    pub fn holds(&self, node: NodeId, movie: MovieId) -> bool {
        if node.is_central() {
            return true;
        }
        self.catalogs
            .get(&node)
            .is_some_and(|movies| movies.contains(&movie))
    }

    /// Catalog of an edge node (empty when unset).
    pub fn movies(&self, node: NodeId) -> BTreeSet<MovieId> {
        self.catalogs.get(&node).cloned().unwrap_or_default()
    }

    /// Replaces the catalog of an edge node; empty catalogs are dropped.
    pub fn with_movies(mut self, node: NodeId, movies: BTreeSet<MovieId>) -> Self {
        if node.is_central() {
            return self;
        }
        if movies.is_empty() {
            self.catalogs.remove(&node);
        } else {
            self.catalogs.insert(node, movies);
        }
        self
    }

    pub fn used(&self, catalog: &Catalog, node: NodeId) -> u64 {
        self.catalogs.get(&node).map_or(0, |movies| {
            movies
                .iter()
                .map(|movie| catalog.movie_size(*movie))
                .fold(0, u64::saturating_add)
        })
    }

    pub fn fits(&self, catalog: &Catalog) -> bool {
        NodeId::EDGES.iter().all(|node| match catalog.capacity(*node) {
            Some(capacity) => self.used(catalog, *node) <= capacity,
            None => true,
        })
    }

    /// Checks movie ids and capacities of a placement loaded from outside.
    pub fn validate(&self, catalog: &Catalog) -> Result<()> {
        for (node, movies) in &self.catalogs {
            if node.is_central() {
                return Err(Error::InvalidPlacement(format!(
                    "{} always holds every movie and must not be listed",
                    node
                )));
            }
            if let Some(movie) = movies.iter().find(|movie| **movie >= catalog.movie_count()) {
                return Err(Error::InvalidPlacement(format!(
                    "{} lists unknown movie {}",
                    node, movie
                )));
            }
            if let Some(capacity) = catalog.capacity(*node) {
                let used = self.used(catalog, *node);
                if used > capacity {
                    return Err(Error::InvalidPlacement(format!(
                        "{} holds {} but its capacity is {}",
                        node, used, capacity
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Lowest-latency reachable node holding `movie` for `group`.
pub fn resolve(catalog: &Catalog, placement: &Placement, group: usize, movie: MovieId) -> NodeId {
    let mut best = NodeId::CENTRAL;
    let mut best_latency = f64::INFINITY;
    for (node, link) in &catalog.group(group).links {
        if placement.holds(*node, movie) && link.latency < best_latency {
            best = *node;
            best_latency = link.latency;
        }
    }
    best
}

/// Movie-to-node lookup for one group under one placement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoutingTable {
    nodes: Vec<NodeId>,
}

impl RoutingTable {
    pub fn build(catalog: &Catalog, placement: &Placement, group: usize) -> Self {
        let nodes = catalog
            .movies()
            .map(|movie| resolve(catalog, placement, group, movie))
            .collect();
        Self { nodes }
    }

    /// One table per group, in catalog group order.
    pub fn build_all(catalog: &Catalog, placement: &Placement) -> Vec<Self> {
        (0..catalog.groups().len())
            .map(|group| Self::build(catalog, placement, group))
            .collect()
    }

    pub fn node_for(&self, movie: MovieId) -> NodeId {
        self.nodes[movie]
    }
}
