use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeSet;

use super::{edge_capacity, fill_in_order};
use crate::catalog::{Catalog, MovieId, NodeId};
use crate::placement::Placement;

/// Fills every edge node independently from a random permutation of the
/// movies, keeping each one that still fits.
pub fn random<R: Rng + ?Sized>(catalog: &Catalog, rng: &mut R) -> Placement {
    let mut placement = Placement::baseline();
    for node in NodeId::EDGES {
        let mut pool: Vec<MovieId> = catalog.movies().collect();
        pool.shuffle(rng);

        let mut movies = BTreeSet::new();
        let mut remaining = edge_capacity(catalog, node);
        fill_in_order(catalog, &mut movies, &mut remaining, &pool, None);
        placement = placement.with_movies(node, movies);
    }
    placement
}
