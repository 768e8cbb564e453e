use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeSet;

use super::{edge_capacity, fill_in_order, remove};
use crate::catalog::{Catalog, MovieId, NodeId};
use crate::placement::Placement;

const REFILL_ATTEMPTS: usize = 100;

/// Removes `count` movies from every edge node, then refills it.
///
/// Without `fill`, exactly as many movies as were removed are added back so
/// the catalog size is unchanged; if no permutation of the candidates manages
/// that within the attempt budget the node keeps its previous catalog. With
/// `fill`, absent movies are tried in random order until nothing else fits.
pub fn replace<R: Rng + ?Sized>(
    catalog: &Catalog,
    current: &Placement,
    count: usize,
    fill: bool,
    rng: &mut R,
) -> Placement {
    let trimmed = remove(current, count, rng);
    let mut next = trimmed.clone();

    for node in NodeId::EDGES {
        let base = trimmed.movies(node);
        let free = edge_capacity(catalog, node).saturating_sub(trimmed.used(catalog, node));
        let pool: Vec<MovieId> = catalog
            .movies()
            .filter(|movie| !base.contains(movie))
            .collect();

        let movies = if fill {
            saturate(catalog, base, free, pool, rng)
        } else {
            let target = current.movies(node).len() - base.len();
            refill_exact(catalog, &base, free, pool, target, rng)
                .unwrap_or_else(|| current.movies(node))
        };
        next = next.with_movies(node, movies);
    }
    next
}

fn saturate<R: Rng + ?Sized>(
    catalog: &Catalog,
    mut movies: BTreeSet<MovieId>,
    mut free: u64,
    mut pool: Vec<MovieId>,
    rng: &mut R,
) -> BTreeSet<MovieId> {
    pool.shuffle(rng);
    fill_in_order(catalog, &mut movies, &mut free, &pool, None);
    movies
}

fn refill_exact<R: Rng + ?Sized>(
    catalog: &Catalog,
    base: &BTreeSet<MovieId>,
    free: u64,
    mut pool: Vec<MovieId>,
    target: usize,
    rng: &mut R,
) -> Option<BTreeSet<MovieId>> {
    for _ in 0..REFILL_ATTEMPTS {
        pool.shuffle(rng);
        let mut movies = base.clone();
        let mut remaining = free;
        if fill_in_order(catalog, &mut movies, &mut remaining, &pool, Some(target)) == target {
            return Some(movies);
        }
    }
    None
}
