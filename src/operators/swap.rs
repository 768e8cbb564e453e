use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeSet;

use crate::catalog::{Catalog, MovieId, NodeId};
use crate::placement::Placement;

const SWAP_RETRIES: usize = 1000;

/// Exchanges `count` movies between the two edge nodes.
///
/// Draws that overflow a node or shrink either catalog (a movie landing on
/// a node that already holds it) are retried; once the retries are spent
/// the current placement is returned unchanged.
pub fn swap<R: Rng + ?Sized>(
    catalog: &Catalog,
    current: &Placement,
    count: usize,
    rng: &mut R,
) -> Placement {
    let [first, second] = NodeId::EDGES;
    let first_movies = current.movies(first);
    let second_movies = current.movies(second);
    if count == 0 || count > first_movies.len() || count > second_movies.len() {
        return current.clone();
    }

    let first_held: Vec<MovieId> = first_movies.iter().copied().collect();
    let second_held: Vec<MovieId> = second_movies.iter().copied().collect();

    for _ in 0..SWAP_RETRIES {
        let outgoing_first: BTreeSet<MovieId> =
            first_held.choose_multiple(rng, count).copied().collect();
        let outgoing_second: BTreeSet<MovieId> =
            second_held.choose_multiple(rng, count).copied().collect();

        let next_first = exchange(&first_movies, &outgoing_first, &outgoing_second);
        let next_second = exchange(&second_movies, &outgoing_second, &outgoing_first);
        if next_first.len() < first_movies.len() || next_second.len() < second_movies.len() {
            continue;
        }

        let candidate = current
            .clone()
            .with_movies(first, next_first)
            .with_movies(second, next_second);
        if candidate.fits(catalog) {
            return candidate;
        }
    }

    current.clone()
}

fn exchange(
    held: &BTreeSet<MovieId>,
    outgoing: &BTreeSet<MovieId>,
    incoming: &BTreeSet<MovieId>,
) -> BTreeSet<MovieId> {
    held.difference(outgoing).chain(incoming).copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operators::random;
    use crate::operators::test_support::{placement, reference};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn swap_moves_movies_between_edges() {
        let catalog = reference();
        let current = placement(&[2, 6], &[5, 7]);
        let next = swap(&catalog, &current, 1, &mut StdRng::seed_from_u64(6));

        let first = next.movies(NodeId::Asn1);
        let second = next.movies(NodeId::Asn2);
        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 2);
        let union: BTreeSet<MovieId> = first.union(&second).copied().collect();
        assert_eq!(union, BTreeSet::from([2, 5, 6, 7]));
        assert_ne!(next, current);
    }

    #[test]
    fn swap_preserves_sizes_and_capacity() {
        let catalog = reference();
        let mut rng = StdRng::seed_from_u64(19);
        for _ in 0..100 {
            let current = random(&catalog, &mut rng);
            for count in 1..=3 {
                let next = swap(&catalog, &current, count, &mut rng);
                assert!(next.fits(&catalog));
                for node in NodeId::EDGES {
                    assert_eq!(next.movies(node).len(), current.movies(node).len());
                }
            }
        }
    }

    #[test]
    fn impossible_swap_returns_current_placement() {
        let catalog = reference();
        // trading the only movie both nodes hold changes nothing
        let current = placement(&[3], &[3]);
        let next = swap(&catalog, &current, 1, &mut StdRng::seed_from_u64(1));
        assert_eq!(next, current);

        let too_many = swap(&catalog, &current, 2, &mut StdRng::seed_from_u64(1));
        assert_eq!(too_many, current);
    }

    #[test]
    fn capacity_violations_are_rejected() {
        let catalog = reference();
        // ASN1 is at 3450 and holds nothing larger than 1000, so taking 1200 overflows it
        let current = placement(&[2, 6, 7, 8], &[3]);
        let next = swap(&catalog, &current, 1, &mut StdRng::seed_from_u64(2));
        assert!(next.fits(&catalog));
        assert_eq!(next, current);
    }
}
