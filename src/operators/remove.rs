use rand::seq::SliceRandom;
use rand::Rng;

use crate::catalog::{MovieId, NodeId};
use crate::placement::Placement;

/// Drops `count` movies, drawn without replacement, from every edge node.
pub fn remove<R: Rng + ?Sized>(current: &Placement, count: usize, rng: &mut R) -> Placement {
    let mut next = current.clone();
    for node in NodeId::EDGES {
        let mut movies = current.movies(node);
        let held: Vec<MovieId> = movies.iter().copied().collect();
        for movie in held.choose_multiple(rng, count) {
            movies.remove(movie);
        }
        next = next.with_movies(node, movies);
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operators::test_support::placement;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn remove_zero_is_a_no_op() {
        let current = placement(&[2, 6, 7, 8], &[5, 7]);
        let next = remove(&current, 0, &mut StdRng::seed_from_u64(1));
        assert_eq!(next, current);
    }

    #[test]
    fn remove_drops_a_subset_from_each_edge() {
        let current = placement(&[2, 6, 7, 8], &[5, 7]);
        let mut rng = StdRng::seed_from_u64(8);
        for _ in 0..50 {
            let next = remove(&current, 1, &mut rng);
            for node in NodeId::EDGES {
                let before = current.movies(node);
                let after = next.movies(node);
                assert_eq!(after.len(), before.len() - 1);
                assert!(after.is_subset(&before));
            }
        }
    }

    #[test]
    fn remove_more_than_held_empties_the_node() {
        let current = placement(&[2, 6, 7, 8], &[5]);
        let next = remove(&current, 3, &mut StdRng::seed_from_u64(2));
        assert_eq!(next.movies(NodeId::Asn1).len(), 1);
        assert!(next.movies(NodeId::Asn2).is_empty());
    }
}
