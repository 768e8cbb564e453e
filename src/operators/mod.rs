mod random;
mod remove;
mod replace;
mod swap;

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::catalog::{Catalog, MovieId, NodeId};
use crate::error::Error;
use crate::placement::Placement;

pub use random::random;
pub use remove::remove;
pub use replace::replace;
pub use swap::swap;

/// Neighborhood operators of the placement search. Every operator returns a
/// new placement and only touches the capacity-constrained nodes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub enum Operator {
    Random,
    Remove(usize),
    Replace { count: usize, fill: bool },
    Swap(usize),
}

impl Operator {
    /// Name patterns accepted by [`Operator::from_str`].
    pub const FAMILIES: [&'static str; 5] = [
        "random",
        "remove_<n>",
        "replace_<n>",
        "replace_<n>_fill",
        "swap_<n>",
    ];

    pub fn apply<R: Rng + ?Sized>(
        self,
        catalog: &Catalog,
        current: &Placement,
        rng: &mut R,
    ) -> Placement {
        match self {
            Operator::Random => random(catalog, rng),
            Operator::Remove(count) => remove(current, count, rng),
            Operator::Replace { count, fill } => replace(catalog, current, count, fill, rng),
            Operator::Swap(count) => swap(catalog, current, count, rng),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Random => write!(f, "random"),
            Operator::Remove(count) => write!(f, "remove_{}", count),
            Operator::Replace { count, fill: false } => write!(f, "replace_{}", count),
            Operator::Replace { count, fill: true } => write!(f, "replace_{}_fill", count),
            Operator::Swap(count) => write!(f, "swap_{}", count),
        }
    }
}

impl FromStr for Operator {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let name = value.trim();
        let unknown = || Error::UnknownOperator(value.to_string());

        if name == "random" {
            return Ok(Operator::Random);
        }
        if let Some(rest) = name.strip_prefix("remove_") {
            return parse_count(rest).map(Operator::Remove).ok_or_else(unknown);
        }
        if let Some(rest) = name.strip_prefix("swap_") {
            return parse_count(rest).map(Operator::Swap).ok_or_else(unknown);
        }
        if let Some(rest) = name.strip_prefix("replace_") {
            let (count, fill) = match rest.strip_suffix("_fill") {
                Some(count) => (count, true),
                None => (rest, false),
            };
            return parse_count(count)
                .map(|count| Operator::Replace { count, fill })
                .ok_or_else(unknown);
        }
        Err(unknown())
    }
}

impl TryFrom<String> for Operator {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Operator> for String {
    fn from(value: Operator) -> Self {
        value.to_string()
    }
}

fn parse_count(value: &str) -> Option<usize> {
    match value {
        "one" => Some(1),
        "two" => Some(2),
        "three" => Some(3),
        digits => digits.parse().ok(),
    }
}

fn edge_capacity(catalog: &Catalog, node: NodeId) -> u64 {
    catalog.capacity(node).unwrap_or(u64::MAX)
}

/// Adds movies from `pool` in order whenever they fit `remaining`, up to
/// `limit` additions. Returns how many were added.
fn fill_in_order(
    catalog: &Catalog,
    movies: &mut BTreeSet<MovieId>,
    remaining: &mut u64,
    pool: &[MovieId],
    limit: Option<usize>,
) -> usize {
    let mut added = 0;
    for movie in pool {
        if limit.is_some_and(|limit| added >= limit) {
            break;
        }
        let size = catalog.movie_size(*movie);
        if size <= *remaining && movies.insert(*movie) {
            *remaining -= size;
            added += 1;
        }
    }
    added
}
