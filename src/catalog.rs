use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;

use crate::error::{Error, Result};
use crate::models::{GroupConfig, SimConfig};

pub type MovieId = usize;

/// Storage nodes of the delivery network. `Msn` is the unbounded central
/// node; the two `Asn` nodes are capacity-constrained edges.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
pub enum NodeId {
    #[serde(rename = "MSN")]
    Msn,
    #[serde(rename = "ASN1")]
    Asn1,
    #[serde(rename = "ASN2")]
    Asn2,
}

impl NodeId {
    pub const ALL: [NodeId; 3] = [NodeId::Msn, NodeId::Asn1, NodeId::Asn2];
    pub const EDGES: [NodeId; 2] = [NodeId::Asn1, NodeId::Asn2];
    pub const CENTRAL: NodeId = NodeId::Msn;

    pub fn is_central(self) -> bool {
        self == NodeId::CENTRAL
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NodeId::Msn => "MSN",
            NodeId::Asn1 => "ASN1",
            NodeId::Asn2 => "ASN2",
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed partition of the movie size scale used to look up service times.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeClass {
    Small,
    Medium,
    Large,
}

impl SizeClass {
    /// Small is 700..=900, medium 901..=1100, large 1101..=1500.
    pub fn from_size(size: u64) -> Option<Self> {
        match size {
            700..=900 => Some(SizeClass::Small),
            901..=1100 => Some(SizeClass::Medium),
            1101..=1500 => Some(SizeClass::Large),
            _ => None,
        }
    }
}

impl fmt::Display for SizeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SizeClass::Small => "small",
            SizeClass::Medium => "medium",
            SizeClass::Large => "large",
        };
        f.write_str(label)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Interval {
    pub start: f64,
    pub end: f64,
}

impl Interval {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn contains(&self, time: f64) -> bool {
        time >= self.start && time < self.end
    }
}

#[derive(Clone, Debug)]
pub struct Link {
    pub latency: f64,
    service_times: BTreeMap<SizeClass, f64>,
}

#[derive(Clone, Debug)]
pub struct Group {
    pub name: String,
    pub rates: Vec<f64>,
    pub popularity: Vec<f64>,
    pub links: BTreeMap<NodeId, Link>,
}

impl Group {
    pub fn latency(&self, node: NodeId) -> Option<f64> {
        self.links.get(&node).map(|link| link.latency)
    }

    /// Popularity weights scaled to sum to one.
    pub fn normalized_popularity(&self) -> Vec<f64> {
        let total: f64 = self.popularity.iter().sum();
        self.popularity.iter().map(|weight| weight / total).collect()
    }
}

/// Immutable reference data shared by every component of a run.
#[derive(Clone, Debug)]
pub struct Catalog {
    intervals: Vec<Interval>,
    movie_sizes: Vec<u64>,
    capacities: BTreeMap<NodeId, u64>,
    groups: Vec<Group>,
    handling_mean: f64,
    jitter: (f64, f64),
}

impl Catalog {
    pub fn new(config: &SimConfig) -> Result<Self> {
        let intervals = validate_intervals(config)?;
        validate_capacities(config)?;

        if !(config.handling_mean.is_finite() && config.handling_mean > 0.0) {
            return Err(Error::InvalidHandlingMean(config.handling_mean));
        }
        let (min, max) = (config.jitter.min, config.jitter.max);
        if !(min.is_finite() && max.is_finite() && min >= 0.0 && min <= max) {
            return Err(Error::InvalidJitter { min, max });
        }

        let groups = config
            .groups
            .iter()
            .map(|group| build_group(group, intervals.len(), config.movie_sizes.len()))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            intervals,
            movie_sizes: config.movie_sizes.clone(),
            capacities: config.capacities.clone(),
            groups,
            handling_mean: config.handling_mean,
            jitter: (min, max),
        })
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    /// End of the last interval; requests arriving later are ineligible.
    pub fn horizon(&self) -> f64 {
        self.intervals.last().map_or(0.0, |interval| interval.end)
    }

    pub fn horizon_start(&self) -> f64 {
        self.intervals.first().map_or(0.0, |interval| interval.start)
    }

    pub fn interval_index(&self, time: f64) -> Option<usize> {
        self.intervals
            .iter()
            .position(|interval| interval.contains(time))
    }

    pub fn movies(&self) -> Range<MovieId> {
        0..self.movie_sizes.len()
    }

    pub fn movie_count(&self) -> usize {
        self.movie_sizes.len()
    }

    pub fn movie_size(&self, movie: MovieId) -> u64 {
        self.movie_sizes[movie]
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn group(&self, idx: usize) -> &Group {
        &self.groups[idx]
    }

    /// `None` for the unbounded central node.
    pub fn capacity(&self, node: NodeId) -> Option<u64> {
        self.capacities.get(&node).copied()
    }

    pub fn handling_mean(&self) -> f64 {
        self.handling_mean
    }

    pub fn handling_rate(&self) -> f64 {
        1.0 / self.handling_mean
    }

    pub fn jitter(&self) -> (f64, f64) {
        self.jitter
    }

    pub fn size_class(&self, movie: MovieId) -> Result<SizeClass> {
        let size = self.movie_size(movie);
        SizeClass::from_size(size).ok_or(Error::InvalidMovieSize { movie, size })
    }

    pub fn latency(&self, group: usize, node: NodeId) -> Option<f64> {
        self.groups[group].latency(node)
    }

    /// Deterministic part of the service time for a movie served to `group` from `node`.
    pub fn service_time(&self, group: usize, node: NodeId, movie: MovieId) -> Result<f64> {
        let class = self.size_class(movie)?;
        let group = &self.groups[group];
        group
            .links
            .get(&node)
            .and_then(|link| link.service_times.get(&class))
            .copied()
            .ok_or_else(|| Error::MissingServiceTime {
                group: group.name.clone(),
                node,
                class,
            })
    }
}

fn validate_intervals(config: &SimConfig) -> Result<Vec<Interval>> {
    if config.intervals.is_empty() {
        return Err(Error::InvalidIntervals("at least one interval is required".to_string()));
    }

    let mut intervals = Vec::with_capacity(config.intervals.len());
    let mut previous_end: Option<f64> = None;
    for (idx, entry) in config.intervals.iter().enumerate() {
        if !(entry.start.is_finite() && entry.end.is_finite()) || entry.start >= entry.end {
            return Err(Error::InvalidIntervals(format!(
                "interval {} must satisfy start < end (got {}..{})",
                idx, entry.start, entry.end
            )));
        }
        if let Some(end) = previous_end {
            if entry.start < end {
                return Err(Error::InvalidIntervals(format!(
                    "interval {} starts at {} before the previous one ends at {}",
                    idx, entry.start, end
                )));
            }
        }
        previous_end = Some(entry.end);
        intervals.push(Interval {
            start: entry.start,
            end: entry.end,
        });
    }

    Ok(intervals)
}

fn validate_capacities(config: &SimConfig) -> Result<()> {
    if config.capacities.contains_key(&NodeId::CENTRAL) {
        return Err(Error::UnexpectedCapacity(NodeId::CENTRAL));
    }
    for node in NodeId::EDGES {
        if !config.capacities.contains_key(&node) {
            return Err(Error::MissingCapacity(node));
        }
    }
    Ok(())
}

fn build_group(config: &GroupConfig, intervals: usize, movies: usize) -> Result<Group> {
    if config.rates.len() != intervals {
        return Err(Error::RateCountMismatch {
            group: config.name.clone(),
            expected: intervals,
            got: config.rates.len(),
        });
    }
    if config.popularity.len() != movies {
        return Err(Error::PopularityCountMismatch {
            group: config.name.clone(),
            expected: movies,
            got: config.popularity.len(),
        });
    }
    let valid_weights = config
        .popularity
        .iter()
        .all(|weight| weight.is_finite() && *weight >= 0.0);
    if !valid_weights || config.popularity.iter().sum::<f64>() <= 0.0 {
        return Err(Error::InvalidPopularity(config.name.clone()));
    }
    if !config.links.contains_key(&NodeId::CENTRAL) {
        return Err(Error::MissingCentralLink(config.name.clone()));
    }

    let mut links = BTreeMap::new();
    for (node, link) in &config.links {
        let valid = std::iter::once(&link.latency)
            .chain(link.service_times.values())
            .all(|value| value.is_finite() && *value >= 0.0);
        if !valid {
            return Err(Error::InvalidLink {
                group: config.name.clone(),
                node: *node,
            });
        }
        links.insert(
            *node,
            Link {
                latency: link.latency,
                service_times: link.service_times.clone(),
            },
        );
    }

    Ok(Group {
        name: config.name.clone(),
        rates: config.rates.clone(),
        popularity: config.popularity.clone(),
        links,
    })
}
