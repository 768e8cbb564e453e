use thiserror::Error;

use crate::catalog::{NodeId, SizeClass};

#[derive(Error, Debug)]
pub enum Error {
    #[error("movie {movie} has size {size}, outside the 700-1500 range")]
    InvalidMovieSize { movie: usize, size: u64 },
    #[error("no service time for group '{group}' on {node} ({class} movies)")]
    MissingServiceTime {
        group: String,
        node: NodeId,
        class: SizeClass,
    },
    #[error("group '{0}' must be linked to the central node")]
    MissingCentralLink(String),
    #[error("invalid intervals: {0}")]
    InvalidIntervals(String),
    #[error("group '{group}' has {got} rates, expected one per interval ({expected})")]
    RateCountMismatch {
        group: String,
        expected: usize,
        got: usize,
    },
    #[error("group '{group}' has {got} popularity weights, expected one per movie ({expected})")]
    PopularityCountMismatch {
        group: String,
        expected: usize,
        got: usize,
    },
    #[error("group '{0}' popularity weights must be non-negative with a positive sum")]
    InvalidPopularity(String),
    #[error("group '{group}' link to {node} needs finite non-negative latency and service times")]
    InvalidLink { group: String, node: NodeId },
    #[error("edge node {0} has no capacity")]
    MissingCapacity(NodeId),
    #[error("central node {0} is unbounded and must not declare a capacity")]
    UnexpectedCapacity(NodeId),
    #[error("handling mean must be > 0 (got {0})")]
    InvalidHandlingMean(f64),
    #[error("jitter bounds must satisfy 0 <= min <= max (got {min}..{max})")]
    InvalidJitter { min: f64, max: f64 },
    #[error("invalid placement: {0}")]
    InvalidPlacement(String),
    #[error("insufficient data: no eligible requests")]
    InsufficientData,
    #[error("unknown operator '{0}'")]
    UnknownOperator(String),
    #[error("operators must not be empty")]
    EmptyOperators,
    #[error("replications must be greater than 0")]
    ZeroReplications,
    #[error("runs must be greater than 0")]
    ZeroRuns,
    #[error("tolerance must be > 0 (got {0})")]
    InvalidTolerance(f64),
    #[error("{0}")]
    ConfigIo(String),
    #[error("{0}")]
    ConfigParse(String),
    #[error("unsupported config format '{0}'")]
    UnsupportedConfigFormat(String),
    #[error("{0}")]
    Cli(String),
}

pub type Result<T> = std::result::Result<T, Error>;
