use clap::error::ErrorKind;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::arrivals::ArrivalStrategy;
use crate::config::load_config;
use crate::error::{Error, Result};
use crate::estimator::Metric;
use crate::models::{FileConfig, OptimizerConfig, SimulationOptions};
use crate::operators::Operator;

#[derive(Parser, Debug)]
#[command(name = "vod-placement", version, about = "Movie placement simulator for a VoD network")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay one placement for several runs and report waiting times.
    Simulate(SimulateArgs),
    /// Search for the placement that minimises the waiting-time metric.
    Optimize(OptimizeArgs),
    ListOperators,
    ShowConfig(CommonArgs),
}

impl Command {
    pub fn verbose(&self) -> bool {
        match self {
            Command::Simulate(args) => args.common.verbose,
            Command::Optimize(args) => args.common.verbose,
            Command::ShowConfig(common) => common.verbose,
            Command::ListOperators => false,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Scenario file (.toml or .json); the reference scenario otherwise.
    #[arg(long)]
    pub config: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = FormatArg::Human)]
    pub format: FormatArg,
    #[arg(long, short)]
    pub verbose: bool,
}

impl CommonArgs {
    pub fn load(&self) -> Result<FileConfig> {
        match &self.config {
            Some(path) => load_config(path),
            None => Ok(FileConfig::default()),
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct SimulateArgs {
    #[command(flatten)]
    pub common: CommonArgs,
    #[arg(long)]
    pub seed: Option<u64>,
    #[arg(long)]
    pub runs: Option<usize>,
    /// Waiting time (s) above which a request counts as late.
    #[arg(long)]
    pub threshold: Option<f64>,
    /// Target 95% half-width (s) of the mean wait, used to size runs.
    #[arg(long)]
    pub tolerance: Option<f64>,
    #[arg(long, value_enum)]
    pub arrivals: Option<ArrivalsArg>,
}

impl SimulateArgs {
    pub fn apply(&self, options: &mut SimulationOptions) {
        if let Some(seed) = self.seed {
            options.seed = seed;
        }
        if let Some(runs) = self.runs {
            options.runs = runs;
        }
        if let Some(threshold) = self.threshold {
            options.threshold = threshold;
        }
        if let Some(tolerance) = self.tolerance {
            options.tolerance = tolerance;
        }
        if let Some(arrivals) = self.arrivals {
            options.arrivals = arrivals.into();
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct OptimizeArgs {
    #[command(flatten)]
    pub common: CommonArgs,
    #[arg(long)]
    pub seed: Option<u64>,
    /// Operator name, repeatable; order sets the neighborhood sequence.
    #[arg(long = "operator", value_name = "NAME")]
    pub operators: Vec<Operator>,
    #[arg(long)]
    pub iterations: Option<usize>,
    #[arg(long)]
    pub replications: Option<usize>,
    #[arg(long, value_enum)]
    pub metric: Option<MetricArg>,
    /// Skip candidates whose expected per-node rate exceeds the handling rate.
    /// A bare flag means `true`; pass `false` to override a config file.
    #[arg(long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true")]
    pub stability: Option<bool>,
    #[arg(long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true")]
    pub control_variate: Option<bool>,
    #[arg(long, value_name = "BOOL", num_args = 0..=1, default_missing_value = "true")]
    pub random_selection: Option<bool>,
    #[arg(long, value_enum)]
    pub arrivals: Option<ArrivalsArg>,
}

impl OptimizeArgs {
    pub fn apply(&self, config: &mut OptimizerConfig) {
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if !self.operators.is_empty() {
            config.operators = self.operators.clone();
        }
        if let Some(iterations) = self.iterations {
            config.iterations = iterations;
        }
        if let Some(replications) = self.replications {
            config.replications = replications;
        }
        if let Some(metric) = self.metric {
            config.metric = metric.into();
        }
        if let Some(arrivals) = self.arrivals {
            config.arrivals = arrivals.into();
        }
        if let Some(stability) = self.stability {
            config.stability_constraint = stability;
        }
        if let Some(control_variate) = self.control_variate {
            config.control_variate = control_variate;
        }
        if let Some(random_selection) = self.random_selection {
            config.random_selection = random_selection;
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormatArg {
    Human,
    Summary,
    Json,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum MetricArg {
    Mean,
    Median,
    Variance,
    Max,
}

impl From<MetricArg> for Metric {
    fn from(value: MetricArg) -> Self {
        match value {
            MetricArg::Mean => Metric::Mean,
            MetricArg::Median => Metric::Median,
            MetricArg::Variance => Metric::Variance,
            MetricArg::Max => Metric::Max,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum ArrivalsArg {
    Iterative,
    Batched,
}

impl From<ArrivalsArg> for ArrivalStrategy {
    fn from(value: ArrivalsArg) -> Self {
        match value {
            ArrivalsArg::Iterative => ArrivalStrategy::Iterative,
            ArrivalsArg::Batched => ArrivalStrategy::Batched,
        }
    }
}

pub fn parse_args() -> Result<Cli> {
    Cli::try_parse().or_else(|err| match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => err.exit(),
        _ => Err(Error::Cli(err.to_string())),
    })
}
