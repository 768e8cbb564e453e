use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write;

use crate::catalog::{NodeId, SizeClass};
use crate::engine::{RunSummary, SimulationReport};
use crate::models::FileConfig;
use crate::optimizer::{OperatorStats, OptimizationResult, Outcome};
use crate::placement::Placement;

pub trait Formatter {
    fn simulation(&self, report: &SimulationReport) -> String;
    fn optimization(&self, result: &OptimizationResult) -> String;
    fn scenario(&self, config: &FileConfig) -> String;
}

pub struct HumanFormatter;
pub struct SummaryFormatter;
pub struct JsonFormatter;

impl Formatter for HumanFormatter {
    fn simulation(&self, report: &SimulationReport) -> String {
        let mut output = String::new();
        writeln!(output, "Seed: {}", report.seed).ok();
        writeln!(output, "Arrivals: {}", report.arrivals).ok();
        write_placement(&mut output, &report.placement);
        for run in &report.runs {
            write_run(&mut output, run, report.threshold);
        }
        output.push_str(&SummaryFormatter.simulation(report));
        output
    }

    fn optimization(&self, result: &OptimizationResult) -> String {
        let mut output = String::new();
        writeln!(output, "Metric: {}", result.metric).ok();
        writeln!(output, "Iterations:").ok();
        for record in &result.history {
            match record.estimate {
                Some(estimate) => writeln!(
                    output,
                    "{} {} -> {} ({:.4})",
                    record.iteration,
                    record.operator,
                    outcome_label(record.outcome),
                    estimate
                ),
                None => writeln!(
                    output,
                    "{} {} -> {}",
                    record.iteration,
                    record.operator,
                    outcome_label(record.outcome)
                ),
            }
            .ok();
        }
        output.push_str(&SummaryFormatter.optimization(result));
        output
    }

    fn scenario(&self, config: &FileConfig) -> String {
        let scenario = &config.scenario;
        let mut output = String::new();

        let horizon = scenario.intervals.last().map(|interval| interval.end);
        match (scenario.intervals.first(), horizon) {
            (Some(first), Some(end)) => writeln!(
                output,
                "Horizon: {}-{}s ({} intervals)",
                first.start,
                end,
                scenario.intervals.len()
            ),
            _ => writeln!(output, "Horizon: none"),
        }
        .ok();
        writeln!(output, "Handling mean: {}s", scenario.handling_mean).ok();
        writeln!(
            output,
            "Jitter: {}-{}s",
            scenario.jitter.min, scenario.jitter.max
        )
        .ok();

        writeln!(output, "Movies:").ok();
        for (movie, size) in scenario.movie_sizes.iter().enumerate() {
            let class = SizeClass::from_size(*size)
                .map(|class| class.to_string())
                .unwrap_or_else(|| "invalid".to_string());
            writeln!(output, "- {}: {} ({})", movie, size, class).ok();
        }

        writeln!(output, "Capacities:").ok();
        for (node, capacity) in &scenario.capacities {
            writeln!(output, "- {}: {}", node, capacity).ok();
        }

        writeln!(output, "Groups:").ok();
        for group in &scenario.groups {
            let links: Vec<String> = group
                .links
                .iter()
                .map(|(node, link)| format!("{} {}s", node, link.latency))
                .collect();
            writeln!(
                output,
                "- {} (rates: {}; links: {})",
                group.name,
                join(&group.rates),
                links.join(", ")
            )
            .ok();
        }

        match &config.placement {
            Some(placement) => write_placement(&mut output, placement),
            None => {
                writeln!(output, "Placement: baseline").ok();
            }
        }
        output
    }
}

impl Formatter for SummaryFormatter {
    fn simulation(&self, report: &SimulationReport) -> String {
        let mut output = String::new();
        writeln!(output, "Summary:").ok();
        writeln!(output, "runs: {}", report.runs.len()).ok();
        match report.average(|waiting| waiting.mean) {
            Some(mean) => writeln!(output, "mean wait: {:.4}s", mean),
            None => writeln!(output, "mean wait: n/a"),
        }
        .ok();
        if let Some(max) = report.average(|waiting| waiting.max) {
            writeln!(output, "max wait: {:.4}s", max).ok();
        }
        if let Some(share) = report.average(|waiting| waiting.above_threshold.percentage) {
            writeln!(output, "above {}s: {:.2}%", report.threshold, share).ok();
        }
        if let Some(score) = report.average(|waiting| waiting.mean_satisfaction) {
            writeln!(output, "satisfaction: {:.4}", score).ok();
        }
        writeln!(output, "request rate: {:.4}/s", report.request_rate).ok();
        writeln!(output, "Node totals:").ok();
        for (node, count) in &report.node_totals {
            writeln!(output, "{}: {} requests", node, count).ok();
        }
        output
    }

    fn optimization(&self, result: &OptimizationResult) -> String {
        let mut output = String::new();
        writeln!(output, "Operators:").ok();
        for (name, stats) in result.operator_stats() {
            writeln!(output, "{}: {}/{} accepted", name, stats.accepted, stats.tried).ok();
        }
        match &result.best {
            Some(best) => {
                writeln!(output, "Best {}: {:.4}", result.metric, result.best_metric).ok();
                write_placement(&mut output, best);
            }
            None => {
                writeln!(output, "Best placement: none").ok();
            }
        }
        output
    }

    fn scenario(&self, config: &FileConfig) -> String {
        HumanFormatter.scenario(config)
    }
}

#[derive(Serialize)]
struct OptimizationJson<'a> {
    #[serde(flatten)]
    result: &'a OptimizationResult,
    operator_stats: BTreeMap<String, OperatorStats>,
}

impl Formatter for JsonFormatter {
    fn simulation(&self, report: &SimulationReport) -> String {
        to_json(report)
    }

    fn optimization(&self, result: &OptimizationResult) -> String {
        to_json(&OptimizationJson {
            result,
            operator_stats: result.operator_stats(),
        })
    }

    fn scenario(&self, config: &FileConfig) -> String {
        to_json(config)
    }
}

fn to_json<T: Serialize>(value: &T) -> String {
    match serde_json::to_string_pretty(value) {
        Ok(json) => format!("{}\n", json),
        Err(err) => format!("{{\"error\":\"{}\"}}\n", err),
    }
}

fn write_run(output: &mut String, run: &RunSummary, threshold: f64) {
    let hits = run
        .edge_hit_ratio
        .map(|ratio| format!("{:.1}%", ratio * 100.0))
        .unwrap_or_else(|| "n/a".to_string());
    writeln!(
        output,
        "Run {}: {} requests, {} eligible, edge hits {}",
        run.run, run.requests, run.eligible, hits
    )
    .ok();

    let Some(waiting) = &run.waiting else {
        writeln!(output, "  no eligible requests").ok();
        return;
    };
    writeln!(
        output,
        "  wait mean {:.4}s, median {:.4}s, variance {:.4}, max {:.4}s",
        waiting.mean, waiting.median, waiting.variance, waiting.max
    )
    .ok();
    writeln!(
        output,
        "  above {}s: {} ({:.2}%)",
        threshold, waiting.above_threshold.count, waiting.above_threshold.percentage
    )
    .ok();
    writeln!(
        output,
        "  processing mean {:.4}s, total mean {:.4}s",
        waiting.mean_processing, waiting.mean_total
    )
    .ok();
    writeln!(
        output,
        "  satisfaction {:.4}, bootstrap mse {:.6} ({} runs needed)",
        waiting.mean_satisfaction, waiting.bootstrap_mse, waiting.required_replications
    )
    .ok();
}

fn write_placement(output: &mut String, placement: &Placement) {
    writeln!(output, "Placement:").ok();
    for node in NodeId::EDGES {
        let movies: Vec<String> = placement
            .movies(node)
            .iter()
            .map(|movie| movie.to_string())
            .collect();
        writeln!(output, "- {}: [{}]", node, movies.join(", ")).ok();
    }
}

fn outcome_label(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Accepted => "accepted",
        Outcome::Rejected => "rejected",
        Outcome::Unstable => "unstable",
        Outcome::Unevaluated => "unevaluated",
    }
}

fn join(values: &[f64]) -> String {
    values
        .iter()
        .map(|value| value.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
