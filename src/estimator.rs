use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};
use crate::state::Replication;

/// Statistic reduced from the waiting times of one replication.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    #[default]
    Mean,
    Median,
    Variance,
    Max,
}

impl Metric {
    pub fn evaluate(self, values: &[f64]) -> Result<f64> {
        match self {
            Metric::Mean => mean(values),
            Metric::Median => median(values),
            Metric::Variance => variance(values),
            Metric::Max => max(values),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Metric::Mean => "mean",
            Metric::Median => "median",
            Metric::Variance => "variance",
            Metric::Max => "max",
        };
        f.write_str(label)
    }
}

pub fn mean(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(Error::InsufficientData);
    }
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn median(values: &[f64]) -> Result<f64> {
    if values.is_empty() {
        return Err(Error::InsufficientData);
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Ok((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Ok(sorted[mid])
    }
}

/// Population variance.
pub fn variance(values: &[f64]) -> Result<f64> {
    let center = mean(values)?;
    Ok(values
        .iter()
        .map(|value| (value - center).powi(2))
        .sum::<f64>()
        / values.len() as f64)
}

pub fn max(values: &[f64]) -> Result<f64> {
    values
        .iter()
        .copied()
        .reduce(f64::max)
        .ok_or(Error::InsufficientData)
}

fn covariance(xs: &[f64], ys: &[f64]) -> Result<f64> {
    let mean_x = mean(xs)?;
    let mean_y = mean(ys)?;
    Ok(xs
        .iter()
        .zip(ys)
        .map(|(x, y)| (x - mean_x) * (y - mean_y))
        .sum::<f64>()
        / xs.len() as f64)
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Estimate {
    /// Arithmetic mean of the per-replication metrics.
    pub uncorrected: f64,
    /// Control-variate estimate, when a covariate was supplied.
    pub corrected: Option<f64>,
    pub samples: usize,
}

impl Estimate {
    pub fn value(&self) -> f64 {
        self.corrected.unwrap_or(self.uncorrected)
    }
}

pub fn estimate(metrics: &[f64]) -> Result<Estimate> {
    Ok(Estimate {
        uncorrected: mean(metrics)?,
        corrected: None,
        samples: metrics.len(),
    })
}

/// Regresses `metrics` (X) on `covariates` (Y) and evaluates the fitted line
/// at the known covariate value `expected`: `b + a * expected` with
/// `a = Cov(X, Y) / Var(Y)` and `b = mean(X) - a * mean(Y)`.
pub fn control_variate(metrics: &[f64], covariates: &[f64], expected: f64) -> Result<Estimate> {
    let pairs = metrics.len().min(covariates.len());
    let (xs, ys) = (&metrics[..pairs], &covariates[..pairs]);

    let mean_x = mean(xs)?;
    let mean_y = mean(ys)?;
    let var_y = variance(ys)?;
    let slope = if var_y > 0.0 {
        covariance(xs, ys)? / var_y
    } else {
        0.0
    };
    let intercept = mean_x - slope * mean_y;

    Ok(Estimate {
        uncorrected: mean_x,
        corrected: Some(intercept + slope * expected),
        samples: pairs,
    })
}

/// Sigmoid satisfaction in [0, 1]; exactly 0.5 at the critical wait.
pub fn satisfaction(wait: f64, critical_wait: f64, decay_rate: f64) -> f64 {
    // exp(-k(w-c)) / (1 + exp(-k(w-c))) rewritten to stay finite for long waits
    1.0 / (1.0 + (decay_rate * (wait - critical_wait)).exp())
}

/// Mean squared deviation of `statistic` over `resamples` bootstrap draws
/// from its value on the original sample.
pub fn bootstrap_mse<R, F>(sample: &[f64], statistic: F, resamples: usize, rng: &mut R) -> Result<f64>
where
    R: Rng + ?Sized,
    F: Fn(&[f64]) -> Result<f64>,
{
    if sample.is_empty() || resamples == 0 {
        return Err(Error::InsufficientData);
    }
    let observed = statistic(sample)?;

    let mut resample = vec![0.0; sample.len()];
    let mut total = 0.0;
    for _ in 0..resamples {
        for slot in resample.iter_mut() {
            *slot = sample[rng.gen_range(0..sample.len())];
        }
        total += (statistic(&resample)? - observed).powi(2);
    }
    Ok(total / resamples as f64)
}

/// Simulations needed for a 95% confidence half-width below `tolerance`.
pub fn required_replications(mse: f64, tolerance: f64) -> usize {
    (mse * (1.96 / tolerance).powi(2)).ceil() as usize
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ThresholdCount {
    pub count: usize,
    pub percentage: f64,
}

/// Waiting times of the eligible requests of one replication.
#[derive(Clone, Debug)]
pub struct WaitingStats {
    waits: Vec<f64>,
}

impl WaitingStats {
    pub fn new(waits: Vec<f64>) -> Result<Self> {
        if waits.is_empty() {
            return Err(Error::InsufficientData);
        }
        Ok(Self { waits })
    }

    pub fn from_replication(replication: &Replication) -> Result<Self> {
        Self::new(replication.waiting_times())
    }

    pub fn waits(&self) -> &[f64] {
        &self.waits
    }

    pub fn metric(&self, metric: Metric) -> Result<f64> {
        metric.evaluate(&self.waits)
    }

    pub fn above_threshold(&self, threshold: f64) -> ThresholdCount {
        let count = self.waits.iter().filter(|wait| **wait > threshold).count();
        ThresholdCount {
            count,
            percentage: count as f64 / self.waits.len() as f64 * 100.0,
        }
    }

    pub fn satisfaction_scores(&self, critical_wait: f64, decay_rate: f64) -> Vec<f64> {
        self.waits
            .iter()
            .map(|wait| satisfaction(*wait, critical_wait, decay_rate))
            .collect()
    }

    pub fn mean_satisfaction(&self, critical_wait: f64, decay_rate: f64) -> f64 {
        let scores = self.satisfaction_scores(critical_wait, decay_rate);
        scores.iter().sum::<f64>() / scores.len() as f64
    }

    pub fn bootstrap_mse<R: Rng + ?Sized>(
        &self,
        metric: Metric,
        resamples: usize,
        rng: &mut R,
    ) -> Result<f64> {
        bootstrap_mse(&self.waits, |values| metric.evaluate(values), resamples, rng)
    }
}
