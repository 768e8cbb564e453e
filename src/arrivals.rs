use rand::distributions::WeightedIndex;
use rand::Rng;
use rand_distr::{Distribution, Exp, Poisson};
use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, Interval, MovieId};
use crate::error::{Error, Result};

/// How creation times are drawn inside each constant-rate interval.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArrivalStrategy {
    /// Exponential gaps with mean `1/rate` until the interval end is passed.
    #[default]
    Iterative,
    /// Poisson count with mean `rate * duration`, placed uniformly.
    Batched,
}

impl std::fmt::Display for ArrivalStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArrivalStrategy::Iterative => write!(f, "iterative"),
            ArrivalStrategy::Batched => write!(f, "batched"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Arrival {
    pub created_at: f64,
    pub movie: MovieId,
}

/// Piecewise-constant-rate Poisson source for one client group at a time.
pub struct ArrivalGenerator<'a> {
    catalog: &'a Catalog,
    strategy: ArrivalStrategy,
}

impl<'a> ArrivalGenerator<'a> {
    pub fn new(catalog: &'a Catalog, strategy: ArrivalStrategy) -> Self {
        Self { catalog, strategy }
    }

    /// Ordered creation times for `group` over the whole horizon.
    pub fn creation_times<R: Rng + ?Sized>(&self, group: usize, rng: &mut R) -> Vec<f64> {
        let rates = &self.catalog.group(group).rates;
        let mut times = Vec::new();
        for (interval, rate) in self.catalog.intervals().iter().zip(rates) {
            match self.strategy {
                ArrivalStrategy::Iterative => iterative_times(interval, *rate, rng, &mut times),
                ArrivalStrategy::Batched => batched_times(interval, *rate, rng, &mut times),
            }
        }
        times
    }

    /// Creation times paired with a movie drawn by popularity weight.
    pub fn generate<R: Rng + ?Sized>(&self, group: usize, rng: &mut R) -> Result<Vec<Arrival>> {
        let config = self.catalog.group(group);
        let movies = WeightedIndex::new(&config.popularity)
            .map_err(|_| Error::InvalidPopularity(config.name.clone()))?;

        let times = self.creation_times(group, rng);
        Ok(times
            .into_iter()
            .map(|created_at| Arrival {
                created_at,
                movie: movies.sample(rng),
            })
            .collect())
    }
}

fn iterative_times<R: Rng + ?Sized>(interval: &Interval, rate: f64, rng: &mut R, out: &mut Vec<f64>) {
    if !(rate > 0.0 && rate.is_finite()) {
        return;
    }
    let Ok(gaps) = Exp::new(rate) else {
        return;
    };

    let mut time = interval.start;
    loop {
        time += gaps.sample(rng);
        if time > interval.end {
            break;
        }
        out.push(time);
    }
}

fn batched_times<R: Rng + ?Sized>(interval: &Interval, rate: f64, rng: &mut R, out: &mut Vec<f64>) {
    let mean = rate * interval.duration();
    if !(mean > 0.0 && mean.is_finite()) {
        return;
    }
    let Ok(counts) = Poisson::new(mean) else {
        return;
    };

    let count: f64 = counts.sample(rng);
    let mut times: Vec<f64> = (0..count as usize)
        .map(|_| rng.gen_range(interval.start..interval.end))
        .collect();
    times.sort_by(|a, b| a.total_cmp(b));
    out.extend(times);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{IntervalConfig, SimConfig};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn single_group_catalog(rates: Vec<f64>, popularity: Vec<f64>) -> Catalog {
        let mut config = SimConfig::default();
        config.intervals = vec![
            IntervalConfig {
                start: 0.0,
                end: 1000.0,
            },
            IntervalConfig {
                start: 1000.0,
                end: 1500.0,
            },
        ];
        config.groups.truncate(1);
        config.groups[0].rates = rates;
        config.groups[0].popularity = popularity;
        Catalog::new(&config).expect("catalog should validate")
    }

    fn uniform_popularity() -> Vec<f64> {
        vec![1.0; 10]
    }

    #[test]
    fn iterative_counts_track_rate_times_duration() {
        let catalog = single_group_catalog(vec![2.0, 0.5], uniform_popularity());
        let generator = ArrivalGenerator::new(&catalog, ArrivalStrategy::Iterative);
        let mut rng = StdRng::seed_from_u64(7);
        let times = generator.creation_times(0, &mut rng);

        let first = times.iter().filter(|t| **t <= 1000.0).count() as f64;
        let second = times.iter().filter(|t| **t > 1000.0).count() as f64;
        assert!((first - 2000.0).abs() < 200.0, "first interval: {}", first);
        assert!((second - 250.0).abs() < 70.0, "second interval: {}", second);
    }

    #[test]
    fn batched_counts_track_rate_times_duration() {
        let catalog = single_group_catalog(vec![2.0, 0.5], uniform_popularity());
        let generator = ArrivalGenerator::new(&catalog, ArrivalStrategy::Batched);
        let mut rng = StdRng::seed_from_u64(7);
        let times = generator.creation_times(0, &mut rng);

        let first = times.iter().filter(|t| **t < 1000.0).count() as f64;
        let second = times.iter().filter(|t| **t >= 1000.0).count() as f64;
        assert!((first - 2000.0).abs() < 200.0, "first interval: {}", first);
        assert!((second - 250.0).abs() < 70.0, "second interval: {}", second);
    }

    #[test]
    fn strategies_agree_on_mean_gap() {
        let catalog = single_group_catalog(vec![1.0, 1.0], uniform_popularity());
        let mut rng = StdRng::seed_from_u64(11);
        let mut mean_count = |strategy| {
            let generator = ArrivalGenerator::new(&catalog, strategy);
            (0..20)
                .map(|_| generator.creation_times(0, &mut rng).len() as f64)
                .sum::<f64>()
                / 20.0
        };
        let iterative = mean_count(ArrivalStrategy::Iterative);
        let batched = mean_count(ArrivalStrategy::Batched);
        assert!((iterative - 1500.0).abs() < 40.0, "iterative: {}", iterative);
        assert!((batched - 1500.0).abs() < 40.0, "batched: {}", batched);
    }

    #[test]
    fn creation_times_are_ordered_and_inside_horizon() {
        for strategy in [ArrivalStrategy::Iterative, ArrivalStrategy::Batched] {
            let catalog = single_group_catalog(vec![0.3, 0.9], uniform_popularity());
            let generator = ArrivalGenerator::new(&catalog, strategy);
            let mut rng = StdRng::seed_from_u64(3);
            let times = generator.creation_times(0, &mut rng);
            assert!(!times.is_empty());
            assert!(times.windows(2).all(|pair| pair[0] <= pair[1]));
            assert!(times.iter().all(|t| *t >= 0.0 && *t <= 1500.0));
        }
    }

    #[test]
    fn non_positive_rate_yields_no_arrivals() {
        for strategy in [ArrivalStrategy::Iterative, ArrivalStrategy::Batched] {
            let catalog = single_group_catalog(vec![0.0, -1.0], uniform_popularity());
            let generator = ArrivalGenerator::new(&catalog, strategy);
            let mut rng = StdRng::seed_from_u64(1);
            assert!(generator.creation_times(0, &mut rng).is_empty());
        }
    }

    #[test]
    fn movies_follow_unnormalized_weights() {
        let mut popularity = vec![0.0; 10];
        popularity[2] = 3.0;
        popularity[7] = 1.0;
        let catalog = single_group_catalog(vec![4.0, 4.0], popularity);
        let generator = ArrivalGenerator::new(&catalog, ArrivalStrategy::Iterative);
        let mut rng = StdRng::seed_from_u64(5);
        let arrivals = generator.generate(0, &mut rng).expect("generation should succeed");

        assert!(arrivals.iter().all(|a| a.movie == 2 || a.movie == 7));
        let share = arrivals.iter().filter(|a| a.movie == 2).count() as f64 / arrivals.len() as f64;
        assert!((share - 0.75).abs() < 0.03, "share of movie 2: {}", share);
    }

    #[test]
    fn same_seed_reproduces_stream() {
        let catalog = single_group_catalog(vec![1.0, 2.0], uniform_popularity());
        let generator = ArrivalGenerator::new(&catalog, ArrivalStrategy::Batched);
        let a = generator
            .generate(0, &mut StdRng::seed_from_u64(9))
            .expect("generation should succeed");
        let b = generator
            .generate(0, &mut StdRng::seed_from_u64(9))
            .expect("generation should succeed");
        assert_eq!(a, b);
    }
}
