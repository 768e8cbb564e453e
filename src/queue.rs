use rand::Rng;
use rand_distr::{Distribution, Exp, Uniform};

use crate::catalog::Catalog;
use crate::error::{Error, Result};
use crate::state::Request;

/// Single-server FCFS replay for the requests routed to one node.
///
/// Each request goes through a handling phase drawn from `H` and a service
/// phase made of its deterministic service time plus a jitter drawn from `J`.
/// The node may start handling the next request as soon as the current one
/// enters service.
#[derive(Clone, Debug)]
pub struct QueueSimulator<H, J> {
    handling: H,
    jitter: J,
}

pub type StochasticQueue = QueueSimulator<Exp<f64>, Uniform<f64>>;

impl StochasticQueue {
    /// Exponential handling with mean beta, uniform jitter over the catalog bounds.
    pub fn from_catalog(catalog: &Catalog) -> Result<Self> {
        let handling = Exp::new(catalog.handling_rate())
            .map_err(|_| Error::InvalidHandlingMean(catalog.handling_mean()))?;
        let (min, max) = catalog.jitter();
        Ok(Self::new(handling, Uniform::new_inclusive(min, max)))
    }
}

impl<H, J> QueueSimulator<H, J>
where
    H: Distribution<f64>,
    J: Distribution<f64>,
{
    pub fn new(handling: H, jitter: J) -> Self {
        Self { handling, jitter }
    }

    /// Sorts `requests` by arrival (stable) and fills in handling and service
    /// times of the eligible ones.
    pub fn process<R: Rng + ?Sized>(&self, requests: &mut [Request], rng: &mut R) {
        requests.sort_by(|a, b| a.arrived_at.total_cmp(&b.arrived_at));

        let mut free_at: Option<f64> = None;
        for request in requests.iter_mut().filter(|request| request.eligible) {
            let handled_at = match free_at {
                Some(cursor) => cursor.max(request.arrived_at),
                None => request.arrived_at,
            };
            let handling_delay = self.handling.sample(rng);
            let jitter = self.jitter.sample(rng);
            let service_start = handled_at + handling_delay;

            request.handled_at = Some(handled_at);
            request.served_at = Some(service_start + request.service_time + jitter);
            free_at = Some(service_start);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::NodeId;
    use crate::models::SimConfig;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct Fixed(f64);

    impl Distribution<f64> for Fixed {
        fn sample<R: Rng + ?Sized>(&self, _rng: &mut R) -> f64 {
            self.0
        }
    }

    fn request(id: usize, arrived_at: f64, service_time: f64) -> Request {
        Request {
            id,
            group: 0,
            movie: 0,
            node: NodeId::Msn,
            created_at: arrived_at,
            latency: 0.0,
            arrived_at,
            service_time,
            handled_at: None,
            served_at: None,
            eligible: true,
        }
    }

    #[test]
    fn cursor_advances_to_service_start() {
        let queue = QueueSimulator::new(Fixed(2.0), Fixed(0.0));
        let mut requests = vec![request(1, 0.0, 1.0), request(2, 1.0, 1.0)];
        queue.process(&mut requests, &mut StdRng::seed_from_u64(0));

        assert_eq!(requests[0].handled_at, Some(0.0));
        assert_eq!(requests[1].handled_at, Some(2.0));
        assert_eq!(requests[0].served_at, Some(3.0));
        assert_eq!(requests[1].served_at, Some(5.0));
        assert_eq!(requests[1].waiting_time(), Some(1.0));
    }

    #[test]
    fn idle_node_handles_late_arrival_immediately() {
        let queue = QueueSimulator::new(Fixed(0.5), Fixed(0.25));
        let mut requests = vec![request(1, 0.0, 4.0), request(2, 10.0, 4.0)];
        queue.process(&mut requests, &mut StdRng::seed_from_u64(0));

        assert_eq!(requests[1].handled_at, Some(10.0));
        assert_eq!(requests[1].served_at, Some(14.75));
    }

    #[test]
    fn requests_are_served_in_arrival_order_with_stable_ties() {
        let queue = QueueSimulator::new(Fixed(1.0), Fixed(0.0));
        let mut requests = vec![
            request(1, 5.0, 1.0),
            request(2, 0.0, 1.0),
            request(3, 0.0, 1.0),
        ];
        queue.process(&mut requests, &mut StdRng::seed_from_u64(0));

        let order: Vec<usize> = requests.iter().map(|r| r.id).collect();
        assert_eq!(order, vec![2, 3, 1]);
        let handled: Vec<Option<f64>> = requests.iter().map(|r| r.handled_at).collect();
        assert_eq!(handled, vec![Some(0.0), Some(1.0), Some(5.0)]);
    }

    #[test]
    fn ineligible_requests_are_skipped() {
        let queue = QueueSimulator::new(Fixed(3.0), Fixed(0.0));
        let mut late = request(2, 1.0, 1.0);
        late.eligible = false;
        let mut requests = vec![request(1, 0.0, 1.0), late, request(3, 2.0, 1.0)];
        queue.process(&mut requests, &mut StdRng::seed_from_u64(0));

        assert_eq!(requests[1].handled_at, None);
        assert_eq!(requests[1].served_at, None);
        assert_eq!(requests[2].handled_at, Some(3.0));
    }

    #[test]
    fn empty_batch_is_a_no_op() {
        let catalog = Catalog::new(&SimConfig::default()).expect("catalog should validate");
        let queue = StochasticQueue::from_catalog(&catalog).expect("queue should build");
        let mut requests: Vec<Request> = Vec::new();
        queue.process(&mut requests, &mut StdRng::seed_from_u64(0));
        assert!(requests.is_empty());
    }

    #[test]
    fn stochastic_timings_are_ordered() {
        let catalog = Catalog::new(&SimConfig::default()).expect("catalog should validate");
        let queue = StochasticQueue::from_catalog(&catalog).expect("queue should build");
        let mut rng = StdRng::seed_from_u64(17);
        let mut requests: Vec<Request> = (0..500)
            .map(|idx| request(idx, rng.gen_range(0.0..200.0), 3.0))
            .collect();
        queue.process(&mut requests, &mut rng);

        for request in &requests {
            let handled = request.handled_at.expect("eligible request is handled");
            let served = request.served_at.expect("eligible request is served");
            assert!(request.arrived_at >= request.created_at);
            assert!(handled >= request.arrived_at);
            assert!(served >= handled);
            assert!(request.waiting_time().unwrap_or(-1.0) >= 0.0);
        }
    }
}
