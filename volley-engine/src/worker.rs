use std::sync::Arc;
use std::time::Instant;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use volley_common::RunConfig;

use crate::metrics::CounterSet;
use crate::policy::{select_client, worker_binding, PolicyParams};
use crate::pool::{BlockingTransport, ClientPool, RequestPlan, Transport};

/// One claimed request: its sequence id and the client it was pinned to.
/// Created by [`begin_dispatch`], settled by [`finish_dispatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dispatch {
    pub seq: u64,
    pub client: usize,
}

/// Steps shared by both concurrency models, before the request goes out:
/// claim a sequence id against the budget, resolve a client via the active
/// policy, and raise that client's queue-depth entry.
///
/// Returns `None` when the budget is exhausted and the worker should drain.
pub fn begin_dispatch(
    counters: &CounterSet,
    config: &RunConfig,
    bound: usize,
    params: &PolicyParams,
    rng: &mut impl Rng,
) -> Option<Dispatch> {
    let seq = counters.try_claim(config.requests)?;
    let client = select_client(config.policy, bound, counters, params, rng);
    counters.enter_queue(client);
    Some(Dispatch { seq, client })
}

/// Steps shared by both models after the request returns: lower the
/// queue-depth entry and record latency and totals. Failures settle the same
/// way as successes.
pub fn finish_dispatch(
    counters: &CounterSet,
    dispatch: &Dispatch,
    elapsed: std::time::Duration,
    failed: bool,
) {
    counters.leave_queue(dispatch.client);
    counters.record_completion(dispatch.client, elapsed, failed);
}

/// Cooperative-model worker: a task whose only suspension point is the
/// request itself.
pub async fn run_task_worker<T: Transport>(
    index: usize,
    seed: u64,
    config: Arc<RunConfig>,
    params: PolicyParams,
    counters: Arc<CounterSet>,
    pool: Arc<ClientPool<T>>,
    plan: Arc<RequestPlan>,
) {
    let mut rng = SmallRng::seed_from_u64(seed);
    let bound = worker_binding(config.policy, index, config.clients, &mut rng);
    while let Some(dispatch) = begin_dispatch(&counters, &config, bound, &params, &mut rng) {
        let started = Instant::now();
        let before = std::thread::current().id();
        let result = pool.client(dispatch.client).send(&plan).await;
        let after = std::thread::current().id();
        finish_dispatch(&counters, &dispatch, started.elapsed(), result.is_err());
        tracing::debug!(
            seq = dispatch.seq,
            client = dispatch.client,
            worker = index,
            before = ?before,
            after = ?after,
            ok = result.is_ok(),
            "request completed"
        );
    }
}

/// Thread-model worker: identical bookkeeping, but the send blocks the
/// worker's own OS thread.
pub fn run_thread_worker<T: BlockingTransport>(
    index: usize,
    seed: u64,
    config: Arc<RunConfig>,
    params: PolicyParams,
    counters: Arc<CounterSet>,
    pool: Arc<ClientPool<T>>,
    plan: Arc<RequestPlan>,
) {
    let mut rng = SmallRng::seed_from_u64(seed);
    let bound = worker_binding(config.policy, index, config.clients, &mut rng);
    while let Some(dispatch) = begin_dispatch(&counters, &config, bound, &params, &mut rng) {
        let started = Instant::now();
        let thread = std::thread::current().id();
        let result = pool.client(dispatch.client).send(&plan);
        finish_dispatch(&counters, &dispatch, started.elapsed(), result.is_err());
        tracing::debug!(
            seq = dispatch.seq,
            client = dispatch.client,
            worker = index,
            thread = ?thread,
            ok = result.is_ok(),
            "request completed"
        );
    }
}
