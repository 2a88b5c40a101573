use rand::Rng;
use volley_common::{RunConfig, SelectionPolicy};

use crate::metrics::CounterSet;

/// Pre-computed inputs the queue-aware policies need on every dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyParams {
    pub client_count: usize,
    /// Fairness floor for `RequestRandomTolerance`: `workers/clients - tolerance`.
    pub tolerance_min: u64,
    /// Rejection ceiling for `RequestRandomTolerance`: `workers/clients + tolerance`.
    pub tolerance_max: u64,
}

impl PolicyParams {
    pub fn from_config(config: &RunConfig) -> Self {
        let per_client = (config.workers / config.clients) as u64;
        Self {
            client_count: config.clients,
            tolerance_min: per_client.saturating_sub(config.tolerance),
            tolerance_max: per_client + config.tolerance,
        }
    }
}

/// Client a worker is permanently bound to. Only the `Task*` policies ever
/// read the binding, but it is cheap enough to compute for every worker.
pub fn worker_binding(
    policy: SelectionPolicy,
    worker_index: usize,
    client_count: usize,
    rng: &mut impl Rng,
) -> usize {
    match policy {
        SelectionPolicy::TaskRandom => rng.gen_range(0..client_count),
        _ => worker_index % client_count,
    }
}

/// Resolve one dispatch to a client index in `[0, client_count)`.
///
/// Pure decision rule over shared read state: the queue-depth table is read
/// but never written here, and the only shared mutation is the round-robin
/// cursor bump.
pub fn select_client(
    policy: SelectionPolicy,
    bound: usize,
    counters: &CounterSet,
    params: &PolicyParams,
    rng: &mut impl Rng,
) -> usize {
    let clients = params.client_count;
    match policy {
        SelectionPolicy::TaskRoundRobin | SelectionPolicy::TaskRandom => bound,
        SelectionPolicy::RequestRoundRobin => (counters.next_cursor() % clients as u64) as usize,
        SelectionPolicy::RequestRandom => rng.gen_range(0..clients),
        SelectionPolicy::RequestShortestQueue => shortest_queue(counters, clients),
        SelectionPolicy::RequestRandomNotLongestQueue => {
            // A single-client pool has nothing to exclude; validation rejects
            // that combination, this guard keeps the loop finite regardless.
            if clients == 1 {
                return 0;
            }
            let longest = longest_queue(counters, clients);
            loop {
                let candidate = rng.gen_range(0..clients);
                if candidate != longest {
                    return candidate;
                }
            }
        }
        SelectionPolicy::RequestRandomTolerance => {
            let shortest = shortest_queue(counters, clients);
            if counters.queue_depth(shortest) < params.tolerance_min {
                return shortest;
            }
            // With tolerance >= 1 (enforced by validation) and at most one
            // in-flight request per worker, some client always sits below the
            // ceiling, so the draw terminates in O(clients) expected tries.
            loop {
                let candidate = rng.gen_range(0..clients);
                if counters.queue_depth(candidate) < params.tolerance_max {
                    return candidate;
                }
            }
        }
    }
}

/// Index of the minimum queue depth; ties resolve to the lowest index.
pub fn shortest_queue(counters: &CounterSet, client_count: usize) -> usize {
    let mut best = 0;
    let mut best_depth = counters.queue_depth(0);
    for candidate in 1..client_count {
        let depth = counters.queue_depth(candidate);
        if depth < best_depth {
            best = candidate;
            best_depth = depth;
        }
    }
    best
}

/// Index of the maximum queue depth; ties resolve to the lowest index.
pub fn longest_queue(counters: &CounterSet, client_count: usize) -> usize {
    let mut best = 0;
    let mut best_depth = counters.queue_depth(0);
    for candidate in 1..client_count {
        let depth = counters.queue_depth(candidate);
        if depth > best_depth {
            best = candidate;
            best_depth = depth;
        }
    }
    best
}
